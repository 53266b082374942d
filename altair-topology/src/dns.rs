//! DNS: one alias for the load balancer, one address record per node
//!
//! Records are declared against a pre-existing hosted zone resolved in phase
//! one; there is no zone-creation path. Overwrite is allowed so reruns are
//! idempotent, which also means concurrent writers to the same names race.

use altair_core::config::{ResolvedLookups, TopologyConfig};
use altair_core::manifest::Manifest;
use altair_core::resource::{Resource, Value};

use crate::TopologyError;
use crate::names;

const RECORD_TTL_SECS: i64 = 300;

/// Record name of the cluster endpoint alias, relative to the zone
const CLUSTER_ALIAS: &str = "k8s";

pub fn declare(
    manifest: &mut Manifest,
    config: &TopologyConfig,
    lookups: &ResolvedLookups,
) -> Result<(), TopologyError> {
    manifest.add(
        Resource::new("dns_record", names::NLB_RECORD)
            .with_attribute("name", Value::string(CLUSTER_ALIAS))
            .with_attribute("type", Value::string("CNAME"))
            .with_attribute("zone_id", Value::string(&lookups.hosted_zone_id))
            .with_attribute(
                "records",
                Value::List(vec![Value::reference(names::NLB, "dns_name")]),
            )
            .with_attribute("ttl", Value::Int(RECORD_TTL_SECS))
            .with_attribute("allow_overwrite", Value::Bool(true)),
    )?;

    for index in 0..config.availability_zones.len() {
        manifest.add(
            Resource::new("dns_record", names::node_record(index))
                .with_attribute("name", Value::string(config.instance_name(index)))
                .with_attribute("type", Value::string("A"))
                .with_attribute("zone_id", Value::string(&lookups.hosted_zone_id))
                .with_attribute(
                    "records",
                    Value::List(vec![Value::reference(
                        names::instance(index),
                        "public_ip",
                    )]),
                )
                .with_attribute("ttl", Value::Int(RECORD_TTL_SECS))
                .with_attribute("allow_overwrite", Value::Bool(true)),
        )?;
    }

    Ok(())
}
