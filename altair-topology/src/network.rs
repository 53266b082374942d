//! Network topology: one VPC, one gateway, one route table, one subnet per
//! availability zone

use std::collections::BTreeMap;

use altair_core::cidr::Ipv4Cidr;
use altair_core::config::TopologyConfig;
use altair_core::manifest::Manifest;
use altair_core::resource::{Resource, Value};

use crate::TopologyError;
use crate::names;

/// Prefix length of the per-zone subnets
const SUBNET_PREFIX: u8 = 24;

pub fn declare(manifest: &mut Manifest, config: &TopologyConfig) -> Result<(), TopologyError> {
    let base: Ipv4Cidr = config.vpc_cidr.parse()?;

    manifest.add(
        Resource::new("vpc", names::VPC)
            .with_attribute("name", Value::string(format!("vpc-{}", config.suffix)))
            .with_attribute("cidr_block", Value::string(config.vpc_cidr.clone())),
    )?;

    manifest.add(
        Resource::new("internet_gateway", names::GATEWAY)
            .with_attribute("name", Value::string(format!("gateway-{}", config.suffix)))
            .with_attribute("vpc_id", Value::reference(names::VPC, "id")),
    )?;

    let mut default_route = BTreeMap::new();
    default_route.insert("cidr_block".to_string(), Value::string("0.0.0.0/0"));
    default_route.insert(
        "gateway_id".to_string(),
        Value::reference(names::GATEWAY, "id"),
    );
    manifest.add(
        Resource::new("route_table", names::ROUTES)
            .with_attribute("name", Value::string(format!("routes-{}", config.suffix)))
            .with_attribute("vpc_id", Value::reference(names::VPC, "id"))
            .with_attribute("routes", Value::List(vec![Value::Map(default_route)])),
    )?;

    for (index, zone) in config.availability_zones.iter().enumerate() {
        // Slice 0 of the VPC block stays unused; zone i takes slice i+1
        let block = base.subnet(index as u32 + 1, SUBNET_PREFIX)?;

        manifest.add(
            Resource::new("subnet", names::subnet(index))
                .with_attribute(
                    "name",
                    Value::string(format!("subnet-{}-{}", config.suffix, zone)),
                )
                .with_attribute("availability_zone", Value::string(zone))
                .with_attribute("cidr_block", Value::string(block.to_string()))
                .with_attribute("vpc_id", Value::reference(names::VPC, "id"))
                .with_attribute("map_public_ip_on_launch", Value::Bool(true)),
        )?;

        manifest.add(
            Resource::new("route_table_association", names::subnet_association(index))
                .with_attribute(
                    "name",
                    Value::string(format!("route-table-assoc-{}", zone)),
                )
                .with_attribute("subnet_id", Value::reference(names::subnet(index), "id"))
                .with_attribute("route_table_id", Value::reference(names::ROUTES, "id")),
        )?;
    }

    Ok(())
}
