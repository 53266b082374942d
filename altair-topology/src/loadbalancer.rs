//! Load balancing: one network load balancer, one health-checked target
//! group and listener per service port, every node attached to every group

use std::collections::BTreeMap;

use altair_core::config::TopologyConfig;
use altair_core::manifest::Manifest;
use altair_core::resource::{Resource, Value};

use crate::TopologyError;
use crate::names;

/// Forwarded service ports: cluster API, HTTP, HTTPS
pub const LISTENER_PORTS: [i64; 3] = [16443, 80, 443];

const HEALTH_CHECK_INTERVAL_SECS: i64 = 30;
const HEALTH_CHECK_TIMEOUT_SECS: i64 = 5;

pub fn declare(manifest: &mut Manifest, config: &TopologyConfig) -> Result<(), TopologyError> {
    let subnet_ids: Vec<Value> = (0..config.availability_zones.len())
        .map(|index| Value::reference(names::subnet(index), "id"))
        .collect();

    manifest.add(
        Resource::new("load_balancer", names::NLB)
            .with_attribute("name", Value::string(format!("NLB-{}", config.suffix)))
            .with_attribute("load_balancer_type", Value::string("network"))
            .with_attribute("internal", Value::Bool(false))
            .with_attribute("ip_address_type", Value::string("ipv4"))
            .with_attribute("enable_cross_zone_load_balancing", Value::Bool(true))
            .with_attribute("enable_deletion_protection", Value::Bool(false))
            .with_attribute("subnets", Value::List(subnet_ids)),
    )?;

    for port in LISTENER_PORTS {
        let mut health_check = BTreeMap::new();
        health_check.insert("enabled".to_string(), Value::Bool(true));
        health_check.insert(
            "interval".to_string(),
            Value::Int(HEALTH_CHECK_INTERVAL_SECS),
        );
        health_check.insert("timeout".to_string(), Value::Int(HEALTH_CHECK_TIMEOUT_SECS));
        health_check.insert("port".to_string(), Value::Int(port));
        health_check.insert("protocol".to_string(), Value::string("TCP"));

        manifest.add(
            Resource::new("target_group", names::target_group(port))
                .with_attribute("name", Value::string(format!("targetGroup-{}", port)))
                .with_attribute("port", Value::Int(port))
                .with_attribute("protocol", Value::string("TCP"))
                .with_attribute("target_type", Value::string("instance"))
                .with_attribute("vpc_id", Value::reference(names::VPC, "id"))
                .with_attribute("health_check", Value::Map(health_check)),
        )?;

        // Any node serves any port; all nodes join every group
        for index in 0..config.availability_zones.len() {
            manifest.add(
                Resource::new("target_group_attachment", names::attachment(port, index))
                    .with_attribute("name", Value::string(format!("target-{}-{}", port, index)))
                    .with_attribute(
                        "target_group_arn",
                        Value::reference(names::target_group(port), "arn"),
                    )
                    .with_attribute("target_id", Value::reference(names::instance(index), "id"))
                    .with_attribute("port", Value::Int(port)),
            )?;
        }

        let mut forward = BTreeMap::new();
        forward.insert("type".to_string(), Value::string("forward"));
        forward.insert(
            "target_group_arn".to_string(),
            Value::reference(names::target_group(port), "arn"),
        );

        manifest.add(
            Resource::new("listener", names::listener(port))
                .with_attribute("name", Value::string(format!("listener-{}", port)))
                .with_attribute("load_balancer_arn", Value::reference(names::NLB, "arn"))
                .with_attribute("port", Value::Int(port))
                .with_attribute("protocol", Value::string("TCP"))
                .with_attribute("default_actions", Value::List(vec![Value::Map(forward)])),
        )?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use altair_core::config::ResolvedLookups;

    fn declared(config: &TopologyConfig) -> Manifest {
        let mut manifest = Manifest::new();
        crate::network::declare(&mut manifest, config).unwrap();
        crate::access::declare(&mut manifest).unwrap();
        crate::identity::declare(&mut manifest).unwrap();
        crate::compute::declare(&mut manifest, config, &ResolvedLookups::placeholder()).unwrap();
        declare(&mut manifest, config).unwrap();
        manifest
    }

    #[test]
    fn balancer_spans_every_subnet() {
        let config = TopologyConfig::default();
        let manifest = declared(&config);
        let nlb = manifest.get(names::NLB).unwrap();

        assert_eq!(
            nlb.attribute("load_balancer_type"),
            Some(&Value::string("network"))
        );
        assert_eq!(nlb.attribute("internal"), Some(&Value::Bool(false)));
        assert_eq!(
            nlb.attribute("enable_cross_zone_load_balancing"),
            Some(&Value::Bool(true))
        );
        let Some(Value::List(subnets)) = nlb.attribute("subnets") else {
            panic!("subnets missing");
        };
        assert_eq!(subnets.len(), config.availability_zones.len());
    }

    #[test]
    fn every_port_gets_group_listener_and_full_attachment() {
        let config = TopologyConfig::default();
        let manifest = declared(&config);
        let nodes = config.availability_zones.len();

        let summary = manifest.summary();
        assert_eq!(summary.counts["target_group"], LISTENER_PORTS.len());
        assert_eq!(summary.counts["listener"], LISTENER_PORTS.len());
        assert_eq!(
            summary.counts["target_group_attachment"],
            LISTENER_PORTS.len() * nodes
        );

        for port in LISTENER_PORTS {
            let group = manifest.get(&names::target_group(port)).unwrap();
            assert_eq!(group.attribute("port"), Some(&Value::Int(port)));

            // Each node attached exactly once to this port's group
            let attached: Vec<_> = (0..nodes)
                .map(|i| manifest.get(&names::attachment(port, i)).unwrap())
                .collect();
            for (i, attachment) in attached.iter().enumerate() {
                assert_eq!(
                    attachment.attribute("target_group_arn"),
                    Some(&Value::reference(names::target_group(port), "arn"))
                );
                assert_eq!(
                    attachment.attribute("target_id"),
                    Some(&Value::reference(names::instance(i), "id"))
                );
            }

            let listener = manifest.get(&names::listener(port)).unwrap();
            let Some(Value::List(actions)) = listener.attribute("default_actions") else {
                panic!("default actions missing");
            };
            assert_eq!(actions.len(), 1);
            let Value::Map(action) = &actions[0] else {
                panic!("action is not a map");
            };
            assert_eq!(action["type"], Value::string("forward"));
            assert_eq!(
                action["target_group_arn"],
                Value::reference(names::target_group(port), "arn")
            );
        }
    }

    #[test]
    fn health_checks_probe_the_traffic_port() {
        let manifest = declared(&TopologyConfig::default());
        for port in LISTENER_PORTS {
            let group = manifest.get(&names::target_group(port)).unwrap();
            let Some(Value::Map(check)) = group.attribute("health_check") else {
                panic!("health check missing");
            };
            assert_eq!(check["enabled"], Value::Bool(true));
            assert_eq!(check["interval"], Value::Int(30));
            assert_eq!(check["timeout"], Value::Int(5));
            assert_eq!(check["port"], Value::Int(port));
            assert_eq!(check["protocol"], Value::string("TCP"));
        }
    }
}
