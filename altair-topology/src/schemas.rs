//! Schemas for the declared resource types

use altair_core::schema::{AttributeSchema, AttributeType, ResourceSchema, types};

/// Load balancer / listener protocols (uppercase, unlike traffic-rule
/// protocols)
fn lb_protocol() -> AttributeType {
    AttributeType::Enum(vec![
        "TCP".to_string(),
        "UDP".to_string(),
        "TCP_UDP".to_string(),
        "TLS".to_string(),
    ])
}

fn record_type() -> AttributeType {
    AttributeType::Enum(vec![
        "A".to_string(),
        "AAAA".to_string(),
        "CNAME".to_string(),
        "TXT".to_string(),
    ])
}

fn vpc_schema() -> ResourceSchema {
    ResourceSchema::new("vpc")
        .with_description("An isolated IPv4 address space")
        .attribute(AttributeSchema::new("name", AttributeType::String).required())
        .attribute(
            AttributeSchema::new("cidr_block", types::cidr())
                .required()
                .with_description("The VPC's IPv4 block; subnets slice it"),
        )
}

fn subnet_schema() -> ResourceSchema {
    ResourceSchema::new("subnet")
        .with_description("A per-zone slice of the VPC block")
        .attribute(AttributeSchema::new("name", AttributeType::String).required())
        .attribute(AttributeSchema::new("availability_zone", AttributeType::String).required())
        .attribute(AttributeSchema::new("cidr_block", types::cidr()).required())
        .attribute(AttributeSchema::new("vpc_id", AttributeType::String).required())
        .attribute(AttributeSchema::new(
            "map_public_ip_on_launch",
            AttributeType::Bool,
        ))
}

fn internet_gateway_schema() -> ResourceSchema {
    ResourceSchema::new("internet_gateway")
        .attribute(AttributeSchema::new("name", AttributeType::String).required())
        .attribute(AttributeSchema::new("vpc_id", AttributeType::String).required())
}

fn route_table_association_schema() -> ResourceSchema {
    ResourceSchema::new("route_table_association")
        .attribute(AttributeSchema::new("subnet_id", AttributeType::String).required())
        .attribute(AttributeSchema::new("route_table_id", AttributeType::String).required())
}

fn security_group_schema() -> ResourceSchema {
    ResourceSchema::new("security_group")
        .with_description("A stateful traffic filter attached to instances")
        .attribute(AttributeSchema::new("name", AttributeType::String).required())
        .attribute(AttributeSchema::new("vpc_id", AttributeType::String).required())
}

fn security_group_rule_schema() -> ResourceSchema {
    ResourceSchema::new("security_group_rule")
        .attribute(AttributeSchema::new(
            "type",
            AttributeType::Enum(vec!["ingress".to_string(), "egress".to_string()]),
        ))
        .attribute(AttributeSchema::new("security_group_id", AttributeType::String).required())
        .attribute(AttributeSchema::new("protocol", types::protocol()).required())
        .attribute(AttributeSchema::new("from_port", types::port_number()))
        .attribute(AttributeSchema::new("to_port", types::port_number()))
}

fn s3_bucket_schema() -> ResourceSchema {
    ResourceSchema::new("s3_bucket")
        .attribute(AttributeSchema::new("name", AttributeType::String).required())
}

fn key_pair_schema() -> ResourceSchema {
    ResourceSchema::new("key_pair")
        .attribute(AttributeSchema::new("name", AttributeType::String).required())
        .attribute(AttributeSchema::new("public_key", AttributeType::String).required())
}

fn instance_schema() -> ResourceSchema {
    ResourceSchema::new("instance")
        .with_description("A cluster node")
        .attribute(AttributeSchema::new("name", AttributeType::String).required())
        .attribute(AttributeSchema::new("instance_type", AttributeType::String).required())
        .attribute(AttributeSchema::new("image_id", AttributeType::String).required())
        .attribute(AttributeSchema::new("subnet_id", AttributeType::String).required())
        .attribute(AttributeSchema::new("key_name", AttributeType::String))
        .attribute(AttributeSchema::new(
            "vpc_security_group_ids",
            AttributeType::List(Box::new(AttributeType::String)),
        ))
        .attribute(AttributeSchema::new("iam_instance_profile", AttributeType::String))
        .attribute(AttributeSchema::new("user_data", AttributeType::String))
}

fn load_balancer_schema() -> ResourceSchema {
    ResourceSchema::new("load_balancer")
        .attribute(AttributeSchema::new("name", AttributeType::String).required())
        .attribute(
            AttributeSchema::new(
                "load_balancer_type",
                AttributeType::Enum(vec!["application".to_string(), "network".to_string()]),
            )
            .required(),
        )
        .attribute(AttributeSchema::new("internal", AttributeType::Bool))
        .attribute(AttributeSchema::new(
            "subnets",
            AttributeType::List(Box::new(AttributeType::String)),
        ))
}

fn target_group_schema() -> ResourceSchema {
    ResourceSchema::new("target_group")
        .attribute(AttributeSchema::new("name", AttributeType::String).required())
        .attribute(AttributeSchema::new("port", types::port_number()).required())
        .attribute(AttributeSchema::new("protocol", lb_protocol()).required())
        .attribute(AttributeSchema::new("vpc_id", AttributeType::String).required())
}

fn target_group_attachment_schema() -> ResourceSchema {
    ResourceSchema::new("target_group_attachment")
        .attribute(AttributeSchema::new("target_group_arn", AttributeType::String).required())
        .attribute(AttributeSchema::new("target_id", AttributeType::String).required())
        .attribute(AttributeSchema::new("port", types::port_number()))
}

fn listener_schema() -> ResourceSchema {
    ResourceSchema::new("listener")
        .attribute(AttributeSchema::new("load_balancer_arn", AttributeType::String).required())
        .attribute(AttributeSchema::new("port", types::port_number()).required())
        .attribute(AttributeSchema::new("protocol", lb_protocol()).required())
}

fn dns_record_schema() -> ResourceSchema {
    ResourceSchema::new("dns_record")
        .attribute(AttributeSchema::new("name", AttributeType::String).required())
        .attribute(AttributeSchema::new("type", record_type()).required())
        .attribute(AttributeSchema::new("zone_id", AttributeType::String).required())
        .attribute(
            AttributeSchema::new(
                "records",
                AttributeType::List(Box::new(AttributeType::String)),
            )
            .required(),
        )
        .attribute(AttributeSchema::new("ttl", types::positive_int()))
        .attribute(AttributeSchema::new("allow_overwrite", AttributeType::Bool))
}

/// All schemas; resource types without one (IAM documents, route tables with
/// mixed-type route entries) are skipped by validation
pub fn all_schemas() -> Vec<ResourceSchema> {
    vec![
        vpc_schema(),
        subnet_schema(),
        internet_gateway_schema(),
        route_table_association_schema(),
        security_group_schema(),
        security_group_rule_schema(),
        s3_bucket_schema(),
        key_pair_schema(),
        instance_schema(),
        load_balancer_schema(),
        target_group_schema(),
        target_group_attachment_schema(),
        listener_schema(),
        dns_record_schema(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use altair_core::config::{ResolvedLookups, TopologyConfig};
    use std::collections::HashMap;

    #[test]
    fn schema_types_are_unique() {
        let schemas = all_schemas();
        let mut seen = std::collections::HashSet::new();
        for schema in &schemas {
            assert!(seen.insert(schema.resource_type.clone()));
        }
    }

    #[test]
    fn generated_topology_passes_its_own_schemas() {
        let manifest = crate::build(
            &TopologyConfig::default(),
            &ResolvedLookups::placeholder(),
        )
        .unwrap();
        let schemas: HashMap<_, _> = all_schemas()
            .into_iter()
            .map(|s| (s.resource_type.clone(), s))
            .collect();

        for resource in manifest.resources() {
            if let Some(schema) = schemas.get(&resource.id.resource_type)
                && let Err(errors) = schema.validate(&resource.attributes)
            {
                panic!("{}: {:?}", resource.id, errors);
            }
        }
    }
}
