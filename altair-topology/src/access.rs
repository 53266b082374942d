//! Access policies: three traffic-isolation groups plus the trusted-peer rule

use std::collections::BTreeMap;

use altair_core::manifest::Manifest;
use altair_core::resource::{Resource, Value};

use crate::TopologyError;
use crate::names;

fn cidr_rule(protocol: &str, from_port: i64, to_port: i64) -> Value {
    let mut rule = BTreeMap::new();
    rule.insert(
        "cidr_blocks".to_string(),
        Value::List(vec![Value::string("0.0.0.0/0")]),
    );
    rule.insert("protocol".to_string(), Value::string(protocol));
    rule.insert("from_port".to_string(), Value::Int(from_port));
    rule.insert("to_port".to_string(), Value::Int(to_port));
    Value::Map(rule)
}

fn group(logical: &str, display: &str, ingress: Vec<Value>) -> Resource {
    Resource::new("security_group", logical)
        .with_attribute("name", Value::string(display))
        .with_attribute("vpc_id", Value::reference(names::VPC, "id"))
        .with_attribute("ingress", Value::List(ingress))
        .with_attribute("egress", Value::List(vec![cidr_rule("-1", 0, 0)]))
}

pub fn declare(manifest: &mut Manifest) -> Result<(), TopologyError> {
    manifest.add(group(
        names::SSH_GROUP,
        "ALL_ssh",
        vec![cidr_rule("tcp", 22, 22)],
    ))?;
    manifest.add(group(
        names::WEB_GROUP,
        "ALL_http",
        vec![cidr_rule("tcp", 80, 80), cidr_rule("tcp", 443, 443)],
    ))?;
    manifest.add(group(
        names::CLUSTER_GROUP,
        "ALL_k8s",
        vec![cidr_rule("tcp", 16443, 16443)],
    ))?;

    // Trusted-peer rule: members of the SSH group reach each other on any
    // port. Declared as its own resource; the source is the group's identity,
    // which must already be allocated.
    manifest.add(
        Resource::new("security_group_rule", names::SSH_PEER_RULE)
            .with_attribute("name", Value::string("ssh_group"))
            .with_attribute("type", Value::string("ingress"))
            .with_attribute(
                "security_group_id",
                Value::reference(names::SSH_GROUP, "id"),
            )
            .with_attribute(
                "source_security_group_id",
                Value::reference(names::SSH_GROUP, "id"),
            )
            .with_attribute("protocol", Value::string("-1"))
            .with_attribute("from_port", Value::Int(0))
            .with_attribute("to_port", Value::Int(65535)),
    )?;

    Ok(())
}
