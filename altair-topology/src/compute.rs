//! Compute: one keypair and one cluster node per availability zone

use std::collections::BTreeMap;

use altair_core::config::{ResolvedLookups, TopologyConfig};
use altair_core::manifest::Manifest;
use altair_core::resource::{Resource, Value};

use crate::TopologyError;
use crate::names;
use crate::userdata;

/// Public half of the operator keypair
const ADMIN_PUBLIC_KEY: &str =
    "ssh-ed25519 AAAAC3NzaC1lZDI1NTE5AAAAINWO9EKfPEQCbFV9VGl/GCp1cRfEugz/Yr36ch6yKd4p admin";

const ROOT_VOLUME_SIZE_GIB: i64 = 30;
const ROOT_VOLUME_TYPE: &str = "gp3";

pub fn declare(
    manifest: &mut Manifest,
    config: &TopologyConfig,
    lookups: &ResolvedLookups,
) -> Result<(), TopologyError> {
    manifest.add(
        Resource::new("key_pair", names::KEYPAIR)
            .with_attribute("name", Value::string("adminaws-keypair"))
            .with_attribute("public_key", Value::string(ADMIN_PUBLIC_KEY)),
    )?;

    let user_data = userdata::node_boot_script(&config.dns_zone_name);

    for index in 0..config.availability_zones.len() {
        let mut root_volume = BTreeMap::new();
        root_volume.insert("volume_size".to_string(), Value::Int(ROOT_VOLUME_SIZE_GIB));
        root_volume.insert("volume_type".to_string(), Value::string(ROOT_VOLUME_TYPE));

        manifest.add(
            Resource::new("instance", names::instance(index))
                .with_attribute("name", Value::string(config.instance_name(index)))
                .with_attribute("instance_type", Value::string(&config.instance_type))
                .with_attribute("image_id", Value::string(&lookups.image_id))
                .with_attribute("subnet_id", Value::reference(names::subnet(index), "id"))
                .with_attribute("key_name", Value::reference(names::KEYPAIR, "id"))
                .with_attribute(
                    "vpc_security_group_ids",
                    Value::List(vec![
                        Value::reference(names::SSH_GROUP, "id"),
                        Value::reference(names::WEB_GROUP, "id"),
                        Value::reference(names::CLUSTER_GROUP, "id"),
                    ]),
                )
                .with_attribute(
                    "iam_instance_profile",
                    Value::reference(names::NODE_PROFILE, "name"),
                )
                .with_attribute("root_block_device", Value::Map(root_volume))
                .with_attribute("user_data", Value::string(&user_data))
                // The boot script pulls packages at first boot, so the
                // default route must already exist
                .with_dependency(names::GATEWAY),
        )?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network;

    fn declared(config: &TopologyConfig) -> Manifest {
        let mut manifest = Manifest::new();
        network::declare(&mut manifest, config).unwrap();
        crate::access::declare(&mut manifest).unwrap();
        crate::identity::declare(&mut manifest).unwrap();
        declare(&mut manifest, config, &ResolvedLookups::placeholder()).unwrap();
        manifest
    }

    #[test]
    fn one_instance_per_zone_in_its_own_subnet() {
        let config = TopologyConfig::default();
        let manifest = declared(&config);

        assert_eq!(manifest.summary().counts["instance"], 3);
        for index in 0..3 {
            let instance = manifest.get(&names::instance(index)).unwrap();
            assert_eq!(
                instance.attribute("subnet_id"),
                Some(&Value::reference(names::subnet(index), "id"))
            );
            assert_eq!(
                instance.attribute("name"),
                Some(&Value::string(format!("k8s-dev-{}", index)))
            );
        }
    }

    #[test]
    fn every_instance_joins_all_three_groups() {
        let manifest = declared(&TopologyConfig::default());
        for index in 0..3 {
            let instance = manifest.get(&names::instance(index)).unwrap();
            let Some(Value::List(groups)) = instance.attribute("vpc_security_group_ids") else {
                panic!("security groups missing");
            };
            assert_eq!(
                groups,
                &vec![
                    Value::reference(names::SSH_GROUP, "id"),
                    Value::reference(names::WEB_GROUP, "id"),
                    Value::reference(names::CLUSTER_GROUP, "id"),
                ]
            );
        }
    }

    #[test]
    fn instances_share_image_profile_and_volume_shape() {
        let config = TopologyConfig::default();
        let lookups = ResolvedLookups::placeholder();
        let manifest = declared(&config);

        let instance = manifest.get(&names::instance(0)).unwrap();
        assert_eq!(
            instance.attribute("image_id"),
            Some(&Value::string(&lookups.image_id))
        );
        assert_eq!(
            instance.attribute("iam_instance_profile"),
            Some(&Value::reference(names::NODE_PROFILE, "name"))
        );

        let Some(Value::Map(volume)) = instance.attribute("root_block_device") else {
            panic!("root volume missing");
        };
        assert_eq!(volume["volume_size"], Value::Int(30));
        assert_eq!(volume["volume_type"], Value::string("gp3"));
    }

    #[test]
    fn boot_script_is_attached_verbatim() {
        let config = TopologyConfig::default();
        let manifest = declared(&config);
        let instance = manifest.get(&names::instance(1)).unwrap();
        assert_eq!(
            instance.attribute("user_data"),
            Some(&Value::string(userdata::node_boot_script(
                &config.dns_zone_name
            )))
        );
    }

    #[test]
    fn instances_wait_for_the_gateway() {
        let manifest = declared(&TopologyConfig::default());
        let instance = manifest.get(&names::instance(0)).unwrap();
        assert_eq!(instance.depends_on, vec![names::GATEWAY.to_string()]);
    }
}
