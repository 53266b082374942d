//! Config - Topology parameters and resolved external lookups
//!
//! All topology parameters form one immutable value passed into the
//! generation entry point. Defaults describe the dev cluster.

use serde::{Deserialize, Serialize};

use crate::schema::validate_cidr;

/// Configuration for one generation pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TopologyConfig {
    /// Availability zones; one subnet and one cluster node per zone
    pub availability_zones: Vec<String>,
    /// Pre-existing hosted zone the DNS records are declared in
    pub dns_zone_name: String,
    /// Environment suffix stamped into network resource names
    pub suffix: String,
    /// EC2 instance type for every node
    pub instance_type: String,
    /// Node name prefix; nodes are named `<prefix>-0..N`
    pub instance_prefix: String,
    /// AWS region the lookups run against
    pub region: String,
    /// VPC CIDR block; subnets take /24 slices of it
    pub vpc_cidr: String,
    /// Machine image catalog query
    pub image: ImageQuery,
}

impl Default for TopologyConfig {
    fn default() -> Self {
        Self {
            availability_zones: vec![
                "us-east-1a".to_string(),
                "us-east-1b".to_string(),
                "us-east-1c".to_string(),
            ],
            dns_zone_name: "aws.domain.com".to_string(),
            suffix: "dev".to_string(),
            instance_type: "t3a.small".to_string(),
            instance_prefix: "k8s-dev".to_string(),
            region: "us-east-1".to_string(),
            vpc_cidr: "10.90.0.0/16".to_string(),
            image: ImageQuery::default(),
        }
    }
}

impl TopologyConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.availability_zones.is_empty() {
            return Err(ConfigError::NoAvailabilityZones);
        }
        for (i, zone) in self.availability_zones.iter().enumerate() {
            if zone.is_empty() {
                return Err(ConfigError::EmptyOption("availability_zones"));
            }
            if self.availability_zones[..i].contains(zone) {
                return Err(ConfigError::DuplicateZone(zone.clone()));
            }
        }
        for (name, value) in [
            ("dns_zone_name", &self.dns_zone_name),
            ("suffix", &self.suffix),
            ("instance_type", &self.instance_type),
            ("instance_prefix", &self.instance_prefix),
            ("region", &self.region),
        ] {
            if value.is_empty() {
                return Err(ConfigError::EmptyOption(name));
            }
        }
        validate_cidr(&self.vpc_cidr).map_err(ConfigError::InvalidCidr)?;
        Ok(())
    }

    /// Display name of the node at `index` (also its DNS record name)
    pub fn instance_name(&self, index: usize) -> String {
        format!("{}-{}", self.instance_prefix, index)
    }

    /// Display names of all nodes, in zone order
    pub fn instance_names(&self) -> Vec<String> {
        (0..self.availability_zones.len())
            .map(|i| self.instance_name(i))
            .collect()
    }
}

/// Machine image catalog query: owner allow-list plus name pattern, resolved
/// to the most recent match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageQuery {
    pub owners: Vec<String>,
    pub name_pattern: String,
}

impl Default for ImageQuery {
    fn default() -> Self {
        Self {
            // Canonical's Ubuntu 22.04 server images
            owners: vec!["099720109477".to_string()],
            name_pattern: "ubuntu/images/hvm-ssd/ubuntu-jammy-22.04-amd64-server-*".to_string(),
        }
    }
}

/// Results of the phase-one external lookups. Generation never proceeds with
/// partial lookups: both values exist or the pass has already failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedLookups {
    /// Machine image resolved from the catalog query
    pub image_id: String,
    /// Identifier of the pre-existing hosted zone
    pub hosted_zone_id: String,
}

impl ResolvedLookups {
    /// Stand-in values for offline validation and rendering; real identifiers
    /// come from the AWS lookups.
    pub fn placeholder() -> Self {
        Self {
            image_id: "ami-00000000000000000".to_string(),
            hosted_zone_id: "Z0000000000000000000".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("at least one availability zone is required")]
    NoAvailabilityZones,

    #[error("availability zone '{0}' is listed twice")]
    DuplicateZone(String),

    #[error("configuration option '{0}' must not be empty")]
    EmptyOption(&'static str),

    #[error("invalid vpc_cidr: {0}")]
    InvalidCidr(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(TopologyConfig::default().validate().is_ok());
    }

    #[test]
    fn empty_zone_list_is_rejected() {
        let config = TopologyConfig {
            availability_zones: vec![],
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::NoAvailabilityZones));
    }

    #[test]
    fn duplicate_zone_is_rejected() {
        let config = TopologyConfig {
            availability_zones: vec!["us-east-1a".to_string(), "us-east-1a".to_string()],
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::DuplicateZone("us-east-1a".to_string()))
        );
    }

    #[test]
    fn malformed_cidr_is_rejected() {
        let config = TopologyConfig {
            vpc_cidr: "10.90.0.0".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidCidr(_))
        ));
    }

    #[test]
    fn instance_names_follow_prefix_and_index() {
        let config = TopologyConfig::default();
        assert_eq!(
            config.instance_names(),
            vec!["k8s-dev-0", "k8s-dev-1", "k8s-dev-2"]
        );
    }

    #[test]
    fn partial_config_file_fills_defaults() {
        let config: TopologyConfig =
            serde_json::from_str(r#"{"suffix": "prod", "instance_prefix": "k8s-prod"}"#).unwrap();
        assert_eq!(config.suffix, "prod");
        assert_eq!(config.instance_prefix, "k8s-prod");
        assert_eq!(config.vpc_cidr, "10.90.0.0/16");
        assert_eq!(config.availability_zones.len(), 3);
    }
}
