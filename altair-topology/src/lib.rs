//! Altair Topology
//!
//! Generation rules for the cluster deployment: a single pass turns one
//! immutable [`TopologyConfig`] plus the phase-one lookup results into the
//! full manifest of resource declarations. Control flow is a straight-line
//! sequence with two list iterations (availability zones, listener ports);
//! everything else is cross-references the engine orders by.

pub mod access;
pub mod compute;
pub mod dns;
pub mod identity;
pub mod loadbalancer;
pub mod names;
pub mod network;
pub mod schemas;
pub mod userdata;

use altair_core::cidr::CidrError;
use altair_core::config::{ConfigError, ResolvedLookups, TopologyConfig};
use altair_core::manifest::{Manifest, ManifestError};

/// Error raised while generating the topology
#[derive(Debug, thiserror::Error)]
pub enum TopologyError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error(transparent)]
    Cidr(#[from] CidrError),
}

/// Build the full declaration set. Lookups must already be resolved; the
/// manifest leaves this function reference-checked and cycle-free.
pub fn build(
    config: &TopologyConfig,
    lookups: &ResolvedLookups,
) -> Result<Manifest, TopologyError> {
    config.validate()?;

    let mut manifest = Manifest::new();
    network::declare(&mut manifest, config)?;
    access::declare(&mut manifest)?;
    identity::declare(&mut manifest)?;
    compute::declare(&mut manifest, config, lookups)?;
    loadbalancer::declare(&mut manifest, config)?;
    dns::declare(&mut manifest, config, lookups)?;

    manifest.check_references()?;
    Ok(manifest)
}
