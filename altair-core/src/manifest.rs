//! Manifest - The ordered set of resource declarations
//!
//! A Manifest is the output of one generation pass: a flat set of resource
//! declarations plus their cross-references. Nothing is created here; the
//! manifest is validated, ordered by dependency, and handed to the external
//! reconciliation engine as JSON.

use std::collections::BTreeMap;

use crate::graph::{self, DependencyGraph};
use crate::resource::{Resource, ResourceId};

/// Error raised while assembling or emitting a manifest
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ManifestError {
    #[error("duplicate resource name '{0}'")]
    DuplicateResource(String),

    #[error("{resource} references undeclared resource '{target}'")]
    UnknownReference { resource: ResourceId, target: String },

    #[error("dependency cycle among declared resources")]
    DependencyCycle,
}

/// The declaration set produced by one generation pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Manifest {
    resources: Vec<Resource>,
}

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a resource. Logical names are the reference namespace, so they
    /// must be unique across the whole manifest.
    pub fn add(&mut self, resource: Resource) -> Result<(), ManifestError> {
        if self.get(&resource.id.name).is_some() {
            return Err(ManifestError::DuplicateResource(resource.id.name.clone()));
        }
        self.resources.push(resource);
        Ok(())
    }

    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    pub fn get(&self, name: &str) -> Option<&Resource> {
        self.resources.iter().find(|r| r.id.name == name)
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    pub fn graph(&self) -> DependencyGraph {
        graph::graph_of(&self.resources)
    }

    /// Every reference and explicit dependency must point at a declared
    /// resource; a dangling reference would otherwise only surface when the
    /// engine fails to resolve it at apply time.
    pub fn check_references(&self) -> Result<(), ManifestError> {
        for resource in &self.resources {
            for dep in graph::resource_dependencies(resource) {
                if self.get(&dep.target).is_none() {
                    return Err(ManifestError::UnknownReference {
                        resource: resource.id.clone(),
                        target: dep.target,
                    });
                }
            }
        }
        Ok(())
    }

    /// Resources in dependency order: everything appears after what it
    /// references. Fails on dangling references and cycles.
    pub fn ordered(&self) -> Result<Vec<&Resource>, ManifestError> {
        self.check_references()?;
        let order =
            graph::topological_order(&self.resources).ok_or(ManifestError::DependencyCycle)?;
        Ok(order.into_iter().map(|i| &self.resources[i]).collect())
    }

    /// Per-type counts for display
    pub fn summary(&self) -> ManifestSummary {
        let mut counts = BTreeMap::new();
        for resource in &self.resources {
            *counts.entry(resource.id.resource_type.clone()).or_insert(0) += 1;
        }
        ManifestSummary {
            total: self.resources.len(),
            counts,
        }
    }

    /// Engine-facing JSON, dependency-ordered. Identical configuration
    /// produces identical output byte-for-byte: attribute maps are ordered
    /// and the topological order is deterministic.
    pub fn to_json(&self) -> Result<serde_json::Value, ManifestError> {
        let ordered = self.ordered()?;
        Ok(serde_json::json!({
            "resources": ordered.iter().map(|r| r.to_json()).collect::<Vec<_>>(),
        }))
    }

    pub fn to_json_string(&self) -> Result<String, ManifestError> {
        let json = self.to_json()?;
        // Pretty-printing an already-built value cannot fail
        Ok(serde_json::to_string_pretty(&json).unwrap_or_default())
    }
}

/// Summary of a manifest for display
#[derive(Debug, Default)]
pub struct ManifestSummary {
    pub total: usize,
    pub counts: BTreeMap<String, usize>,
}

impl std::fmt::Display for ManifestSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self
            .counts
            .iter()
            .map(|(t, n)| format!("{} {}", n, t))
            .collect();
        write!(
            f,
            "Manifest: {} resources ({})",
            self.total,
            parts.join(", ")
        )
    }
}
