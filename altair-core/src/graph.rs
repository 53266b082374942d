//! Graph - Dependency analysis over declared resources
//!
//! Cross-references between declarations (`Value::Ref`) and explicit
//! `depends_on` entries form a directed graph. The engine infers its own
//! ordering from the same references; the graph here exists to catch cycles
//! and to emit the manifest in a deterministic dependency order.

use std::collections::{HashMap, HashSet};

use crate::resource::{Resource, Value};

/// Dependency between resources
#[derive(Debug, Clone, PartialEq)]
pub struct Dependency {
    /// Target resource logical name
    pub target: String,
    /// Referenced attribute (e.g., "id"); empty for explicit `depends_on` edges
    pub attribute: String,
    /// Where this reference is used (e.g., "vpc_id")
    pub used_in: String,
}

/// Dependency graph for the resources of a manifest
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    /// Logical name -> list of dependencies
    edges: HashMap<String, Vec<Dependency>>,
    /// Reverse edges: target -> list of resources that depend on it
    reverse_edges: HashMap<String, Vec<String>>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_edge(&mut self, from: String, dependency: Dependency) {
        let target = dependency.target.clone();
        self.edges.entry(from.clone()).or_default().push(dependency);
        self.reverse_edges.entry(target).or_default().push(from);
    }

    /// Direct dependencies of a resource
    pub fn dependencies_of(&self, name: &str) -> &[Dependency] {
        self.edges.get(name).map_or(&[], |v| v.as_slice())
    }

    /// Resources that depend on this resource
    pub fn dependents_of(&self, name: &str) -> &[String] {
        self.reverse_edges.get(name).map_or(&[], |v| v.as_slice())
    }

    /// Check if the graph has any cycles
    pub fn has_cycle(&self) -> bool {
        let mut visited = HashSet::new();
        let mut rec_stack = HashSet::new();

        for node in self.edges.keys() {
            if self.has_cycle_util(node, &mut visited, &mut rec_stack) {
                return true;
            }
        }
        false
    }

    fn has_cycle_util(
        &self,
        node: &str,
        visited: &mut HashSet<String>,
        rec_stack: &mut HashSet<String>,
    ) -> bool {
        if rec_stack.contains(node) {
            return true;
        }
        if visited.contains(node) {
            return false;
        }

        visited.insert(node.to_string());
        rec_stack.insert(node.to_string());

        if let Some(deps) = self.edges.get(node) {
            for dep in deps {
                if self.has_cycle_util(&dep.target, visited, rec_stack) {
                    return true;
                }
            }
        }

        rec_stack.remove(node);
        false
    }
}

/// Collect every reference inside a value, in encounter order
pub fn collect_references(value: &Value, used_in: &str, out: &mut Vec<Dependency>) {
    match value {
        Value::Ref(target, attribute) => out.push(Dependency {
            target: target.clone(),
            attribute: attribute.clone(),
            used_in: used_in.to_string(),
        }),
        Value::List(items) | Value::Concat(items) => {
            for item in items {
                collect_references(item, used_in, out);
            }
        }
        Value::Map(map) => {
            for v in map.values() {
                collect_references(v, used_in, out);
            }
        }
        _ => {}
    }
}

/// All dependencies of a single resource: references first (in attribute
/// order, so the result is deterministic), then explicit `depends_on` entries
pub fn resource_dependencies(resource: &Resource) -> Vec<Dependency> {
    let mut deps = Vec::new();
    for (key, value) in &resource.attributes {
        collect_references(value, key, &mut deps);
    }
    for target in &resource.depends_on {
        deps.push(Dependency {
            target: target.clone(),
            attribute: String::new(),
            used_in: "depends_on".to_string(),
        });
    }
    deps
}

/// Build the dependency graph for a set of resources
pub fn graph_of(resources: &[Resource]) -> DependencyGraph {
    let mut graph = DependencyGraph::new();
    for resource in resources {
        for dep in resource_dependencies(resource) {
            graph.add_edge(resource.id.name.clone(), dep);
        }
    }
    graph
}

/// Dependency-ordered indices into `resources`: every resource appears after
/// everything it references. Declaration order is preserved among independent
/// resources, so the result is deterministic. Returns `None` on a cycle.
pub fn topological_order(resources: &[Resource]) -> Option<Vec<usize>> {
    let index_of: HashMap<&str, usize> = resources
        .iter()
        .enumerate()
        .map(|(i, r)| (r.id.name.as_str(), i))
        .collect();

    let mut order = Vec::with_capacity(resources.len());
    let mut visited = vec![false; resources.len()];
    let mut visiting = vec![false; resources.len()];

    fn visit(
        idx: usize,
        resources: &[Resource],
        index_of: &HashMap<&str, usize>,
        visited: &mut [bool],
        visiting: &mut [bool],
        order: &mut Vec<usize>,
    ) -> bool {
        if visited[idx] {
            return true;
        }
        if visiting[idx] {
            return false;
        }
        visiting[idx] = true;

        for dep in resource_dependencies(&resources[idx]) {
            if let Some(&dep_idx) = index_of.get(dep.target.as_str())
                && !visit(dep_idx, resources, index_of, visited, visiting, order)
            {
                return false;
            }
        }

        visiting[idx] = false;
        visited[idx] = true;
        order.push(idx);
        true
    }

    for idx in 0..resources.len() {
        if !visit(
            idx,
            resources,
            &index_of,
            &mut visited,
            &mut visiting,
            &mut order,
        ) {
            return None;
        }
    }

    Some(order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::Resource;

    fn subnet(vpc: &str) -> Resource {
        Resource::new("subnet", "public").with_attribute("vpc_id", Value::reference(vpc, "id"))
    }

    #[test]
    fn references_become_edges() {
        let resources = vec![Resource::new("vpc", "vpc"), subnet("vpc")];
        let graph = graph_of(&resources);

        let deps = graph.dependencies_of("public");
        assert_eq!(deps.len(), 1);
        assert_eq!(deps[0].target, "vpc");
        assert_eq!(deps[0].attribute, "id");
        assert_eq!(deps[0].used_in, "vpc_id");
        assert_eq!(graph.dependents_of("vpc"), ["public".to_string()]);
    }

    #[test]
    fn references_inside_lists_and_maps() {
        let resource = Resource::new("load_balancer", "nlb").with_attribute(
            "subnets",
            Value::List(vec![
                Value::reference("subnet_0", "id"),
                Value::reference("subnet_1", "id"),
            ]),
        );
        let deps = resource_dependencies(&resource);
        assert_eq!(deps.len(), 2);
        assert_eq!(deps[1].target, "subnet_1");
    }

    #[test]
    fn topological_order_puts_dependencies_first() {
        // Declared out of order on purpose
        let resources = vec![subnet("vpc"), Resource::new("vpc", "vpc")];
        let order = topological_order(&resources).unwrap();
        assert_eq!(order, vec![1, 0]);
    }

    #[test]
    fn declaration_order_preserved_among_independent_resources() {
        let resources = vec![
            Resource::new("s3_bucket", "a"),
            Resource::new("s3_bucket", "b"),
            Resource::new("s3_bucket", "c"),
        ];
        let order = topological_order(&resources).unwrap();
        assert_eq!(order, vec![0, 1, 2]);
    }

    #[test]
    fn cycle_is_detected() {
        let resources = vec![
            Resource::new("a", "a").with_attribute("x", Value::reference("b", "id")),
            Resource::new("b", "b").with_attribute("x", Value::reference("a", "id")),
        ];
        assert!(graph_of(&resources).has_cycle());
        assert!(topological_order(&resources).is_none());
    }

    #[test]
    fn explicit_dependency_orders_without_reference() {
        let resources = vec![
            Resource::new("instance", "node").with_dependency("gateway"),
            Resource::new("internet_gateway", "gateway"),
        ];
        let order = topological_order(&resources).unwrap();
        assert_eq!(order, vec![1, 0]);
    }
}
