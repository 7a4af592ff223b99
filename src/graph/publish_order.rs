//! Publish order: dependencies strictly before dependents
//!
//! Either a fixed list from `[publish] order` (validated against the workspace)
//! or a topological sort of the publishable packages.

use crate::cargo::metadata::WorkspaceMetadata;
use crate::core::error::{ConfigError, MetadataReadError, ReleaseResult};
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{HashMap, HashSet};

/// Order in which publishable packages must reach a registry
pub fn resolve_publish_order(metadata: &WorkspaceMetadata, configured: &[String]) -> ReleaseResult<Vec<String>> {
  if !configured.is_empty() {
    validate_order(metadata, configured)?;
    return Ok(configured.to_vec());
  }

  let mut graph = DiGraph::<String, ()>::new();
  let mut node_map: HashMap<&str, NodeIndex> = HashMap::new();

  // `packages` is sorted by name, so node order is stable across runs
  for package in metadata.publishable() {
    let idx = graph.add_node(package.name.clone());
    node_map.insert(package.name.as_str(), idx);
  }

  // Edge direction: dependent -> dependency
  for package in metadata.publishable() {
    let dependent = node_map[package.name.as_str()];
    for dep in package.publish_prerequisites() {
      if let Some(&dependency) = node_map.get(dep) {
        graph.update_edge(dependent, dependency, ());
      }
    }
  }

  let sorted = toposort(&graph, None).map_err(|cycle| ConfigError::InvalidPublishOrder {
    reason: format!("circular dependency involving '{}'", graph[cycle.node_id()]),
  })?;

  Ok(sorted.into_iter().rev().map(|idx| graph[idx].clone()).collect())
}

/// Check a fixed order against the workspace
pub fn validate_order(metadata: &WorkspaceMetadata, order: &[String]) -> ReleaseResult<()> {
  let mut seen: HashSet<&str> = HashSet::new();
  let listed: HashSet<&str> = order.iter().map(String::as_str).collect();

  for name in order {
    let package = match metadata.publishable_package(name) {
      Ok(package) => package,
      Err(crate::core::error::ReleaseError::Metadata(MetadataReadError::UnknownPackage { .. })) => {
        return Err(invalid(format!("'{}' is not a workspace package", name)));
      }
      Err(_) => return Err(invalid(format!("'{}' is marked as not publishable", name))),
    };

    if !seen.insert(name.as_str()) {
      return Err(invalid(format!("'{}' is listed more than once", name)));
    }

    for dep in package.publish_prerequisites() {
      let Ok(dependency) = metadata.package(dep) else {
        continue;
      };
      if !dependency.publishable {
        continue;
      }
      if !listed.contains(dep) {
        return Err(invalid(format!("'{}' depends on '{}', which is missing from the order", name, dep)));
      }
      if !seen.contains(dep) {
        return Err(invalid(format!("'{}' is listed before its dependency '{}'", name, dep)));
      }
    }
  }

  Ok(())
}

fn invalid(reason: String) -> crate::core::error::ReleaseError {
  ConfigError::InvalidPublishOrder { reason }.into()
}
