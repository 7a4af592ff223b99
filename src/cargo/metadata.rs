use crate::core::error::{MetadataReadError, ReleaseResult};
use cargo_metadata::{DependencyKind, MetadataCommand};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Kind of an intra-workspace dependency edge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeKind {
  Normal,
  Development,
  Build,
}

impl EdgeKind {
  /// Whether the dependency must already be on the registry when the dependent is published
  pub fn affects_publish_order(self) -> bool {
    matches!(self, EdgeKind::Normal | EdgeKind::Build)
  }
}

/// Dependency on another package in the same workspace
#[derive(Debug, Clone)]
pub struct DependencyEdge {
  /// Target package name
  pub name: String,
  pub kind: EdgeKind,
  /// Registry pointer, `None` for the default registry
  pub registry: Option<String>,
  /// Declared version requirement, `None` for path-only dependencies
  pub requirement: Option<String>,
}

/// One workspace member as seen by the release workflow
#[derive(Debug, Clone)]
pub struct WorkspacePackage {
  pub name: String,
  /// Declared (committed) version
  pub version: String,
  pub manifest_path: PathBuf,
  pub publishable: bool,
  pub dependencies: Vec<DependencyEdge>,
}

impl WorkspacePackage {
  /// Names of workspace packages that must be published before this one
  pub fn publish_prerequisites(&self) -> impl Iterator<Item = &str> {
    self
      .dependencies
      .iter()
      .filter(|d| d.kind.affects_publish_order())
      .map(|d| d.name.as_str())
  }
}

/// Workspace introspection using cargo_metadata
#[derive(Debug, Clone)]
pub struct WorkspaceMetadata {
  pub root: PathBuf,
  pub packages: Vec<WorkspacePackage>,
}

impl WorkspaceMetadata {
  /// Run `cargo metadata --no-deps` for the workspace containing `start`
  pub fn load(start: &Path) -> ReleaseResult<Self> {
    log::debug!("Reading cargo metadata in {}", start.display());
    let metadata = MetadataCommand::new().current_dir(start).no_deps().exec()?;

    let members = metadata.workspace_packages();
    let names: HashSet<String> = members.iter().map(|p| p.name.to_string()).collect();

    let packages = members
      .into_iter()
      .map(|pkg| WorkspacePackage {
        name: pkg.name.to_string(),
        version: pkg.version.to_string(),
        manifest_path: pkg.manifest_path.clone().into_std_path_buf(),
        // `publish = false` shows up as an empty registry list
        publishable: !matches!(&pkg.publish, Some(registries) if registries.is_empty()),
        dependencies: pkg
          .dependencies
          .iter()
          .filter(|dep| names.contains(dep.name.as_str()))
          .map(|dep| DependencyEdge {
            name: dep.name.clone(),
            kind: match dep.kind {
              DependencyKind::Development => EdgeKind::Development,
              DependencyKind::Build => EdgeKind::Build,
              _ => EdgeKind::Normal,
            },
            registry: dep.registry.clone(),
            requirement: match dep.req.to_string().as_str() {
              "*" => None,
              req => Some(req.to_string()),
            },
          })
          .collect(),
      })
      .collect();

    Ok(Self::new(metadata.workspace_root.into_std_path_buf(), packages))
  }

  pub fn new(root: PathBuf, mut packages: Vec<WorkspacePackage>) -> Self {
    packages.sort_by(|a, b| a.name.cmp(&b.name));
    Self { root, packages }
  }

  /// Look up a workspace member by name
  pub fn package(&self, name: &str) -> ReleaseResult<&WorkspacePackage> {
    self.packages.iter().find(|p| p.name == name).ok_or_else(|| {
      MetadataReadError::UnknownPackage {
        name: name.to_string(),
        known: self.packages.iter().map(|p| p.name.clone()).collect(),
      }
      .into()
    })
  }

  /// Look up a member that may be published
  pub fn publishable_package(&self, name: &str) -> ReleaseResult<&WorkspacePackage> {
    let package = self.package(name)?;
    if !package.publishable {
      return Err(MetadataReadError::NotPublishable { name: name.to_string() }.into());
    }
    Ok(package)
  }

  pub fn publishable(&self) -> impl Iterator<Item = &WorkspacePackage> {
    self.packages.iter().filter(|p| p.publishable)
  }

  /// Path to the workspace root manifest
  pub fn root_manifest(&self) -> PathBuf {
    self.root.join("Cargo.toml")
  }
}
