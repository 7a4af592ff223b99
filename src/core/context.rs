//! Release context - build once, pass everywhere
//!
//! Loads workspace metadata and the optional publish-gate config a single time
//! in main.rs. Commands receive `&ReleaseContext` (or `&mut` when they open a
//! manifest transaction).

use crate::cargo::metadata::WorkspaceMetadata;
use crate::core::config::GateConfig;
use crate::core::error::ReleaseResult;
use std::path::{Path, PathBuf};

/// Workspace-level data shared by all commands
pub struct ReleaseContext {
  /// Workspace root directory (absolute path)
  pub root: PathBuf,

  /// Packages and their intra-workspace edges, read once per run
  pub metadata: WorkspaceMetadata,

  /// publish-gate configuration (defaults when no file exists)
  pub config: GateConfig,
}

impl ReleaseContext {
  /// Build context from any directory inside the workspace.
  pub fn build(start: &Path) -> ReleaseResult<Self> {
    let metadata = WorkspaceMetadata::load(start)?;
    let root = metadata.root.clone();
    let config = GateConfig::load(&root)?;

    log::debug!(
      "Workspace {} has {} package(s)",
      root.display(),
      metadata.packages.len()
    );

    Ok(Self { root, metadata, config })
  }
}
