//! Scoped manifest rewrites for alternate-registry releases
//!
//! `with_rewritten_manifests` stamps a release version and registry pointer into
//! every manifest, runs a body, and then restores every tracked `Cargo.toml`
//! from HEAD. Restoration runs exactly once on every exit path: explicitly on
//! return (success or error) and from `Drop` while unwinding.
//!
//! After restoring, every manifest is re-digested and compared with the
//! snapshot taken before the rewrite, so "restored" means byte-identical.

use crate::cargo::manifest::{DependencyTarget, ManifestDocument};
use crate::cargo::metadata::WorkspaceMetadata;
use crate::core::error::{ManifestRestoreError, ReleaseError, ReleaseResult, ResultExt, VcsError};
use crate::core::vcs::SystemGit;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

/// What a transaction writes into the manifests
#[derive(Debug, Clone, Copy)]
pub struct ManifestRewrite<'a> {
  pub version: &'a str,
  pub registry: &'a str,
  /// Packages receiving `version`, in publish order
  pub packages: &'a [String],
}

/// Tracked manifests and their SHA-256 digests at transaction start.
/// Paths are relative to the working tree root.
#[derive(Debug, Clone)]
pub struct ManifestSnapshot {
  root: PathBuf,
  digests: BTreeMap<PathBuf, String>,
}

impl ManifestSnapshot {
  pub fn capture(root: &Path, paths: &[PathBuf]) -> ReleaseResult<Self> {
    let mut digests = BTreeMap::new();
    for path in paths {
      let bytes = fs::read(root.join(path)).with_context(|| format!("Failed to read {}", path.display()))?;
      digests.insert(path.clone(), digest(&bytes));
    }
    Ok(Self {
      root: root.to_path_buf(),
      digests,
    })
  }

  pub fn paths(&self) -> Vec<PathBuf> {
    self.digests.keys().cloned().collect()
  }

  pub fn contains(&self, path: &Path) -> bool {
    self.digests.contains_key(path)
  }

  /// Paths whose current bytes differ from the snapshot (missing files included)
  pub fn diverged(&self) -> Vec<PathBuf> {
    self
      .digests
      .iter()
      .filter(|(path, expected)| match fs::read(self.root.join(path)) {
        Ok(bytes) => digest(&bytes) != **expected,
        Err(_) => true,
      })
      .map(|(path, _)| path.clone())
      .collect()
  }
}

fn digest(bytes: &[u8]) -> String {
  format!("{:x}", Sha256::digest(bytes))
}

/// Restores the snapshot once, explicitly via `finish` or on drop
struct RestoreGuard<'a> {
  git: &'a SystemGit,
  snapshot: ManifestSnapshot,
  done: bool,
}

impl<'a> RestoreGuard<'a> {
  fn new(git: &'a SystemGit, snapshot: ManifestSnapshot) -> Self {
    Self {
      git,
      snapshot,
      done: false,
    }
  }

  fn finish(mut self) -> Result<(), ManifestRestoreError> {
    self.done = true;
    restore(self.git, &self.snapshot)
  }
}

impl Drop for RestoreGuard<'_> {
  fn drop(&mut self) {
    if self.done {
      return;
    }
    self.done = true;
    if let Err(e) = restore(self.git, &self.snapshot) {
      log::error!("{}", e);
      eprintln!("\n❌ {}\n", e);
    }
  }
}

fn restore(git: &SystemGit, snapshot: &ManifestSnapshot) -> Result<(), ManifestRestoreError> {
  let paths = snapshot.paths();
  git.restore_paths(&paths)?;

  let diverged = snapshot.diverged();
  if !diverged.is_empty() {
    return Err(ManifestRestoreError::Diverged { paths: diverged });
  }
  log::debug!("Restored {} manifest(s)", paths.len());
  Ok(())
}

/// Run `body` with every manifest rewritten to `rewrite`, then restore.
///
/// Refuses to start if any tracked manifest has uncommitted changes. A rewrite
/// failure is reported like a body failure (after restoring). When the body and
/// the restore both fail the body error stays primary.
///
/// `workspace` is taken by `&mut` only so that transactions cannot nest.
pub fn with_rewritten_manifests<T, F>(
  workspace: &mut WorkspaceMetadata,
  git: &SystemGit,
  rewrite: ManifestRewrite<'_>,
  body: F,
) -> ReleaseResult<T>
where
  F: FnOnce(&WorkspaceMetadata) -> ReleaseResult<T>,
{
  let work_tree = canonical(git.work_tree())?;
  let tracked = git.tracked_manifests()?;

  let dirty = git.changed_paths(&tracked)?;
  if !dirty.is_empty() {
    return Err(VcsError::DirtyManifests { paths: dirty }.into());
  }

  let snapshot = ManifestSnapshot::capture(&work_tree, &tracked)?;
  let targets = rewrite_targets(workspace, rewrite.packages, &work_tree, &snapshot)?;

  let guard = RestoreGuard::new(git, snapshot);
  let workspace: &WorkspaceMetadata = workspace;
  let result = apply_rewrite(workspace, &targets, rewrite).and_then(|()| body(workspace));
  let restored = guard.finish();

  match (result, restored) {
    (Ok(value), Ok(())) => Ok(value),
    (Ok(_), Err(restore)) => Err(restore.into()),
    (Err(primary), Ok(())) => Err(primary),
    (Err(primary), Err(restore)) => Err(ReleaseError::RestoreAfterFailure {
      primary: Box::new(primary),
      restore,
    }),
  }
}

/// Absolute manifest paths to edit, keyed by path, with the packages they declare.
/// Every one must be tracked, or restoring from HEAD could not undo the edit.
fn rewrite_targets(
  workspace: &WorkspaceMetadata,
  packages: &[String],
  work_tree: &Path,
  snapshot: &ManifestSnapshot,
) -> ReleaseResult<BTreeMap<PathBuf, bool>> {
  let root_manifest = canonical(&workspace.root_manifest())?;
  let mut targets = BTreeMap::new();
  targets.insert(root_manifest, false);

  for name in packages {
    let manifest = canonical(&workspace.package(name)?.manifest_path)?;
    targets.insert(manifest, true);
  }

  for path in targets.keys() {
    let relative = path.strip_prefix(work_tree).unwrap_or(path);
    if !snapshot.contains(relative) {
      return Err(VcsError::UntrackedManifest { path: path.clone() }.into());
    }
  }

  Ok(targets)
}

fn apply_rewrite(
  workspace: &WorkspaceMetadata,
  targets: &BTreeMap<PathBuf, bool>,
  rewrite: ManifestRewrite<'_>,
) -> ReleaseResult<()> {
  let requirement = format!("={}", rewrite.version);
  let target = DependencyTarget {
    requirement: &requirement,
    registry: Some(rewrite.registry),
  };
  let siblings: HashSet<String> = rewrite.packages.iter().cloned().collect();
  let root_manifest = canonical(&workspace.root_manifest())?;

  for (path, is_package) in targets {
    let mut manifest = ManifestDocument::load(path)?;
    let mut edits = 0;

    if *is_package {
      manifest.set_package_version(rewrite.version)?;
      edits += 1;
      edits += manifest.retarget_member_dependencies(&siblings, target);
    }
    if *path == root_manifest {
      edits += manifest.retarget_workspace_dependencies(&siblings, target);
    }

    manifest.save()?;
    log::debug!("Rewrote {} ({} edit(s))", path.display(), edits);
  }

  Ok(())
}

fn canonical(path: &Path) -> ReleaseResult<PathBuf> {
  fs::canonicalize(path).with_context(|| format!("Failed to resolve {}", path.display()))
}
