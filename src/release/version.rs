//! Release version resolution
//!
//! Default-registry releases publish the committed manifest version. Alternate
//! registries get a version derived from `git describe --tags`, so every commit
//! maps to a distinct, ordered prerelease.

use crate::cargo::metadata::WorkspaceMetadata;
use crate::core::error::{ReleaseResult, VcsError};
use crate::core::vcs::SystemGit;
use serde::Serialize;

/// Where a release version came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VersionSource {
  Manifest,
  Derived,
}

/// A version plus its provenance
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedVersion {
  pub version: String,
  pub source: VersionSource,
}

/// Turn `git describe --tags` output into a registry version.
///
/// `v1.0.0-alpha.2-7-gcba255f` becomes `1.0.0-alpha.2.7.gcba255f`; an exact tag
/// such as `v1.0.0` or `v1.0.0-beta.1` is returned without its `v`.
pub fn derive_version(describe: &str) -> Result<String, VcsError> {
  let trimmed = describe.trim();
  let stripped = trimmed.strip_prefix('v').unwrap_or(trimmed);

  if stripped.is_empty() {
    return Err(VcsError::MalformedDescribe {
      output: describe.to_string(),
      reason: "empty output".to_string(),
    });
  }

  let version = match stripped.split_once('-') {
    None => stripped.to_string(),
    Some((core, tail)) => format!("{}-{}", core, tail.replace('-', ".")),
  };

  semver::Version::parse(&version).map_err(|e| VcsError::MalformedDescribe {
    output: describe.to_string(),
    reason: e.to_string(),
  })?;

  Ok(version)
}

/// Resolves release versions for one workspace
pub struct VersionResolver<'a> {
  metadata: &'a WorkspaceMetadata,
  git: &'a SystemGit,
}

impl<'a> VersionResolver<'a> {
  pub fn new(metadata: &'a WorkspaceMetadata, git: &'a SystemGit) -> Self {
    Self { metadata, git }
  }

  /// Committed version of a workspace package
  pub fn resolve_manifest_version(&self, package: &str) -> ReleaseResult<ResolvedVersion> {
    let package = self.metadata.package(package)?;
    Ok(ResolvedVersion {
      version: package.version.clone(),
      source: VersionSource::Manifest,
    })
  }

  /// Version derived from the nearest tag
  pub fn resolve_derived_version(&self) -> ReleaseResult<ResolvedVersion> {
    let describe = self.git.describe_tags()?;
    log::debug!("git describe --tags: {}", describe);

    Ok(ResolvedVersion {
      version: derive_version(&describe)?,
      source: VersionSource::Derived,
    })
  }
}
