//! `cargo publish-gate version` - show or set release versions

use crate::cargo::manifest::{DependencyTarget, ManifestDocument};
use crate::core::context::ReleaseContext;
use crate::core::error::{ConfigError, ReleaseResult};
use crate::core::vcs::SystemGit;
use crate::release::version::VersionResolver;
use std::collections::HashSet;

/// Print the manifest version of one or all packages, or the tag-derived version
pub fn run_version(ctx: &ReleaseContext, package: Option<String>, derived: bool) -> ReleaseResult<()> {
  let git = SystemGit::open(&ctx.root)?;
  let resolver = VersionResolver::new(&ctx.metadata, &git);

  if derived {
    println!("{}", resolver.resolve_derived_version()?.version);
    return Ok(());
  }

  match package {
    Some(name) => println!("{}", resolver.resolve_manifest_version(&name)?.version),
    None => {
      for package in &ctx.metadata.packages {
        let marker = if package.publishable { "" } else { " (not published)" };
        println!("{} {}{}", package.name, package.version, marker);
      }
    }
  }

  Ok(())
}

/// Set `workspace.package.version` (or one package's version) and keep the
/// matching `[workspace.dependencies]` requirements in step
pub fn run_version_set(ctx: &ReleaseContext, version: String, package: Option<String>) -> ReleaseResult<()> {
  semver::Version::parse(&version).map_err(|e| ConfigError::InvalidVersion {
    version: version.clone(),
    reason: e.to_string(),
  })?;

  let root_manifest_path = ctx.metadata.root_manifest();
  let mut root_manifest = ManifestDocument::load(&root_manifest_path)?;

  // Packages whose published version changes
  let mut affected: HashSet<String> = HashSet::new();

  match &package {
    Some(name) => {
      let package = ctx.metadata.package(name)?;
      if package.manifest_path == root_manifest_path {
        root_manifest.set_package_version(&version)?;
      } else {
        let mut manifest = ManifestDocument::load(&package.manifest_path)?;
        manifest.set_package_version(&version)?;
        manifest.save()?;
      }
      affected.insert(name.clone());
    }
    None => {
      root_manifest.set_workspace_package_version(&version)?;
      for package in &ctx.metadata.packages {
        let inherits = if package.manifest_path == root_manifest_path {
          root_manifest.inherits_workspace_version()
        } else {
          ManifestDocument::load(&package.manifest_path)?.inherits_workspace_version()
        };
        if inherits {
          affected.insert(package.name.clone());
        }
      }
    }
  }

  let target = DependencyTarget {
    requirement: &version,
    registry: None,
  };
  let updated = root_manifest.retarget_workspace_dependencies(&affected, target);
  root_manifest.save()?;

  let mut names: Vec<_> = affected.into_iter().collect();
  names.sort();
  match package {
    Some(name) => println!("✅ Set {} to {}", name, version),
    None => println!("✅ Set workspace version to {} ({})", version, names.join(", ")),
  }
  if updated > 0 {
    println!("   Updated {} workspace dependency requirement(s)", updated);
  }

  Ok(())
}
