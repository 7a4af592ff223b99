//! Publish workflow: resolve version -> gate -> publish, in publish order
//!
//! Default registry: each package publishes its committed manifest version.
//! Alternate registry: one version is derived from git tags, every package in
//! the publish order is rewritten to it inside a manifest transaction, and the
//! selected packages are published while the rewrite is in effect.

use crate::cargo::metadata::WorkspaceMetadata;
use crate::core::error::ReleaseResult;
use crate::core::vcs::SystemGit;
use crate::registry::Registry;
use crate::registry::index::RegistryIndex;
use crate::registry::publisher::{PublishOutcome, RegistryClient};
use crate::release::gate::PublishGate;
use crate::release::transaction::{ManifestRewrite, with_rewritten_manifests};
use crate::release::version::VersionResolver;

/// Selector value meaning every package in the publish order
pub const ALL_PACKAGES: &str = "all";

/// Which packages a run publishes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackageSelection {
  All,
  One(String),
}

impl PackageSelection {
  pub fn parse(value: &str) -> Self {
    if value == ALL_PACKAGES {
      PackageSelection::All
    } else {
      PackageSelection::One(value.to_string())
    }
  }
}

/// Drives one publish run. The only caller of `RegistryClient::publish`.
pub struct PublishWorkflow<'a, I: RegistryIndex, C: RegistryClient> {
  git: &'a SystemGit,
  gate: PublishGate<'a, I>,
  client: &'a mut C,
  order: &'a [String],
  quiet: bool,
}

impl<'a, I: RegistryIndex, C: RegistryClient> PublishWorkflow<'a, I, C> {
  pub fn new(git: &'a SystemGit, index: &'a I, client: &'a mut C, order: &'a [String]) -> Self {
    Self {
      git,
      gate: PublishGate::new(index),
      client,
      order,
      quiet: false,
    }
  }

  /// Suppress progress lines (machine-readable output)
  pub fn quiet(mut self, quiet: bool) -> Self {
    self.quiet = quiet;
    self
  }

  pub fn run(
    &mut self,
    workspace: &mut WorkspaceMetadata,
    selection: &PackageSelection,
    registry: &Registry,
  ) -> ReleaseResult<Vec<PublishOutcome>> {
    let selected = match selection {
      PackageSelection::All => self.order.to_vec(),
      PackageSelection::One(name) => {
        workspace.publishable_package(name)?;
        vec![name.clone()]
      }
    };

    if registry.is_default {
      return self.run_default(workspace, &selected, registry);
    }
    self.run_alternate(workspace, &selected, registry)
  }

  fn run_default(
    &mut self,
    workspace: &WorkspaceMetadata,
    selected: &[String],
    registry: &Registry,
  ) -> ReleaseResult<Vec<PublishOutcome>> {
    let resolver = VersionResolver::new(workspace, self.git);
    let mut outcomes = Vec::with_capacity(selected.len());

    for name in selected {
      let version = resolver.resolve_manifest_version(name)?.version;
      outcomes.push(self.publish_gated(name, &version, registry)?);
    }

    Ok(outcomes)
  }

  fn run_alternate(
    &mut self,
    workspace: &mut WorkspaceMetadata,
    selected: &[String],
    registry: &Registry,
  ) -> ReleaseResult<Vec<PublishOutcome>> {
    let version = VersionResolver::new(workspace, self.git).resolve_derived_version()?.version;
    log::info!("Derived version {} for {}", version, registry.name);
    if !self.quiet {
      println!("🏷️  Release version for {}: {}", registry.name, version);
    }

    // Every package that could be depended on gets the derived version
    let mut packages = self.order.to_vec();
    for name in selected {
      if !packages.contains(name) {
        packages.push(name.clone());
      }
    }

    let rewrite = ManifestRewrite {
      version: &version,
      registry: &registry.name,
      packages: &packages,
    };

    with_rewritten_manifests(workspace, self.git, rewrite, |_| {
      let mut outcomes = Vec::with_capacity(selected.len());
      for name in selected {
        outcomes.push(self.publish_gated(name, &version, registry)?);
      }
      Ok(outcomes)
    })
  }

  fn publish_gated(&mut self, package: &str, version: &str, registry: &Registry) -> ReleaseResult<PublishOutcome> {
    if !self.gate.should_publish(package, version, registry)? {
      if !self.quiet {
        println!("⏭️  {} {} is already on {}, skipping", package, version, registry.name);
      }
      return Ok(PublishOutcome::Skipped {
        package: package.to_string(),
        version: version.to_string(),
        registry: registry.name.clone(),
      });
    }

    if !self.quiet {
      println!("🚀 Publishing {} {} to {}...", package, version, registry.name);
    }
    let outcome = self.client.publish(package, version, registry)?;
    if !self.quiet {
      match &outcome {
        PublishOutcome::DryRun { .. } => println!("   ✅ Dry run passed"),
        _ => println!("   ✅ Published"),
      }
    }
    Ok(outcome)
  }
}
