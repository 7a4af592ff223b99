//! Registry client: uploads one package version via `cargo publish`

use crate::core::error::{PublishError, ReleaseResult, ResultExt};
use crate::registry::Registry;
use serde::Serialize;
use std::path::PathBuf;
use std::process::Command;

/// What happened to one package in a publish run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PublishOutcome {
  Published {
    package: String,
    version: String,
    registry: String,
  },
  /// Version already present on the registry
  Skipped {
    package: String,
    version: String,
    registry: String,
  },
  /// Packaged and verified, upload skipped
  DryRun {
    package: String,
    version: String,
    registry: String,
  },
}

/// Uploads a package to a registry
pub trait RegistryClient {
  fn publish(&mut self, package: &str, version: &str, registry: &Registry) -> ReleaseResult<PublishOutcome>;
}

/// `cargo publish` in the workspace root
pub struct CargoPublisher {
  workspace_root: PathBuf,
  dry_run: bool,
}

impl CargoPublisher {
  pub fn new(workspace_root: PathBuf, dry_run: bool) -> Self {
    Self { workspace_root, dry_run }
  }

  /// Arguments after `cargo`
  pub fn publish_args(&self, package: &str, registry: &Registry) -> Vec<String> {
    let mut args = vec![
      "publish".to_string(),
      "--registry".to_string(),
      registry.name.clone(),
      "-p".to_string(),
      package.to_string(),
    ];
    // Rewritten manifests are uncommitted by construction
    if !registry.is_default {
      args.push("--allow-dirty".to_string());
    }
    if self.dry_run {
      args.push("--dry-run".to_string());
    }
    args
  }
}

impl RegistryClient for CargoPublisher {
  fn publish(&mut self, package: &str, version: &str, registry: &Registry) -> ReleaseResult<PublishOutcome> {
    let args = self.publish_args(package, registry);
    let command = format!("cargo {}", args.join(" "));
    log::info!("Running {}", command);

    let output = Command::new("cargo")
      .args(&args)
      .current_dir(&self.workspace_root)
      .output()
      .with_context(|| format!("Failed to run {}", command))?;

    if !output.status.success() {
      let mut captured = String::from_utf8_lossy(&output.stdout).to_string();
      captured.push_str(&String::from_utf8_lossy(&output.stderr));
      return Err(
        PublishError {
          package: package.to_string(),
          version: version.to_string(),
          registry: registry.name.clone(),
          command,
          exit_code: output.status.code(),
          output: captured,
        }
        .into(),
      );
    }

    let (package, version, registry) = (package.to_string(), version.to_string(), registry.name.clone());
    Ok(if self.dry_run {
      PublishOutcome::DryRun {
        package,
        version,
        registry,
      }
    } else {
      PublishOutcome::Published {
        package,
        version,
        registry,
      }
    })
  }
}
