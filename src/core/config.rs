use crate::core::error::{ConfigError, ReleaseResult, ResultExt};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration for cargo-publish-gate
/// Searched in order: publish-gate.toml, .publish-gate.toml, .cargo/publish-gate.toml, .config/publish-gate.toml
///
/// Every section is optional; a workspace without a config file gets the defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GateConfig {
  #[serde(default)]
  pub publish: PublishConfig,
  #[serde(default)]
  pub registries: BTreeMap<String, RegistryConfig>,
  #[serde(default)]
  pub build: BuildConfig,
}

/// Publishing behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishConfig {
  /// Registry treated as the default (no manifest rewriting, committed versions)
  #[serde(default = "default_registry")]
  pub default_registry: String,

  /// Fixed publish order. When empty the order is computed from the dependency graph.
  #[serde(default)]
  pub order: Vec<String>,

  /// User-Agent sent to registry indexes
  #[serde(default = "default_user_agent")]
  pub user_agent: String,
}

fn default_registry() -> String {
  crate::registry::DEFAULT_REGISTRY.to_string()
}

fn default_user_agent() -> String {
  format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
}

impl Default for PublishConfig {
  fn default() -> Self {
    Self {
      default_registry: default_registry(),
      order: Vec::new(),
      user_agent: default_user_agent(),
    }
  }
}

/// A named registry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
  /// Sparse index URL, with or without the `sparse+` prefix
  pub index: String,
}

/// Provider artifact build settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
  /// Providers built by `build all`
  #[serde(default)]
  pub providers: Vec<String>,

  /// Workspace holding the `{name}-provider` packages, relative to the root
  #[serde(default = "default_providers_dir")]
  pub providers_dir: PathBuf,

  /// Output directory for optimized artifacts, relative to the root
  #[serde(default = "default_artifacts_dir")]
  pub artifacts_dir: PathBuf,

  /// Compilation target triple
  #[serde(default = "default_target")]
  pub target: String,
}

fn default_providers_dir() -> PathBuf {
  PathBuf::from("providers")
}

fn default_artifacts_dir() -> PathBuf {
  PathBuf::from("artifacts")
}

fn default_target() -> String {
  "wasm32-unknown-unknown".to_string()
}

impl Default for BuildConfig {
  fn default() -> Self {
    Self {
      providers: Vec::new(),
      providers_dir: default_providers_dir(),
      artifacts_dir: default_artifacts_dir(),
      target: default_target(),
    }
  }
}

impl GateConfig {
  /// Find config file in search order: publish-gate.toml, .publish-gate.toml, .cargo/publish-gate.toml, .config/publish-gate.toml
  pub fn find_config_path(path: &Path) -> Option<PathBuf> {
    let candidates = vec![
      path.join("publish-gate.toml"),
      path.join(".publish-gate.toml"),
      path.join(".cargo").join("publish-gate.toml"),
      path.join(".config").join("publish-gate.toml"),
    ];

    candidates.into_iter().find(|p| p.exists())
  }

  /// Load config if present, defaults otherwise
  pub fn load(path: &Path) -> ReleaseResult<Self> {
    let Some(config_path) = Self::find_config_path(path) else {
      log::debug!("No publish-gate config found under {}, using defaults", path.display());
      return Ok(Self::default());
    };

    let content = fs::read_to_string(&config_path)
      .with_context(|| format!("Failed to read config from {}", config_path.display()))?;
    let config: GateConfig = toml_edit::de::from_str(&content).map_err(|e| ConfigError::Invalid {
      path: config_path.clone(),
      reason: e.to_string(),
    })?;

    config.validate(&config_path)?;
    log::debug!("Loaded config from {}", config_path.display());
    Ok(config)
  }

  fn validate(&self, path: &Path) -> ReleaseResult<()> {
    if self.publish.default_registry.trim().is_empty() {
      return Err(
        ConfigError::Invalid {
          path: path.to_path_buf(),
          reason: "publish.default_registry must not be empty".to_string(),
        }
        .into(),
      );
    }

    for (name, registry) in &self.registries {
      if registry.index.trim().is_empty() {
        return Err(
          ConfigError::Invalid {
            path: path.to_path_buf(),
            reason: format!("registries.{}.index must not be empty", name),
          }
          .into(),
        );
      }
    }

    Ok(())
  }

  /// Configured index for a registry, if any
  pub fn registry_index(&self, name: &str) -> Option<&str> {
    self.registries.get(name).map(|r| r.index.as_str())
  }
}
