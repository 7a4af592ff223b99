//! Package registries: naming, index lookup and publishing
//!
//! - **index**: sparse index queries (what versions already exist)
//! - **publisher**: `cargo publish` invocation

pub mod index;
pub mod publisher;

use crate::core::config::GateConfig;
use crate::core::error::{ConfigError, ReleaseResult, ResultExt};
use std::fs;
use std::path::Path;

/// Canonical default registry name
pub const DEFAULT_REGISTRY: &str = "crates-io";

/// A registry resolved for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registry {
  pub name: String,
  /// HTTP(S) base of the sparse index, without `sparse+` or trailing slash
  pub index_url: String,
  /// Default registries publish committed versions without manifest rewriting
  pub is_default: bool,
}

impl Registry {
  /// Resolve a registry by name using the process environment
  pub fn resolve(name: &str, config: &GateConfig, workspace_root: &Path) -> ReleaseResult<Self> {
    Self::resolve_with_env(name, config, workspace_root, |key| std::env::var(key).ok())
  }

  /// Resolve a registry by name. The index URL comes from, in order:
  /// publish-gate config, the crates.io default, `CARGO_REGISTRIES_<NAME>_INDEX`,
  /// and `[registries.<name>]` in the workspace's `.cargo/config.toml`.
  pub fn resolve_with_env<F>(name: &str, config: &GateConfig, workspace_root: &Path, env: F) -> ReleaseResult<Self>
  where
    F: Fn(&str) -> Option<String>,
  {
    let raw_index = match config.registry_index(name) {
      Some(index) => index.to_string(),
      None if name == DEFAULT_REGISTRY => index::CRATES_IO_INDEX_URL.to_string(),
      None => match env(&env_key(name)) {
        Some(index) => index,
        None => cargo_config_index(workspace_root, name)?.ok_or_else(|| ConfigError::MissingIndex {
          registry: name.to_string(),
        })?,
      },
    };

    let index_url = normalize_index(name, &raw_index)?;
    log::debug!("Registry {} uses index {}", name, index_url);

    Ok(Self {
      name: name.to_string(),
      index_url,
      is_default: name == config.publish.default_registry,
    })
  }
}

/// Environment variable cargo reads for a named registry's index
fn env_key(name: &str) -> String {
  format!("CARGO_REGISTRIES_{}_INDEX", name.to_uppercase().replace('-', "_"))
}

fn cargo_config_index(workspace_root: &Path, name: &str) -> ReleaseResult<Option<String>> {
  let candidates = [
    workspace_root.join(".cargo").join("config.toml"),
    workspace_root.join(".cargo").join("config"),
  ];

  for path in candidates.iter().filter(|p| p.exists()) {
    let content = fs::read_to_string(path).context(format!("Failed to read {}", path.display()))?;
    let doc = content
      .parse::<toml_edit::DocumentMut>()
      .map_err(|e| ConfigError::Invalid {
        path: path.clone(),
        reason: e.to_string(),
      })?;

    if let Some(index) = doc
      .get("registries")
      .and_then(|r| r.get(name))
      .and_then(|r| r.get("index"))
      .and_then(|i| i.as_str())
    {
      return Ok(Some(index.to_string()));
    }
  }

  Ok(None)
}

fn normalize_index(name: &str, raw: &str) -> ReleaseResult<String> {
  let url = raw.trim().strip_prefix("sparse+").unwrap_or(raw.trim());
  if !(url.starts_with("https://") || url.starts_with("http://")) {
    return Err(
      ConfigError::UnsupportedIndex {
        registry: name.to_string(),
        index: raw.to_string(),
      }
      .into(),
    );
  }
  Ok(url.trim_end_matches('/').to_string())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::core::config::RegistryConfig;
  use crate::core::error::ReleaseError;
  use tempfile::TempDir;

  fn no_env(_: &str) -> Option<String> {
    None
  }

  #[test]
  fn test_crates_io_is_default() {
    let dir = TempDir::new().unwrap();
    let registry = Registry::resolve_with_env("crates-io", &GateConfig::default(), dir.path(), no_env).unwrap();
    assert!(registry.is_default);
    assert_eq!(registry.index_url, "https://index.crates.io");
  }

  #[test]
  fn test_config_index_wins() {
    let dir = TempDir::new().unwrap();
    let mut config = GateConfig::default();
    config.registries.insert(
      "staging".to_string(),
      RegistryConfig {
        index: "sparse+https://registry.example.com/index/".to_string(),
      },
    );

    let registry = Registry::resolve_with_env("staging", &config, dir.path(), |_| {
      Some("https://from-env.example.com".to_string())
    })
    .unwrap();
    assert!(!registry.is_default);
    assert_eq!(registry.index_url, "https://registry.example.com/index");
  }

  #[test]
  fn test_unreadable_cargo_config_names_the_file() {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join(".cargo/config.toml")).unwrap();

    let err = Registry::resolve_with_env("staging", &GateConfig::default(), dir.path(), no_env).unwrap_err();
    assert!(matches!(err, ReleaseError::Io(_)));
    let message = err.to_string();
    assert!(message.starts_with("I/O error: Failed to read"), "{}", message);
    assert!(message.contains(".cargo/config.toml"), "{}", message);
  }

  #[test]
  fn test_env_then_cargo_config() {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join(".cargo")).unwrap();
    fs::write(
      dir.path().join(".cargo/config.toml"),
      "[registries.my-reg]\nindex = \"sparse+https://cargo-config.example.com/\"\n",
    )
    .unwrap();

    let from_env = Registry::resolve_with_env("my-reg", &GateConfig::default(), dir.path(), |key| {
      (key == "CARGO_REGISTRIES_MY_REG_INDEX").then(|| "sparse+https://env.example.com".to_string())
    })
    .unwrap();
    assert_eq!(from_env.index_url, "https://env.example.com");

    let from_file = Registry::resolve_with_env("my-reg", &GateConfig::default(), dir.path(), no_env).unwrap();
    assert_eq!(from_file.index_url, "https://cargo-config.example.com");
  }

  #[test]
  fn test_missing_and_git_indexes_are_config_errors() {
    let dir = TempDir::new().unwrap();
    let err = Registry::resolve_with_env("staging", &GateConfig::default(), dir.path(), no_env).unwrap_err();
    assert!(matches!(err, ReleaseError::Config(ConfigError::MissingIndex { .. })));

    let err = Registry::resolve_with_env("staging", &GateConfig::default(), dir.path(), |_| {
      Some("ssh://git@example.com/index.git".to_string())
    })
    .unwrap_err();
    assert!(matches!(err, ReleaseError::Config(ConfigError::UnsupportedIndex { .. })));
  }

  #[test]
  fn test_custom_default_registry() {
    let dir = TempDir::new().unwrap();
    let mut config = GateConfig::default();
    config.publish.default_registry = "internal".to_string();

    let registry = Registry::resolve_with_env("internal", &config, dir.path(), |_| {
      Some("https://internal.example.com".to_string())
    })
    .unwrap();
    assert!(registry.is_default);
  }
}
