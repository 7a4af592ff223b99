//! Precondition checks for helper executables
//!
//! Runs before any workflow starts so a missing tool fails fast instead of
//! half-way through a publish.

use crate::core::error::{ConfigError, ReleaseResult};
use serde::Serialize;
use std::path::PathBuf;

/// Tools every publish run shells out to
pub const PUBLISH_TOOLS: &[&str] = &["git", "cargo"];

/// Result of looking up one executable
#[derive(Debug, Clone, Serialize)]
pub struct ToolCheck {
  pub name: String,
  pub path: Option<PathBuf>,
}

impl ToolCheck {
  pub fn found(&self) -> bool {
    self.path.is_some()
  }
}

/// Look up each tool on PATH without failing
pub fn check_tools(tools: &[&str]) -> Vec<ToolCheck> {
  tools
    .iter()
    .map(|name| {
      let path = which::which(name).ok();
      log::debug!("Tool {} -> {:?}", name, path);
      ToolCheck {
        name: name.to_string(),
        path,
      }
    })
    .collect()
}

/// Fail on the first tool that is not on PATH
pub fn require_tools(tools: &[&str]) -> ReleaseResult<()> {
  for check in check_tools(tools) {
    if !check.found() {
      return Err(ConfigError::ToolMissing { tool: check.name }.into());
    }
  }
  Ok(())
}
