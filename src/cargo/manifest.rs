//! Lossless Cargo.toml editing
//!
//! Only the fields a release touches are rewritten; comments, ordering and
//! formatting of everything else survive because edits go through `toml_edit`.

use crate::core::error::{MetadataReadError, ReleaseError, ReleaseResult, ResultExt};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use toml_edit::{DocumentMut, InlineTable, Item, TableLike, Value};

/// Dependency tables whose workspace entries must resolve on the publish registry
const PUBLISHED_DEP_SECTIONS: [&str; 2] = ["dependencies", "build-dependencies"];

/// Where a rewritten dependency entry should point
#[derive(Debug, Clone, Copy)]
pub struct DependencyTarget<'a> {
  /// Version requirement, e.g. `=1.2.0`
  pub requirement: &'a str,
  /// Registry name, `None` to leave the registry pointer alone
  pub registry: Option<&'a str>,
}

/// A parsed manifest tied to its file
pub struct ManifestDocument {
  path: PathBuf,
  doc: DocumentMut,
}

impl ManifestDocument {
  pub fn load(path: &Path) -> ReleaseResult<Self> {
    let content =
      fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let doc = content.parse::<DocumentMut>().map_err(|e| MetadataReadError::Manifest {
      path: path.to_path_buf(),
      reason: e.to_string(),
    })?;
    Ok(Self {
      path: path.to_path_buf(),
      doc,
    })
  }

  pub fn save(&self) -> ReleaseResult<()> {
    fs::write(&self.path, self.doc.to_string()).with_context(|| format!("Failed to write {}", self.path.display()))
  }

  #[cfg(test)]
  pub fn document(&self) -> &DocumentMut {
    &self.doc
  }

  /// Set `package.version`, replacing a `version.workspace = true` inheritance
  pub fn set_package_version(&mut self, version: &str) -> ReleaseResult<()> {
    let package = self
      .doc
      .get_mut("package")
      .and_then(|p| p.as_table_like_mut())
      .ok_or_else(|| invalid(&self.path, "missing [package] table"))?;
    package.insert("version", toml_edit::value(version));
    Ok(())
  }

  /// Set `workspace.package.version`
  pub fn set_workspace_package_version(&mut self, version: &str) -> ReleaseResult<()> {
    let package = self
      .doc
      .get_mut("workspace")
      .and_then(|w| w.as_table_like_mut())
      .and_then(|w| w.get_mut("package"))
      .and_then(|p| p.as_table_like_mut())
      .ok_or_else(|| invalid(&self.path, "missing [workspace.package] table"))?;
    package.insert("version", toml_edit::value(version));
    Ok(())
  }

  /// Whether `package.version` is `{ workspace = true }`
  pub fn inherits_workspace_version(&self) -> bool {
    self
      .doc
      .get("package")
      .and_then(|p| p.as_table_like())
      .and_then(|p| p.get("version"))
      .and_then(|v| v.as_table_like())
      .is_some_and(is_workspace_inherited)
  }

  /// Point every `[workspace.dependencies]` entry naming one of `siblings` at `target`.
  /// Returns the number of rewritten entries.
  pub fn retarget_workspace_dependencies(&mut self, siblings: &HashSet<String>, target: DependencyTarget<'_>) -> usize {
    match self
      .doc
      .get_mut("workspace")
      .and_then(|w| w.as_table_like_mut())
      .and_then(|w| w.get_mut("dependencies"))
      .and_then(|d| d.as_table_like_mut())
    {
      Some(deps) => retarget_table(deps, siblings, target),
      None => 0,
    }
  }

  /// Point direct (non-inherited) sibling dependencies of a member manifest at
  /// `target`, including `[target.'cfg(..)'.*]` tables. Dev-dependencies are
  /// left alone since they never reach the registry.
  pub fn retarget_member_dependencies(&mut self, siblings: &HashSet<String>, target: DependencyTarget<'_>) -> usize {
    let mut count = 0;

    for section in PUBLISHED_DEP_SECTIONS {
      if let Some(deps) = self.doc.get_mut(section).and_then(|d| d.as_table_like_mut()) {
        count += retarget_table(deps, siblings, target);
      }
    }

    if let Some(targets) = self.doc.get_mut("target").and_then(|t| t.as_table_like_mut()) {
      let platforms: Vec<String> = targets.iter().map(|(k, _)| k.to_string()).collect();
      for platform in platforms {
        let Some(platform_table) = targets.get_mut(&platform).and_then(|t| t.as_table_like_mut()) else {
          continue;
        };
        for section in PUBLISHED_DEP_SECTIONS {
          if let Some(deps) = platform_table.get_mut(section).and_then(|d| d.as_table_like_mut()) {
            count += retarget_table(deps, siblings, target);
          }
        }
      }
    }

    count
  }
}

fn invalid(path: &Path, reason: &str) -> ReleaseError {
  MetadataReadError::Manifest {
    path: path.to_path_buf(),
    reason: reason.to_string(),
  }
  .into()
}

fn retarget_table(deps: &mut dyn TableLike, siblings: &HashSet<String>, target: DependencyTarget<'_>) -> usize {
  let dep_keys: Vec<String> = deps.iter().map(|(k, _)| k.to_string()).collect();
  let mut count = 0;

  for key in dep_keys {
    let Some(entry) = deps.get_mut(&key) else {
      continue;
    };
    if !siblings.contains(&package_name(&key, entry)) {
      continue;
    }

    if entry.is_str() {
      // `foo = "1.0"` has no room for a registry key
      let mut table = InlineTable::new();
      table.insert("version", Value::from(target.requirement));
      if let Some(registry) = target.registry {
        table.insert("registry", Value::from(registry));
      }
      *entry = Item::Value(Value::InlineTable(table));
      count += 1;
      continue;
    }

    if let Some(table) = entry.as_table_like_mut() {
      if is_workspace_inherited(&*table) {
        continue;
      }
      table.insert("version", toml_edit::value(target.requirement));
      if let Some(registry) = target.registry {
        table.insert("registry", toml_edit::value(registry));
      }
      count += 1;
    }
  }

  count
}

/// Real package name of a dependency entry, honouring `package = "..."` renames
fn package_name(key: &str, entry: &Item) -> String {
  entry
    .as_table_like()
    .and_then(|t| t.get("package"))
    .and_then(|p| p.as_str())
    .unwrap_or(key)
    .to_string()
}

fn is_workspace_inherited(table: &dyn TableLike) -> bool {
  table.get("workspace").and_then(|w| w.as_bool()) == Some(true)
}
