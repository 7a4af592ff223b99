//! Tests for the `publish` command
//!
//! No test reaches a real registry: alternate registries point at a closed
//! local port, so runs stop at the first index query.

use crate::helpers::*;
use anyhow::Result;

const UNREACHABLE_REGISTRY: &str = "[registries.staging]\nindex = \"sparse+http://127.0.0.1:9\"\n";

fn tagged_workspace() -> Result<TestWorkspace> {
  let ws = TestWorkspace::new()?;
  ws.add_crate("bar", &[])?;
  ws.add_crate("foo", &["bar"])?;
  ws.write_file("publish-gate.toml", UNREACHABLE_REGISTRY)?;
  ws.commit("Add crates")?;
  git(&ws.path, &["tag", "v0.2.0"])?;
  Ok(ws)
}

#[test]
fn test_unreachable_index_leaves_manifests_untouched() -> Result<()> {
  let ws = tagged_workspace()?;
  let root_before = ws.read_file("Cargo.toml")?;
  let foo_before = ws.read_file("crates/foo/Cargo.toml")?;

  let output = run_publish_gate_raw(&ws.path, &["publish-gate", "publish", "-r", "staging", "--dry-run"])?;
  let stdout = String::from_utf8_lossy(&output.stdout);
  let stderr = String::from_utf8_lossy(&output.stderr);

  assert_eq!(output.status.code(), Some(2), "stderr: {}", stderr);
  assert!(stdout.contains("Release version for staging: 0.2.0"), "got: {}", stdout);
  assert!(stderr.contains("http://127.0.0.1:9/3/b/bar"), "got: {}", stderr);

  assert_eq!(ws.read_file("Cargo.toml")?, root_before);
  assert_eq!(ws.read_file("crates/foo/Cargo.toml")?, foo_before);
  assert!(ws.changed_files()?.is_empty());
  Ok(())
}

#[test]
fn test_dirty_manifest_is_refused() -> Result<()> {
  let ws = tagged_workspace()?;
  let manifest = format!("{}# local edit\n", ws.read_file("crates/foo/Cargo.toml")?);
  ws.write_file("crates/foo/Cargo.toml", &manifest)?;

  let output = run_publish_gate_raw(&ws.path, &["publish-gate", "publish", "-r", "staging"])?;
  let stderr = String::from_utf8_lossy(&output.stderr);

  assert_eq!(output.status.code(), Some(2));
  assert!(stderr.contains("uncommitted changes"), "got: {}", stderr);
  assert!(stderr.contains("crates/foo/Cargo.toml"), "got: {}", stderr);
  assert_eq!(ws.read_file("crates/foo/Cargo.toml")?, manifest);
  Ok(())
}

#[test]
fn test_unconfigured_registry_is_user_error() -> Result<()> {
  let ws = tagged_workspace()?;

  let output = run_publish_gate_raw(&ws.path, &["publish-gate", "publish", "-r", "nowhere"])?;
  let stderr = String::from_utf8_lossy(&output.stderr);

  assert_eq!(output.status.code(), Some(1));
  assert!(stderr.contains("No index URL configured for registry 'nowhere'"), "got: {}", stderr);
  assert!(stderr.contains("[registries.nowhere]"), "got: {}", stderr);
  Ok(())
}

#[test]
fn test_unknown_package_is_user_error() -> Result<()> {
  let ws = tagged_workspace()?;

  let output = run_publish_gate_raw(&ws.path, &["publish-gate", "publish", "-p", "ghost", "-r", "staging"])?;
  let stderr = String::from_utf8_lossy(&output.stderr);

  assert_eq!(output.status.code(), Some(1));
  assert!(stderr.contains("Package 'ghost' not found"), "got: {}", stderr);
  Ok(())
}

#[test]
fn test_alternate_registry_without_tags_fails_before_rewrite() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.add_crate("bar", &[])?;
  ws.write_file("publish-gate.toml", UNREACHABLE_REGISTRY)?;
  ws.commit("Add bar")?;

  let output = run_publish_gate_raw(&ws.path, &["publish-gate", "publish", "-r", "staging"])?;
  let stderr = String::from_utf8_lossy(&output.stderr);

  assert_eq!(output.status.code(), Some(2));
  assert!(stderr.contains("No tags found"), "got: {}", stderr);
  assert!(ws.changed_files()?.is_empty());
  Ok(())
}
