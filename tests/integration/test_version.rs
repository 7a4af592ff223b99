//! Tests for the `version` command

use crate::helpers::*;
use anyhow::Result;

fn two_crate_workspace() -> Result<TestWorkspace> {
  let ws = TestWorkspace::new()?;
  ws.add_crate("bar", &[])?;
  ws.add_crate("foo", &["bar"])?;
  ws.commit("Add bar and foo")?;
  Ok(ws)
}

#[test]
fn test_version_lists_packages() -> Result<()> {
  let ws = two_crate_workspace()?;

  let output = run_publish_gate(&ws.path, &["publish-gate", "version"])?;
  let stdout = String::from_utf8_lossy(&output.stdout);

  assert!(stdout.contains("bar 0.1.0"), "got: {}", stdout);
  assert!(stdout.contains("foo 0.1.0"), "got: {}", stdout);
  Ok(())
}

#[test]
fn test_version_of_one_package() -> Result<()> {
  let ws = two_crate_workspace()?;

  let output = run_publish_gate(&ws.path, &["publish-gate", "version", "foo"])?;
  assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "0.1.0");

  let output = run_publish_gate_raw(&ws.path, &["publish-gate", "version", "ghost"])?;
  assert_eq!(output.status.code(), Some(1));
  assert!(String::from_utf8_lossy(&output.stderr).contains("Package 'ghost' not found"));
  Ok(())
}

#[test]
fn test_derived_version_from_tags() -> Result<()> {
  let ws = two_crate_workspace()?;
  git(&ws.path, &["tag", "v1.2.0"])?;
  git(&ws.path, &["commit", "--allow-empty", "-m", "one"])?;
  git(&ws.path, &["commit", "--allow-empty", "-m", "two"])?;

  let output = run_publish_gate(&ws.path, &["publish-gate", "version", "--derived"])?;
  let version = String::from_utf8_lossy(&output.stdout).trim().to_string();

  assert!(version.starts_with("1.2.0-2.g"), "got: {}", version);
  Ok(())
}

#[test]
fn test_derived_version_without_tags_fails() -> Result<()> {
  let ws = two_crate_workspace()?;

  let output = run_publish_gate_raw(&ws.path, &["publish-gate", "version", "--derived"])?;
  let stderr = String::from_utf8_lossy(&output.stderr);

  assert_eq!(output.status.code(), Some(2));
  assert!(stderr.contains("No tags found"), "got: {}", stderr);
  assert!(stderr.contains("💡 Help:"), "got: {}", stderr);
  Ok(())
}

#[test]
fn test_version_set_updates_workspace() -> Result<()> {
  let ws = two_crate_workspace()?;

  run_publish_gate(&ws.path, &["publish-gate", "version", "set", "0.2.0"])?;

  let root: toml_edit::DocumentMut = ws.read_file("Cargo.toml")?.parse()?;
  assert_eq!(root["workspace"]["package"]["version"].as_str(), Some("0.2.0"));
  assert_eq!(root["workspace"]["dependencies"]["bar"]["version"].as_str(), Some("0.2.0"));
  assert_eq!(root["workspace"]["dependencies"]["foo"]["version"].as_str(), Some("0.2.0"));

  let output = run_publish_gate(&ws.path, &["publish-gate", "version", "foo"])?;
  assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "0.2.0");
  Ok(())
}

#[test]
fn test_version_set_single_package() -> Result<()> {
  let ws = two_crate_workspace()?;

  run_publish_gate(&ws.path, &["publish-gate", "version", "set", "0.3.0-rc.1", "-p", "bar"])?;

  let bar: toml_edit::DocumentMut = ws.read_file("crates/bar/Cargo.toml")?.parse()?;
  assert_eq!(bar["package"]["version"].as_str(), Some("0.3.0-rc.1"));

  let root: toml_edit::DocumentMut = ws.read_file("Cargo.toml")?.parse()?;
  assert_eq!(root["workspace"]["package"]["version"].as_str(), Some("0.1.0"));
  assert_eq!(root["workspace"]["dependencies"]["bar"]["version"].as_str(), Some("0.3.0-rc.1"));
  assert_eq!(root["workspace"]["dependencies"]["foo"]["version"].as_str(), Some("0.1.0"));
  Ok(())
}

#[test]
fn test_version_set_rejects_invalid_semver() -> Result<()> {
  let ws = two_crate_workspace()?;

  let output = run_publish_gate_raw(&ws.path, &["publish-gate", "version", "set", "one.two"])?;
  assert_eq!(output.status.code(), Some(1));
  assert!(ws.changed_files()?.is_empty());
  Ok(())
}
