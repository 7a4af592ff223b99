//! Tests for the `order` command

use crate::helpers::*;
use anyhow::Result;

#[test]
fn test_order_follows_dependencies() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.add_crate("core", &[])?;
  ws.add_crate("app", &["mid"])?;
  ws.add_crate("mid", &["core"])?;
  ws.commit("Add crates")?;

  let output = run_publish_gate(&ws.path, &["publish-gate", "order", "--json"])?;
  let order: Vec<String> = serde_json::from_slice(&output.stdout)?;

  assert_eq!(order, vec!["core", "mid", "app"]);
  Ok(())
}

#[test]
fn test_order_skips_unpublishable_packages() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.add_crate("lib", &[])?;
  ws.add_crate("internal", &[])?;
  let manifest = ws.read_file("crates/internal/Cargo.toml")?;
  ws.write_file(
    "crates/internal/Cargo.toml",
    &manifest.replace("[package]\n", "[package]\npublish = false\n"),
  )?;
  ws.commit("Add crates")?;

  let output = run_publish_gate(&ws.path, &["publish-gate", "order", "--json"])?;
  let order: Vec<String> = serde_json::from_slice(&output.stdout)?;

  assert_eq!(order, vec!["lib"]);
  Ok(())
}

#[test]
fn test_configured_order_is_used() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.add_crate("alpha", &[])?;
  ws.add_crate("beta", &[])?;
  ws.write_file("publish-gate.toml", "[publish]\norder = [\"beta\", \"alpha\"]\n")?;
  ws.commit("Add crates")?;

  let output = run_publish_gate(&ws.path, &["publish-gate", "order"])?;
  let stdout = String::from_utf8_lossy(&output.stdout);

  assert!(stdout.contains("(configured)"), "got: {}", stdout);
  assert!(stdout.contains("1. beta"), "got: {}", stdout);
  assert!(stdout.contains("2. alpha"), "got: {}", stdout);
  Ok(())
}

#[test]
fn test_configured_order_before_dependency_is_rejected() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.add_crate("core", &[])?;
  ws.add_crate("app", &["core"])?;
  ws.write_file("publish-gate.toml", "[publish]\norder = [\"app\", \"core\"]\n")?;
  ws.commit("Add crates")?;

  let output = run_publish_gate_raw(&ws.path, &["publish-gate", "order"])?;
  let stderr = String::from_utf8_lossy(&output.stderr);

  assert_eq!(output.status.code(), Some(1));
  assert!(stderr.contains("Invalid publish order"), "got: {}", stderr);
  Ok(())
}
