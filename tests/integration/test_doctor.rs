//! Tests for the `doctor` command

use crate::helpers::*;
use anyhow::Result;
use serde_json::Value;
use tempfile::TempDir;

fn checks(stdout: &[u8]) -> Result<Vec<Value>> {
  let value: Value = serde_json::from_slice(stdout)?;
  Ok(value.as_array().cloned().unwrap_or_default())
}

fn find<'a>(checks: &'a [Value], name: &str) -> Option<&'a Value> {
  checks.iter().find(|c| c["name"] == name)
}

#[test]
fn test_doctor_outside_workspace_exits_with_user_error() -> Result<()> {
  let dir = TempDir::new()?;

  let output = run_publish_gate_raw(dir.path(), &["publish-gate", "doctor", "--json"])?;
  assert_eq!(output.status.code(), Some(1));

  let checks = checks(&output.stdout)?;
  for check in &checks {
    assert!(check["name"].is_string());
    assert!(check["passed"].is_boolean());
    assert!(check["required"].is_boolean());
    assert!(check["message"].is_string());
    assert!(check.get("suggestion").is_some());
  }

  let workspace = find(&checks, "workspace").expect("workspace check");
  assert_eq!(workspace["passed"], false);
  assert_eq!(workspace["required"], true);
  assert!(find(&checks, "tool:git").is_some());
  Ok(())
}

#[test]
fn test_doctor_on_healthy_workspace_passes() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.add_crate("bar", &[])?;
  ws.add_crate("foo", &["bar"])?;
  ws.commit("Add crates")?;

  let output = run_publish_gate(&ws.path, &["publish-gate", "doctor", "--json"])?;
  let checks = checks(&output.stdout)?;

  let order = find(&checks, "publish order").expect("publish order check");
  assert_eq!(order["message"], "bar → foo");
  assert_eq!(find(&checks, "dependency requirements").expect("requirements check")["passed"], true);
  assert_eq!(find(&checks, "registry:crates-io").expect("registry check")["message"], "https://index.crates.io");

  // No tags yet: reported, but advisory
  let derived = find(&checks, "derived version").expect("derived version check");
  assert_eq!(derived["passed"], false);
  assert_eq!(derived["required"], false);
  Ok(())
}

#[test]
fn test_doctor_reports_every_check_in_text_mode() -> Result<()> {
  let dir = TempDir::new()?;

  let output = run_publish_gate_raw(dir.path(), &["publish-gate", "doctor"])?;
  let stdout = String::from_utf8_lossy(&output.stdout);

  assert_eq!(output.status.code(), Some(1));
  assert!(stdout.contains("tool:cargo"), "got: {}", stdout);
  assert!(stdout.contains("❌ workspace"), "got: {}", stdout);
  assert!(stdout.contains("Critical issues found"), "got: {}", stdout);
  Ok(())
}
