//! Health check command for diagnosing publish problems
//!
//! Runs every precondition the publish and build commands rely on and reports
//! them together, instead of failing on the first one.

use crate::cargo::metadata::WorkspaceMetadata;
use crate::core::config::GateConfig;
use crate::core::error::{ExitCode, ReleaseResult};
use crate::core::preflight;
use crate::core::vcs::SystemGit;
use crate::graph::resolve_publish_order;
use crate::registry::Registry;
use crate::release::version::derive_version;
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Serialize)]
struct CheckResult {
  name: String,
  passed: bool,
  /// Failing required checks make doctor exit non-zero
  required: bool,
  message: String,
  suggestion: Option<String>,
}

impl CheckResult {
  fn pass(name: &str, message: impl Into<String>) -> Self {
    Self {
      name: name.to_string(),
      passed: true,
      required: true,
      message: message.into(),
      suggestion: None,
    }
  }

  fn fail(name: &str, message: impl Into<String>, suggestion: Option<String>) -> Self {
    Self {
      name: name.to_string(),
      passed: false,
      required: true,
      message: message.into(),
      suggestion,
    }
  }

  fn optional(mut self) -> Self {
    self.required = false;
    self
  }
}

/// Run the doctor command
pub fn run_doctor(start: &Path, json: bool) -> ReleaseResult<()> {
  let results = collect_checks(start);

  if json {
    println!("{}", serde_json::to_string_pretty(&results)?);
  } else {
    println!("🏥 Running publish-gate checks...\n");
    for result in &results {
      let icon = match (result.passed, result.required) {
        (true, _) => "✅",
        (false, true) => "❌",
        (false, false) => "⚠️ ",
      };
      println!("{} {}: {}", icon, result.name, result.message);
      if let Some(ref suggestion) = result.suggestion {
        println!("   💡 Fix: {}", suggestion);
      }
    }

    let passed_count = results.iter().filter(|r| r.passed).count();
    println!("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("Summary: {}/{} checks passed", passed_count, results.len());
  }

  if results.iter().any(|r| r.required && !r.passed) {
    if !json {
      println!("\n⚠️  Critical issues found. Please fix errors before publishing.");
    }
    std::process::exit(ExitCode::User.as_i32());
  }

  if !json {
    println!("\n✨ All required checks passed.");
  }
  Ok(())
}

fn collect_checks(start: &Path) -> Vec<CheckResult> {
  let mut results = Vec::new();

  for tool in preflight::check_tools(&["git", "cargo", "wasm-opt"]) {
    let name = format!("tool:{}", tool.name);
    let check = match &tool.path {
      Some(path) => CheckResult::pass(&name, path.display().to_string()),
      None => CheckResult::fail(
        &name,
        "not found on PATH",
        Some(format!("Install `{}`", tool.name)),
      ),
    };
    // wasm-opt is only needed for release provider builds
    results.push(if tool.name == "wasm-opt" { check.optional() } else { check });
  }

  let metadata = match WorkspaceMetadata::load(start) {
    Ok(metadata) => {
      results.push(CheckResult::pass(
        "workspace",
        format!(
          "{} package(s), {} publishable",
          metadata.packages.len(),
          metadata.publishable().count()
        ),
      ));
      metadata
    }
    Err(e) => {
      results.push(CheckResult::fail("workspace", e.to_string(), e.help_message()));
      return results;
    }
  };

  let config = match GateConfig::load(&metadata.root) {
    Ok(config) => {
      let source = GateConfig::find_config_path(&metadata.root)
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "defaults (no config file)".to_string());
      results.push(CheckResult::pass("config", source));
      config
    }
    Err(e) => {
      results.push(CheckResult::fail("config", e.to_string(), e.help_message()));
      GateConfig::default()
    }
  };

  results.push(match resolve_publish_order(&metadata, &config.publish.order) {
    Ok(order) => CheckResult::pass("publish order", order.join(" → ")),
    Err(e) => CheckResult::fail("publish order", e.to_string(), e.help_message()),
  });

  results.push(check_sibling_requirements(&metadata));

  let mut registries: Vec<String> = config.registries.keys().cloned().collect();
  if !registries.contains(&config.publish.default_registry) {
    registries.insert(0, config.publish.default_registry.clone());
  }
  for name in registries {
    let check_name = format!("registry:{}", name);
    results.push(match Registry::resolve(&name, &config, &metadata.root) {
      Ok(registry) => CheckResult::pass(&check_name, registry.index_url),
      Err(e) => CheckResult::fail(&check_name, e.to_string(), e.help_message()),
    });
  }

  // Only alternate-registry releases need tags, so this one is advisory
  let describe = SystemGit::open(&metadata.root).and_then(|git| git.describe_tags());
  results.push(
    match describe.and_then(|d| derive_version(&d)) {
      Ok(version) => CheckResult::pass("derived version", version),
      Err(e) => CheckResult::fail("derived version", e.to_string(), None),
    }
    .optional(),
  );

  results
}

/// `cargo publish` rejects path-only dependencies, so every published edge
/// between publishable packages needs a version requirement
fn check_sibling_requirements(metadata: &WorkspaceMetadata) -> CheckResult {
  let mut missing = Vec::new();
  let mut pinned = 0;

  for package in metadata.publishable() {
    for edge in package.dependencies.iter().filter(|d| d.kind.affects_publish_order()) {
      if edge.registry.is_some() {
        pinned += 1;
      }
      let target_publishable = metadata.package(&edge.name).is_ok_and(|p| p.publishable);
      if target_publishable && edge.requirement.is_none() {
        missing.push(format!("{} → {}", package.name, edge.name));
      }
    }
  }

  if missing.is_empty() {
    CheckResult::pass(
      "dependency requirements",
      format!("all workspace dependencies carry a version ({} pinned to a registry)", pinned),
    )
  } else {
    CheckResult::fail(
      "dependency requirements",
      format!("path-only dependencies: {}", missing.join(", ")),
      Some("Add a `version` next to `path` (or in [workspace.dependencies]). Alternate-registry publishes add it automatically.".to_string()),
    )
    .optional()
  }
}
