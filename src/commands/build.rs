//! `cargo publish-gate build` - compile and optimize provider artifacts
//!
//! Release builds run `wasm-opt -Oz -c`; debug builds copy the unoptimized
//! module so debug info survives.

use crate::core::config::BuildConfig;
use crate::core::context::ReleaseContext;
use crate::core::error::{BuildError, ConfigError, ReleaseResult, ResultExt};
use crate::core::preflight;
use crate::release::workflow::ALL_PACKAGES;
use crate::ui::progress::StepProgress;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

pub fn run_build(ctx: &ReleaseContext, provider: String, debug: bool) -> ReleaseResult<()> {
  let tools: &[&str] = if debug { &["cargo"] } else { &["cargo", "wasm-opt"] };
  preflight::require_tools(tools)?;

  let build = &ctx.config.build;
  let providers = select_providers(build, &provider)?;

  let artifacts_dir = ctx.root.join(&build.artifacts_dir);
  fs::create_dir_all(&artifacts_dir)
    .with_context(|| format!("Failed to create {}", artifacts_dir.display()))?;

  // compile + optimize per provider
  let mut progress = StepProgress::new(providers.len() * 2, "Building providers");

  for provider in &providers {
    println!("🔨 Building {} provider...", provider);
    run_step(provider, compile_command(ctx, build, provider, debug))?;
    progress.inc();

    let input = module_path(&ctx.root, build, provider, debug);
    let output = artifacts_dir.join(format!("{}.wasm", provider));
    if debug {
      fs::copy(&input, &output).with_context(|| format!("Failed to copy {}", input.display()))?;
    } else {
      println!("🗜️  Optimizing {} provider...", provider);
      run_step(provider, optimize_command(&input, &output))?;
    }
    progress.inc();
    log::info!("Wrote {}", output.display());
  }

  println!("\n✨ Done. Artifacts in {}", artifacts_dir.display());
  Ok(())
}

fn select_providers(build: &BuildConfig, provider: &str) -> ReleaseResult<Vec<String>> {
  if provider != ALL_PACKAGES {
    return Ok(vec![provider.to_string()]);
  }
  if build.providers.is_empty() {
    return Err(
      ConfigError::Invalid {
        path: PathBuf::from("publish-gate.toml"),
        reason: "`build all` needs a provider list under [build] providers".to_string(),
      }
      .into(),
    );
  }
  Ok(build.providers.clone())
}

fn compile_command(ctx: &ReleaseContext, build: &BuildConfig, provider: &str, debug: bool) -> Command {
  let mut cmd = Command::new("cargo");
  cmd.arg("build");
  if !debug {
    cmd.arg("--release");
  }
  cmd.arg("-p").arg(format!("{}-provider", provider));
  cmd.current_dir(ctx.root.join(&build.providers_dir));
  cmd
}

fn optimize_command(input: &Path, output: &Path) -> Command {
  let mut cmd = Command::new("wasm-opt");
  cmd.args(["-Oz", "-c", "-o"]).arg(output).arg(input);
  cmd
}

/// Compiled module: `target/{target}/{profile}/{provider}_provider.wasm`
fn module_path(root: &Path, build: &BuildConfig, provider: &str, debug: bool) -> PathBuf {
  let profile = if debug { "debug" } else { "release" };
  root
    .join("target")
    .join(&build.target)
    .join(profile)
    .join(format!("{}_provider.wasm", provider.replace('-', "_")))
}

fn run_step(provider: &str, mut cmd: Command) -> ReleaseResult<()> {
  let command = format!(
    "{} {}",
    cmd.get_program().to_string_lossy(),
    cmd
      .get_args()
      .map(|a| a.to_string_lossy().into_owned())
      .collect::<Vec<_>>()
      .join(" ")
  );
  log::debug!("Running {}", command);

  let output = cmd
    .output()
    .with_context(|| format!("Failed to run {}", command))?;

  if !output.status.success() {
    let mut captured = String::from_utf8_lossy(&output.stdout).to_string();
    captured.push_str(&String::from_utf8_lossy(&output.stderr));
    return Err(
      BuildError {
        provider: provider.to_string(),
        command,
        exit_code: output.status.code(),
        output: captured,
      }
      .into(),
    );
  }

  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_module_path_per_profile() {
    let build = BuildConfig::default();
    let root = Path::new("/ws");

    assert_eq!(
      module_path(root, &build, "loki", false),
      PathBuf::from("/ws/target/wasm32-unknown-unknown/release/loki_provider.wasm")
    );
    assert_eq!(
      module_path(root, &build, "my-source", true),
      PathBuf::from("/ws/target/wasm32-unknown-unknown/debug/my_source_provider.wasm")
    );
  }

  #[test]
  fn test_select_providers() {
    let mut build = BuildConfig::default();
    assert_eq!(select_providers(&build, "sentry").unwrap(), vec!["sentry"]);
    assert!(select_providers(&build, "all").is_err());

    build.providers = vec!["loki".to_string(), "https".to_string()];
    assert_eq!(select_providers(&build, "all").unwrap(), vec!["loki", "https"]);
  }

  #[test]
  fn test_optimize_command_line() {
    let cmd = optimize_command(Path::new("in.wasm"), Path::new("artifacts/loki.wasm"));
    let args: Vec<_> = cmd.get_args().map(|a| a.to_string_lossy().into_owned()).collect();
    assert_eq!(args, vec!["-Oz", "-c", "-o", "artifacts/loki.wasm", "in.wasm"]);
  }
}
