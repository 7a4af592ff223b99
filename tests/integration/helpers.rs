//! Test helpers for integration tests

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// A test workspace with git history
pub struct TestWorkspace {
  _root: TempDir,
  pub path: PathBuf,
}

impl TestWorkspace {
  /// Create a new committed workspace with no members yet
  pub fn new() -> Result<Self> {
    let root = TempDir::new()?;
    let path = root.path().to_path_buf();

    git(&path, &["init", "--initial-branch=main"])?;
    git(&path, &["config", "user.name", "Test User"])?;
    git(&path, &["config", "user.email", "test@example.com"])?;
    git(&path, &["config", "commit.gpgsign", "false"])?;

    // [workspace.dependencies] stays last so add_crate can append to it
    std::fs::write(
      path.join("Cargo.toml"),
      r#"[workspace]
members = ["crates/*"]
resolver = "2"

[workspace.package]
version = "0.1.0"
edition = "2021"
license = "MIT"

[workspace.dependencies]
"#,
    )?;

    git(&path, &["add", "."])?;
    git(&path, &["commit", "-m", "Initial workspace setup"])?;

    Ok(Self { _root: root, path })
  }

  /// Add a member inheriting the workspace version, depending on `deps` through
  /// `[workspace.dependencies]`
  pub fn add_crate(&self, name: &str, deps: &[&str]) -> Result<PathBuf> {
    let crate_path = self.path.join("crates").join(name);
    std::fs::create_dir_all(crate_path.join("src"))?;

    let mut cargo_toml = format!(
      r#"[package]
name = "{}"
version.workspace = true
edition.workspace = true
license.workspace = true
description = "Test crate {}"

[dependencies]
"#,
      name, name
    );
    for dep in deps {
      cargo_toml.push_str(&format!("{} = {{ workspace = true }}\n", dep));
    }

    std::fs::write(crate_path.join("Cargo.toml"), cargo_toml)?;
    std::fs::write(crate_path.join("src/lib.rs"), format!("//! {} crate\n", name))?;

    let mut root = self.read_file("Cargo.toml")?;
    root.push_str(&format!("{} = {{ path = \"crates/{}\", version = \"0.1.0\" }}\n", name, name));
    std::fs::write(self.path.join("Cargo.toml"), root)?;

    Ok(crate_path)
  }

  /// Commit current changes
  pub fn commit(&self, message: &str) -> Result<String> {
    git(&self.path, &["add", "."])?;
    git(&self.path, &["commit", "-m", message])?;

    let output = git(&self.path, &["rev-parse", "HEAD"])?;
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
  }

  /// Write a file relative to the workspace root
  pub fn write_file(&self, path: &str, content: &str) -> Result<()> {
    let file_path = self.path.join(path);
    if let Some(parent) = file_path.parent() {
      std::fs::create_dir_all(parent)?;
    }
    std::fs::write(file_path, content)?;
    Ok(())
  }

  /// Read a file
  pub fn read_file(&self, path: &str) -> Result<String> {
    Ok(std::fs::read_to_string(self.path.join(path))?)
  }

  /// Tracked files that differ from HEAD
  pub fn changed_files(&self) -> Result<Vec<String>> {
    let output = git(&self.path, &["diff", "--name-only", "HEAD"])?;
    Ok(
      String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(String::from)
        .collect(),
    )
  }
}

/// Run git command in a directory
pub fn git(cwd: &Path, args: &[&str]) -> Result<Output> {
  let output = Command::new("git")
    .current_dir(cwd)
    .args(args)
    .output()
    .context("Failed to run git command")?;

  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr);
    anyhow::bail!("Git command failed: git {}\n{}", args.join(" "), stderr);
  }

  Ok(output)
}

/// Run cargo-publish-gate and return its output whatever the exit status
pub fn run_publish_gate_raw(cwd: &Path, args: &[&str]) -> Result<Output> {
  let bin = env!("CARGO_BIN_EXE_cargo-publish-gate");

  Command::new(bin)
    .current_dir(cwd)
    .args(args)
    .env_remove("RUST_LOG")
    .output()
    .context("Failed to run cargo-publish-gate")
}

/// Run cargo-publish-gate, failing on a non-zero exit
pub fn run_publish_gate(cwd: &Path, args: &[&str]) -> Result<Output> {
  let output = run_publish_gate_raw(cwd, args)?;

  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);
    anyhow::bail!(
      "cargo-publish-gate command failed: cargo {}\nstdout: {}\nstderr: {}",
      args.join(" "),
      stdout,
      stderr
    );
  }

  Ok(output)
}
