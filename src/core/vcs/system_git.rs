//! System git backend
//!
//! Every operation is one `git` subprocess with an isolated environment.
//! Failures come back as structured `VcsError`/`ManifestRestoreError` values
//! carrying the command and its stderr.

use crate::core::error::{ManifestRestoreError, VcsError};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

/// Pathspec matching `Cargo.toml` at any depth, root included
const MANIFEST_PATHSPEC: &str = ":(glob)**/Cargo.toml";

/// Git backend using system git
pub struct SystemGit {
  /// Working tree root
  pub(crate) work_tree: PathBuf,
}

impl SystemGit {
  /// Open the repository containing `path`
  pub fn open(path: &Path) -> Result<Self, VcsError> {
    let output = Command::new("git")
      .arg("-C")
      .arg(path)
      .args(["rev-parse", "--show-toplevel"])
      .output()
      .map_err(|e| VcsError::Unavailable { reason: e.to_string() })?;

    if !output.status.success() {
      return Err(VcsError::CommandFailed {
        command: "git rev-parse --show-toplevel".to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
      });
    }

    let work_tree = PathBuf::from(String::from_utf8_lossy(&output.stdout).trim());
    Ok(Self { work_tree })
  }

  /// Working tree root
  pub fn work_tree(&self) -> &Path {
    &self.work_tree
  }

  /// Raw `git describe --tags` output, trimmed
  pub fn describe_tags(&self) -> Result<String, VcsError> {
    let output = self.run(&["describe", "--tags"])?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      if stderr.contains("No names found") || stderr.contains("No tags can describe") {
        return Err(VcsError::NoTags);
      }
      return Err(VcsError::CommandFailed {
        command: "git describe --tags".to_string(),
        stderr: stderr.to_string(),
      });
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
  }

  /// Every tracked `Cargo.toml`, relative to the working tree root, sorted
  pub fn tracked_manifests(&self) -> Result<Vec<PathBuf>, VcsError> {
    let output = self.run(&["ls-files", "-z", "--", MANIFEST_PATHSPEC])?;
    let stdout = check_output(output, "git ls-files -z -- ':(glob)**/Cargo.toml'")?;

    let mut paths: Vec<PathBuf> = stdout
      .split('\0')
      .filter(|p| !p.is_empty())
      .map(PathBuf::from)
      .collect();
    paths.sort();
    Ok(paths)
  }

  /// Subset of `paths` that differs from HEAD (staged or unstaged)
  pub fn changed_paths(&self, paths: &[PathBuf]) -> Result<Vec<PathBuf>, VcsError> {
    if paths.is_empty() {
      return Ok(Vec::new());
    }

    let mut cmd = self.git_cmd();
    cmd.args(["diff", "--name-only", "-z", "HEAD", "--"]).args(paths);
    let output = cmd.output().map_err(|e| VcsError::Unavailable { reason: e.to_string() })?;
    let stdout = check_output(output, "git diff --name-only HEAD --")?;

    Ok(
      stdout
        .split('\0')
        .filter(|p| !p.is_empty())
        .map(PathBuf::from)
        .collect(),
    )
  }

  /// Bring `paths` back to their HEAD content in both index and working tree
  pub fn restore_paths(&self, paths: &[PathBuf]) -> Result<(), ManifestRestoreError> {
    if paths.is_empty() {
      return Ok(());
    }

    log::debug!("Restoring {} manifest(s) from HEAD", paths.len());
    let mut cmd = self.git_cmd();
    cmd
      .args(["restore", "--source=HEAD", "--staged", "--worktree", "--"])
      .args(paths);

    let output = cmd.output().map_err(|e| ManifestRestoreError::CommandFailed {
      paths: paths.to_vec(),
      reason: format!("failed to run git restore: {}", e),
    })?;

    if !output.status.success() {
      return Err(ManifestRestoreError::CommandFailed {
        paths: paths.to_vec(),
        reason: String::from_utf8_lossy(&output.stderr).to_string(),
      });
    }

    Ok(())
  }

  fn run(&self, args: &[&str]) -> Result<Output, VcsError> {
    log::debug!("git {}", args.join(" "));
    self
      .git_cmd()
      .args(args)
      .output()
      .map_err(|e| VcsError::Unavailable { reason: e.to_string() })
  }

  /// Create a safe git command with isolated environment
  ///
  /// - Sets working directory to the working tree root
  /// - Clears environment variables
  /// - Whitelists only PATH and HOME
  /// - Adds safe configuration overrides
  pub(crate) fn git_cmd(&self) -> Command {
    let mut cmd = Command::new("git");

    cmd.arg("-C").arg(&self.work_tree);

    // Isolated environment (don't trust global config)
    cmd.env_clear();
    if let Ok(path) = std::env::var("PATH") {
      cmd.env("PATH", path);
    }
    if let Ok(home) = std::env::var("HOME") {
      cmd.env("HOME", home);
    }

    cmd.arg("-c").arg("advice.detachedHead=false");
    cmd.arg("-c").arg("core.quotePath=false"); // Don't escape non-ASCII

    cmd
  }
}

fn check_output(output: Output, command: &str) -> Result<String, VcsError> {
  if !output.status.success() {
    return Err(VcsError::CommandFailed {
      command: command.to_string(),
      stderr: String::from_utf8_lossy(&output.stderr).to_string(),
    });
  }
  Ok(String::from_utf8_lossy(&output.stdout).to_string())
}
