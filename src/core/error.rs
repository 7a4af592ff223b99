//! Error types for cargo-publish-gate with contextual messages and exit codes
//!
//! Every failure in a publish run maps onto one closed set of kinds. Each kind
//! carries a structured payload instead of raw process output, and most of them
//! know how to suggest a way forward to the user.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Exit codes for cargo-publish-gate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
  /// User error (config, invalid args, missing tools)
  User = 1,
  /// System error (git, cargo, registry, I/O)
  System = 2,
}

impl ExitCode {
  /// Convert to i32 for process exit
  pub fn as_i32(self) -> i32 {
    self as i32
  }
}

/// Main error type for cargo-publish-gate
#[derive(Debug)]
pub enum ReleaseError {
  /// Tag/describe/restore plumbing failed or produced unusable output
  Vcs(VcsError),

  /// Project metadata unreadable, or the package is unknown
  Metadata(MetadataReadError),

  /// Registry index fetch or parse failure
  RegistryQuery(RegistryQueryError),

  /// The registry client reported a failed upload
  Publish(PublishError),

  /// Manifests could not be brought back to their committed state
  ManifestRestore(ManifestRestoreError),

  /// A transaction body failed and restoring the manifests failed too.
  /// `primary` is the reported cause.
  RestoreAfterFailure {
    primary: Box<ReleaseError>,
    restore: ManifestRestoreError,
  },

  /// Configuration and precondition errors
  Config(ConfigError),

  /// Provider artifact compile or optimize step failed
  Build(BuildError),

  /// I/O errors
  Io(io::Error),
}

impl ReleaseError {
  /// Attach context to an I/O failure. Structured kinds already name what they
  /// were doing and pass through untouched.
  pub fn context(self, ctx: impl Into<String>) -> Self {
    match self {
      ReleaseError::Io(e) => ReleaseError::Io(io::Error::new(e.kind(), format!("{}: {}", ctx.into(), e))),
      other => other,
    }
  }

  /// Get the appropriate exit code for this error
  pub fn exit_code(&self) -> ExitCode {
    match self {
      ReleaseError::Config(_) => ExitCode::User,
      ReleaseError::Metadata(MetadataReadError::UnknownPackage { .. }) => ExitCode::User,
      ReleaseError::RestoreAfterFailure { primary, .. } => primary.exit_code(),
      _ => ExitCode::System,
    }
  }

  /// Get contextual help message for this error
  pub fn help_message(&self) -> Option<String> {
    match self {
      ReleaseError::Vcs(e) => e.help_message(),
      ReleaseError::Metadata(e) => e.help_message(),
      ReleaseError::RegistryQuery(_) => {
        Some("Nothing was retried. Check connectivity to the registry index and re-run; published packages are skipped.".to_string())
      }
      ReleaseError::Publish(_) => Some(
        "Publishing is not retried automatically. Fix the problem and re-run the whole workflow; versions that already reached the registry are skipped."
          .to_string(),
      ),
      ReleaseError::ManifestRestore(e) => Some(e.help_message()),
      ReleaseError::RestoreAfterFailure { restore, .. } => Some(restore.help_message()),
      ReleaseError::Config(e) => e.help_message(),
      ReleaseError::Build(_) => None,
      ReleaseError::Io(_) => None,
    }
  }
}

impl fmt::Display for ReleaseError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ReleaseError::Vcs(e) => write!(f, "{}", e),
      ReleaseError::Metadata(e) => write!(f, "{}", e),
      ReleaseError::RegistryQuery(e) => write!(f, "{}", e),
      ReleaseError::Publish(e) => write!(f, "{}", e),
      ReleaseError::ManifestRestore(e) => write!(f, "{}", e),
      ReleaseError::RestoreAfterFailure { primary, restore } => {
        write!(f, "{}\n\nAdditionally, restoring manifests failed: {}", primary, restore)
      }
      ReleaseError::Config(e) => write!(f, "{}", e),
      ReleaseError::Build(e) => write!(f, "{}", e),
      ReleaseError::Io(e) => write!(f, "I/O error: {}", e),
    }
  }
}

impl std::error::Error for ReleaseError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      ReleaseError::Io(e) => Some(e),
      ReleaseError::RestoreAfterFailure { primary, .. } => Some(primary.as_ref()),
      _ => None,
    }
  }
}

impl From<io::Error> for ReleaseError {
  fn from(err: io::Error) -> Self {
    ReleaseError::Io(err)
  }
}

impl From<VcsError> for ReleaseError {
  fn from(err: VcsError) -> Self {
    ReleaseError::Vcs(err)
  }
}

impl From<MetadataReadError> for ReleaseError {
  fn from(err: MetadataReadError) -> Self {
    ReleaseError::Metadata(err)
  }
}

impl From<RegistryQueryError> for ReleaseError {
  fn from(err: RegistryQueryError) -> Self {
    ReleaseError::RegistryQuery(err)
  }
}

impl From<PublishError> for ReleaseError {
  fn from(err: PublishError) -> Self {
    ReleaseError::Publish(err)
  }
}

impl From<ManifestRestoreError> for ReleaseError {
  fn from(err: ManifestRestoreError) -> Self {
    ReleaseError::ManifestRestore(err)
  }
}

impl From<ConfigError> for ReleaseError {
  fn from(err: ConfigError) -> Self {
    ReleaseError::Config(err)
  }
}

impl From<BuildError> for ReleaseError {
  fn from(err: BuildError) -> Self {
    ReleaseError::Build(err)
  }
}

impl From<cargo_metadata::Error> for ReleaseError {
  fn from(err: cargo_metadata::Error) -> Self {
    ReleaseError::Metadata(MetadataReadError::Unreadable {
      reason: err.to_string(),
    })
  }
}

impl From<serde_json::Error> for ReleaseError {
  fn from(err: serde_json::Error) -> Self {
    ReleaseError::Io(io::Error::other(format!("JSON error: {}", err)))
  }
}

/// Version-control errors
#[derive(Debug)]
pub enum VcsError {
  /// git could not be spawned
  Unavailable { reason: String },

  /// A git command exited non-zero
  CommandFailed { command: String, stderr: String },

  /// `git describe --tags` found no tag to describe from
  NoTags,

  /// Describe output could not be turned into a registry-legal version
  MalformedDescribe { output: String, reason: String },

  /// Manifests differ from HEAD, so a working-tree restore would lose edits
  DirtyManifests { paths: Vec<PathBuf> },

  /// A manifest that would be rewritten is not tracked by git
  UntrackedManifest { path: PathBuf },
}

impl VcsError {
  fn help_message(&self) -> Option<String> {
    match self {
      VcsError::NoTags => Some("Create a release tag first, e.g. `git tag v0.1.0`.".to_string()),
      VcsError::Unavailable { .. } => Some("Install git and make sure it is on PATH.".to_string()),
      VcsError::DirtyManifests { .. } => {
        Some("Commit or stash your Cargo.toml changes before publishing to an alternate registry.".to_string())
      }
      VcsError::UntrackedManifest { path } => Some(format!("Add {} to git before publishing.", path.display())),
      _ => None,
    }
  }
}

impl fmt::Display for VcsError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      VcsError::Unavailable { reason } => write!(f, "Failed to run git: {}", reason),
      VcsError::CommandFailed { command, stderr } => {
        write!(f, "Git command failed: {}\n{}", command, stderr.trim_end())
      }
      VcsError::NoTags => write!(f, "No tags found in git history, cannot derive a version"),
      VcsError::MalformedDescribe { output, reason } => {
        write!(f, "Cannot derive a version from `git describe` output '{}': {}", output, reason)
      }
      VcsError::DirtyManifests { paths } => {
        write!(f, "Manifests have uncommitted changes: {}", join_paths(paths))
      }
      VcsError::UntrackedManifest { path } => {
        write!(f, "Manifest is not tracked by git: {}", path.display())
      }
    }
  }
}

/// Project metadata errors
#[derive(Debug)]
pub enum MetadataReadError {
  /// `cargo metadata` failed or returned garbage
  Unreadable { reason: String },

  /// Package is not a member of the workspace
  UnknownPackage { name: String, known: Vec<String> },

  /// Package exists but is marked `publish = false`
  NotPublishable { name: String },

  /// A manifest file could not be parsed or lacks the expected shape
  Manifest { path: PathBuf, reason: String },
}

impl MetadataReadError {
  fn help_message(&self) -> Option<String> {
    match self {
      MetadataReadError::UnknownPackage { known, .. } if !known.is_empty() => {
        Some(format!("Known packages: {}", known.join(", ")))
      }
      MetadataReadError::Unreadable { .. } => {
        Some("Run `cargo metadata --no-deps` in the workspace root to see the underlying problem.".to_string())
      }
      _ => None,
    }
  }
}

impl fmt::Display for MetadataReadError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      MetadataReadError::Unreadable { reason } => write!(f, "Failed to read workspace metadata: {}", reason),
      MetadataReadError::UnknownPackage { name, .. } => {
        write!(f, "Package '{}' not found in workspace", name)
      }
      MetadataReadError::NotPublishable { name } => {
        write!(f, "Package '{}' is marked as not publishable", name)
      }
      MetadataReadError::Manifest { path, reason } => {
        write!(f, "Invalid manifest {}: {}", path.display(), reason)
      }
    }
  }
}

/// Registry index query errors
#[derive(Debug)]
pub struct RegistryQueryError {
  pub package: String,
  pub url: String,
  pub reason: String,
}

impl fmt::Display for RegistryQueryError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "Failed to query published versions of '{}' from {}: {}",
      self.package, self.url, self.reason
    )
  }
}

/// Registry client (cargo publish) failure
#[derive(Debug)]
pub struct PublishError {
  pub package: String,
  pub version: String,
  pub registry: String,
  pub command: String,
  pub exit_code: Option<i32>,
  pub output: String,
}

impl fmt::Display for PublishError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "Failed to publish {} {} to {} (`{}` exited with {})",
      self.package,
      self.version,
      self.registry,
      self.command,
      self
        .exit_code
        .map(|c| c.to_string())
        .unwrap_or_else(|| "a signal".to_string())
    )?;
    if !self.output.trim().is_empty() {
      write!(f, "\nOutput:\n{}", self.output.trim_end())?;
    }
    Ok(())
  }
}

/// Provider build step failure
#[derive(Debug)]
pub struct BuildError {
  pub provider: String,
  pub command: String,
  pub exit_code: Option<i32>,
  pub output: String,
}

impl fmt::Display for BuildError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "Failed to build provider '{}': `{}`", self.provider, self.command)?;
    if let Some(code) = self.exit_code {
      write!(f, " exited with {}", code)?;
    }
    if !self.output.trim().is_empty() {
      write!(f, "\nOutput:\n{}", self.output.trim_end())?;
    }
    Ok(())
  }
}

/// Manifest restoration failures
#[derive(Debug)]
pub enum ManifestRestoreError {
  /// The restore command itself failed
  CommandFailed { paths: Vec<PathBuf>, reason: String },

  /// Restore ran but these files still differ from the snapshot
  Diverged { paths: Vec<PathBuf> },
}

impl ManifestRestoreError {
  pub fn paths(&self) -> &[PathBuf] {
    match self {
      ManifestRestoreError::CommandFailed { paths, .. } => paths,
      ManifestRestoreError::Diverged { paths } => paths,
    }
  }

  fn help_message(&self) -> String {
    format!(
      "Restore the manifests manually with: git restore --source=HEAD --staged --worktree -- {}",
      self
        .paths()
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(" ")
    )
  }
}

impl fmt::Display for ManifestRestoreError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ManifestRestoreError::CommandFailed { reason, .. } => {
        write!(f, "Failed to restore manifests: {}", reason.trim_end())
      }
      ManifestRestoreError::Diverged { paths } => {
        write!(f, "Manifests differ from their pre-publish state: {}", join_paths(paths))
      }
    }
  }
}

/// Configuration and precondition errors
#[derive(Debug)]
pub enum ConfigError {
  /// Config file exists but cannot be read or parsed
  Invalid { path: PathBuf, reason: String },

  /// No index URL known for a registry
  MissingIndex { registry: String },

  /// Index is not a sparse HTTP index
  UnsupportedIndex { registry: String, index: String },

  /// Required executable not found on PATH
  ToolMissing { tool: String },

  /// Configured publish order is inconsistent with the workspace
  InvalidPublishOrder { reason: String },

  /// A user-supplied version is not valid semver
  InvalidVersion { version: String, reason: String },

  /// HTTP client could not be constructed
  HttpClient { reason: String },
}

impl ConfigError {
  fn help_message(&self) -> Option<String> {
    match self {
      ConfigError::MissingIndex { registry } => Some(format!(
        "Add an index for it to publish-gate.toml:\n  [registries.{}]\n  index = \"sparse+https://...\"",
        registry
      )),
      ConfigError::UnsupportedIndex { .. } => {
        Some("Only sparse (HTTP) registry indexes can be queried for published versions.".to_string())
      }
      ConfigError::ToolMissing { tool } => Some(format!("Install `{}` and make sure it is on PATH.", tool)),
      ConfigError::InvalidPublishOrder { .. } => Some(
        "Fix `[publish] order` in publish-gate.toml, or remove it to let the order be computed.".to_string(),
      ),
      _ => None,
    }
  }
}

impl fmt::Display for ConfigError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ConfigError::Invalid { path, reason } => {
        write!(f, "Invalid configuration in {}: {}", path.display(), reason)
      }
      ConfigError::MissingIndex { registry } => {
        write!(f, "No index URL configured for registry '{}'", registry)
      }
      ConfigError::UnsupportedIndex { registry, index } => {
        write!(f, "Registry '{}' uses an unsupported index: {}", registry, index)
      }
      ConfigError::ToolMissing { tool } => write!(f, "Required tool not found: {}", tool),
      ConfigError::InvalidPublishOrder { reason } => write!(f, "Invalid publish order: {}", reason),
      ConfigError::InvalidVersion { version, reason } => {
        write!(f, "Invalid version '{}': {}", version, reason)
      }
      ConfigError::HttpClient { reason } => write!(f, "Failed to build HTTP client: {}", reason),
    }
  }
}

fn join_paths(paths: &[PathBuf]) -> String {
  paths
    .iter()
    .map(|p| p.display().to_string())
    .collect::<Vec<_>>()
    .join(", ")
}

/// Result type alias for cargo-publish-gate
pub type ReleaseResult<T> = Result<T, ReleaseError>;

/// Extension trait for adding context to results
pub trait ResultExt<T> {
  /// Add context to an error result
  fn context(self, ctx: impl Into<String>) -> ReleaseResult<T>;

  /// Add context using a closure (lazy evaluation)
  fn with_context<F>(self, f: F) -> ReleaseResult<T>
  where
    F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
  E: Into<ReleaseError>,
{
  fn context(self, ctx: impl Into<String>) -> ReleaseResult<T> {
    self.map_err(|e| e.into().context(ctx))
  }

  fn with_context<F>(self, f: F) -> ReleaseResult<T>
  where
    F: FnOnce() -> String,
  {
    self.map_err(|e| e.into().context(f()))
  }
}

/// Pretty-print an error to stderr with help text
pub fn print_error(error: &ReleaseError) {
  eprintln!("\n❌ {}\n", error);

  if let Some(help) = error.help_message() {
    eprintln!("💡 Help: {}\n", help);
  }
}
