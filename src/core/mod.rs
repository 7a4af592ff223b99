//! Core building blocks for cargo-publish-gate
//!
//! - **config**: publish-gate.toml parsing
//! - **context**: workspace data loaded once per run
//! - **error**: error kinds with contextual help and exit codes
//! - **preflight**: helper executable checks
//! - **vcs**: git operations (SystemGit)

pub mod config;
pub mod context;
pub mod error;
pub mod preflight;
pub mod vcs;
