//! Cargo workspace integration
//!
//! - **metadata**: workspace packages and their intra-workspace edges (cargo_metadata)
//! - **manifest**: lossless Cargo.toml edits (toml_edit)

pub mod manifest;
pub mod metadata;
