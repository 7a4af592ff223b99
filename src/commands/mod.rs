//! CLI commands for cargo-publish-gate
//!
//! - **publish**: gated, ordered publishing to the default or an alternate registry
//! - **version**: show manifest/derived versions, or set the workspace version
//! - **order**: show the publish order
//! - **build**: compile and optimize provider WebAssembly artifacts
//! - **doctor**: precondition and configuration checks
//!
//! Commands that need workspace data take `&ReleaseContext`.

pub mod build;
pub mod doctor;
pub mod order;
pub mod publish;
pub mod version;

pub use build::run_build;
pub use doctor::run_doctor;
pub use order::run_order;
pub use publish::run_publish;
pub use version::{run_version, run_version_set};
