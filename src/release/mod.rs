//! Release-publishing core
//!
//! - **version**: release version resolution (manifest or `git describe`)
//! - **gate**: idempotency check against the registry index
//! - **transaction**: reversible manifest rewrites for alternate registries
//! - **workflow**: composes the above in publish order

pub mod gate;
pub mod transaction;
pub mod version;
pub mod workflow;
