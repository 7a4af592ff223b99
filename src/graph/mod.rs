//! Workspace dependency graph queries (petgraph)

pub mod publish_order;

pub use publish_order::resolve_publish_order;
