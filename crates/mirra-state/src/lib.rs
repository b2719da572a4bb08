//! Mirra State Engine - Base data tree and update dispatch
//!
//! This crate implements the inward half of the synchronization layer:
//! - The versioned base data tree and its shared store
//! - Watch registries keyed by semantic watch keys
//! - The batched update dispatcher (prefix matching, per-batch dedup,
//!   callback isolation)

pub mod dispatch;
pub mod tree;
pub mod watch;

pub use dispatch::*;
pub use tree::*;
pub use watch::*;
