//! Mirra Test Harness - Mock host and fixtures
//!
//! This crate provides:
//! - `MockHost`: a recording, programmable `Host`
//! - `MockFieldTypeProvider`: a recording, programmable field type provider
//! - The project tracker fixture base
//! - `WatchProbe`: recording watch callbacks
//! - Integration tests for the whole model layer (see `tests/`)

#![recursion_limit = "256"]

pub mod fixtures;
pub mod mock_host;
pub mod watch_probe;

pub use fixtures::*;
pub use mock_host::*;
pub use watch_probe::*;
