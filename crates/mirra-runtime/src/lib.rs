//! Mirra Runtime - Session wiring
//!
//! This crate ties the layers together for an embedding host:
//! - `Session`: owns the store and dispatcher, subscribes to the host's
//!   patch channel and hands out the root models
//! - `SessionConfig`: runtime knobs, loadable from the environment
//! - `init_tracing`: structured logging setup

pub mod config;
pub mod session;
pub mod telemetry;

pub use config::*;
pub use session::*;
pub use telemetry::*;
