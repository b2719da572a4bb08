//! Mirra Models - Watchable entities over the shared base tree
//!
//! This crate implements the model layer:
//! - The host boundary (`Host`, `FieldTypeProvider`)
//! - The watchable model base (watch/unwatch, lazy load/unload)
//! - Concrete entities: base, table, view, field, record, cursor
//! - The field type capability table
//! - The mutation and permission gateway
//!
//! Every getter is a live projection of the current tree; nothing derived
//! is cached.

#[macro_use]
mod macros;

pub mod base;
pub mod cursor;
pub mod entity;
pub mod field;
pub mod field_types;
pub mod host;
pub mod mutations;
pub mod paths;
pub mod record;
pub mod table;
pub mod view;
pub mod watchable;

pub use base::*;
pub use cursor::*;
pub use entity::*;
pub use field::*;
pub use field_types::*;
pub use host::*;
pub use mutations::*;
pub use record::*;
pub use table::*;
pub use view::*;
pub use watchable::*;
