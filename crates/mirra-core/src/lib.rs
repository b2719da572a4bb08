//! Mirra Core - Fundamental types shared by every layer
//!
//! This crate defines the vocabulary of the model synchronization layer:
//! - Identifiers (TableId, FieldId, ViewId, RecordId)
//! - Paths into the base data tree and the prefix relation between them
//! - Model updates delivered by the host patch channel
//! - Logical field types and the legacy type-tag remap
//! - Mutation descriptors and permission check results
//! - Error types

pub mod error;
pub mod field_type;
pub mod id;
pub mod mutation;
pub mod path;
pub mod update;

pub use error::*;
pub use field_type::*;
pub use id::*;
pub use mutation::*;
pub use path::*;
pub use update::*;
