//! "Handle or id" arguments
//!
//! Navigation and membership calls accept either a live model handle or a
//! raw id string; both normalize to the id before use.

use crate::{Field, Record, Table, View};

/// Anything that can report its own id
pub trait HasId {
    fn id_str(&self) -> &str;
}

/// Reference to an entity by handle or by id
pub enum EntityRef<'a, T> {
    Id(&'a str),
    Handle(&'a T),
}

impl<'a, T: HasId> EntityRef<'a, T> {
    /// Normalized id
    pub fn id(&self) -> &'a str {
        match *self {
            EntityRef::Id(id) => id,
            EntityRef::Handle(handle) => handle.id_str(),
        }
    }
}

impl<T> Clone for EntityRef<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for EntityRef<'_, T> {}

impl<T> std::fmt::Debug for EntityRef<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityRef::Id(id) => f.debug_tuple("Id").field(id).finish(),
            EntityRef::Handle(_) => f.write_str("Handle(..)"),
        }
    }
}

impl<'a, T> From<&'a str> for EntityRef<'a, T> {
    fn from(id: &'a str) -> Self {
        EntityRef::Id(id)
    }
}

impl<'a, T> From<&'a String> for EntityRef<'a, T> {
    fn from(id: &'a String) -> Self {
        EntityRef::Id(id.as_str())
    }
}

pub type TableRef<'a> = EntityRef<'a, Table>;
pub type ViewRef<'a> = EntityRef<'a, View>;
pub type FieldRef<'a> = EntityRef<'a, Field>;
pub type RecordRef<'a> = EntityRef<'a, Record>;
