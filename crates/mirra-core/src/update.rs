//! Model updates - the unit of the host patch channel

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Path, PathKey};

/// A single `{path, value}` patch. A `null` value removes the addressed
/// object member (this is how collection entries are deleted).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelUpdate {
    pub path: Path,
    pub value: Value,
}

impl ModelUpdate {
    pub fn new(path: Path, value: Value) -> Self {
        ModelUpdate { path, value }
    }

    /// Convenience constructor from raw keys
    pub fn set<I, K>(keys: I, value: Value) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<PathKey>,
    {
        ModelUpdate::new(Path::from_keys(keys), value)
    }

    /// Deletion of the addressed entry
    pub fn delete<I, K>(keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<PathKey>,
    {
        ModelUpdate::new(Path::from_keys(keys), Value::Null)
    }

    pub fn is_deletion(&self) -> bool {
        self.value.is_null()
    }
}
