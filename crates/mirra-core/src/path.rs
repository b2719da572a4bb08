//! Paths into the base data tree
//!
//! A path is an ordered sequence of object keys and array indices. Two
//! paths are *compatible* when one is a prefix of (or equal to) the other;
//! this is the relation the dispatcher uses to decide whether an update
//! touches a watcher's interest set.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{FieldId, RecordId, TableId, ViewId};

/// One component of a path
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathKey {
    /// Array position
    Index(usize),
    /// Object member name
    Key(String),
}

impl PathKey {
    /// Component-wise equality. An index and a key holding the same
    /// decimal digits address the same node.
    pub fn matches(&self, other: &PathKey) -> bool {
        match (self, other) {
            (PathKey::Key(a), PathKey::Key(b)) => a == b,
            (PathKey::Index(a), PathKey::Index(b)) => a == b,
            (PathKey::Key(k), PathKey::Index(i)) | (PathKey::Index(i), PathKey::Key(k)) => {
                k.parse::<usize>().map(|n| n == *i).unwrap_or(false)
            }
        }
    }

    pub fn as_key(&self) -> Option<&str> {
        match self {
            PathKey::Key(k) => Some(k),
            PathKey::Index(_) => None,
        }
    }
}

impl fmt::Debug for PathKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathKey::Key(k) => write!(f, "{:?}", k),
            PathKey::Index(i) => write!(f, "{}", i),
        }
    }
}

impl fmt::Display for PathKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathKey::Key(k) => f.write_str(k),
            PathKey::Index(i) => write!(f, "{}", i),
        }
    }
}

impl From<&str> for PathKey {
    fn from(key: &str) -> Self {
        PathKey::Key(key.to_owned())
    }
}

impl From<String> for PathKey {
    fn from(key: String) -> Self {
        PathKey::Key(key)
    }
}

impl From<usize> for PathKey {
    fn from(index: usize) -> Self {
        PathKey::Index(index)
    }
}

macro_rules! id_path_key {
    ($($id:ty),*) => {
        $(
            impl From<&$id> for PathKey {
                fn from(id: &$id) -> Self {
                    PathKey::Key(id.as_str().to_owned())
                }
            }
        )*
    };
}

id_path_key!(TableId, FieldId, ViewId, RecordId);

/// Path - ordered keys locating a node in the base data tree
#[derive(Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Path(Vec<PathKey>);

impl Path {
    /// The empty path (the tree root)
    pub fn root() -> Self {
        Path(Vec::new())
    }

    pub fn from_keys<I, K>(keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<PathKey>,
    {
        Path(keys.into_iter().map(Into::into).collect())
    }

    /// Return a new path extended by one key
    pub fn child(&self, key: impl Into<PathKey>) -> Self {
        let mut keys = self.0.clone();
        keys.push(key.into());
        Path(keys)
    }

    pub fn keys(&self) -> &[PathKey] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Split off the final component
    pub fn split_last(&self) -> Option<(&PathKey, &[PathKey])> {
        self.0.split_last()
    }

    /// Check if self is a prefix of (or equal to) other
    pub fn is_prefix_of(&self, other: &Path) -> bool {
        self.0.len() <= other.0.len()
            && self.0.iter().zip(other.0.iter()).all(|(a, b)| a.matches(b))
    }

    /// Check if either path is a prefix of the other
    pub fn is_compatible_with(&self, other: &Path) -> bool {
        self.0.iter().zip(other.0.iter()).all(|(a, b)| a.matches(b))
    }

    /// Check if self is compatible with any path in the interest set
    pub fn affects(&self, interests: &[Path]) -> bool {
        interests.iter().any(|interest| self.is_compatible_with(interest))
    }
}

impl fmt::Debug for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.0.iter()).finish()
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for key in &self.0 {
            write!(f, "/{}", key)?;
        }
        Ok(())
    }
}

impl From<Vec<PathKey>> for Path {
    fn from(keys: Vec<PathKey>) -> Self {
        Path(keys)
    }
}

impl<K: Into<PathKey>> FromIterator<K> for Path {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        Path::from_keys(iter)
    }
}
