//! Base data tree - the local mirror of the remote base
//!
//! The tree is a nested, keyed JSON snapshot. It is owned by a `BaseStore`
//! and only changes when a batch of model updates is applied (or when a
//! model installs the result of its own fetch-and-subscribe).

use std::sync::Arc;

use mirra_core::{ModelUpdate, Path, PathKey};
use parking_lot::RwLock;
use serde_json::{Map, Value};
use tracing::debug;

/// Normalized snapshot of every entity in one base
#[derive(Debug, Clone, PartialEq)]
pub struct BaseData(Value);

impl Default for BaseData {
    fn default() -> Self {
        BaseData(Value::Object(Map::new()))
    }
}

impl BaseData {
    /// Wrap a JSON value. Anything but an object becomes an empty tree.
    pub fn new(value: Value) -> Self {
        if value.is_object() {
            BaseData(value)
        } else {
            BaseData::default()
        }
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }

    /// Read the node at `path`. A stored `null` reads as absent.
    pub fn get(&self, path: &Path) -> Option<&Value> {
        path.keys()
            .iter()
            .try_fold(&self.0, |node, key| child(node, key))
            .filter(|value| !value.is_null())
    }

    pub fn get_str(&self, path: &Path) -> Option<&str> {
        self.get(path).and_then(Value::as_str)
    }

    pub fn get_object(&self, path: &Path) -> Option<&Map<String, Value>> {
        self.get(path).and_then(Value::as_object)
    }

    /// Check if a non-null node exists at `path`
    pub fn contains(&self, path: &Path) -> bool {
        self.get(path).is_some()
    }

    /// Write `value` at `path`, creating intermediate objects.
    ///
    /// A `null` value removes the addressed object member instead; deleting
    /// below a missing node is a no-op so deleted entries never resurrect
    /// as empty objects. Arrays grow by at most one slot per write; an
    /// index past the end is ignored.
    pub fn set(&mut self, path: &Path, value: Value) {
        let Some((last, parents)) = path.split_last() else {
            *self = BaseData::new(value);
            return;
        };

        if value.is_null() {
            let parent = parents
                .iter()
                .try_fold(&mut self.0, |node, key| child_mut(node, key));
            match parent {
                Some(Value::Object(map)) => {
                    map.remove(&key_string(last));
                }
                Some(Value::Array(items)) => {
                    if let Some(slot) = key_index(last).and_then(|i| items.get_mut(i)) {
                        *slot = Value::Null;
                    }
                }
                _ => {}
            }
            return;
        }

        let slot = parents
            .iter()
            .try_fold(&mut self.0, |node, key| descend(node, key))
            .and_then(|parent| descend(parent, last));
        match slot {
            Some(slot) => *slot = value,
            None => debug!(path = %path, "ignored write past the end of an array"),
        }
    }

    pub fn apply(&mut self, update: &ModelUpdate) {
        self.set(&update.path, update.value.clone());
    }
}

fn key_index(key: &PathKey) -> Option<usize> {
    match key {
        PathKey::Index(i) => Some(*i),
        PathKey::Key(k) => k.parse().ok(),
    }
}

fn key_string(key: &PathKey) -> String {
    match key {
        PathKey::Key(k) => k.clone(),
        PathKey::Index(i) => i.to_string(),
    }
}

fn child<'a>(node: &'a Value, key: &PathKey) -> Option<&'a Value> {
    match node {
        Value::Object(map) => match key {
            PathKey::Key(k) => map.get(k),
            PathKey::Index(i) => map.get(&i.to_string()),
        },
        Value::Array(items) => key_index(key).and_then(|i| items.get(i)),
        _ => None,
    }
}

fn child_mut<'a>(node: &'a mut Value, key: &PathKey) -> Option<&'a mut Value> {
    match node {
        Value::Object(map) => map.get_mut(&key_string(key)),
        Value::Array(items) => key_index(key).and_then(move |i| items.get_mut(i)),
        _ => None,
    }
}

/// Step into `key`, reshaping the node into a container if needed.
/// `None` when `key` indexes past the end of an array.
fn descend<'a>(node: &'a mut Value, key: &PathKey) -> Option<&'a mut Value> {
    let numeric = key_index(key);
    let index = match node {
        Value::Array(_) if numeric.is_some() => numeric.unwrap_or_default(),
        Value::Object(_) => 0,
        _ => {
            *node = Value::Object(Map::new());
            0
        }
    };

    match node {
        Value::Array(items) => {
            if index == items.len() {
                items.push(Value::Null);
            }
            items.get_mut(index)
        }
        Value::Object(map) => Some(map.entry(key_string(key)).or_insert(Value::Null)),
        other => Some(other),
    }
}

#[derive(Debug)]
struct StoreInner {
    data: BaseData,
    version: u64,
}

/// Shared, versioned owner of the base data tree.
///
/// Models hold a clone of the store plus their own ids; every read is a
/// live projection of the current version.
#[derive(Debug, Clone)]
pub struct BaseStore {
    inner: Arc<RwLock<StoreInner>>,
}

impl BaseStore {
    pub fn new(data: BaseData) -> Self {
        BaseStore {
            inner: Arc::new(RwLock::new(StoreInner { data, version: 0 })),
        }
    }

    /// Number of writes applied so far
    pub fn version(&self) -> u64 {
        self.inner.read().version
    }

    /// Run `f` against the current tree. Do not call back into the store
    /// for writes from inside `f`.
    pub fn read<R>(&self, f: impl FnOnce(&BaseData) -> R) -> R {
        f(&self.inner.read().data)
    }

    pub fn get(&self, path: &Path) -> Option<Value> {
        self.read(|data| data.get(path).cloned())
    }

    pub fn get_str(&self, path: &Path) -> Option<String> {
        self.read(|data| data.get_str(path).map(str::to_owned))
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.read(|data| data.contains(path))
    }

    /// Deep copy of the current tree
    pub fn snapshot(&self) -> BaseData {
        self.read(Clone::clone)
    }

    /// Apply a batch in order as one write. Returns the new version.
    pub fn apply_updates(&self, updates: &[ModelUpdate]) -> u64 {
        let mut inner = self.inner.write();
        for update in updates {
            inner.data.apply(update);
        }
        inner.version += 1;
        inner.version
    }

    /// Install a fetched fragment at `path`. Returns the new version.
    pub fn install(&self, path: &Path, value: Value) -> u64 {
        let mut inner = self.inner.write();
        inner.data.set(path, value);
        inner.version += 1;
        inner.version
    }
}

impl Default for BaseStore {
    fn default() -> Self {
        BaseStore::new(BaseData::default())
    }
}
