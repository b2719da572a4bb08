//! Watch registries - who wants to hear about which key
//!
//! A registration is `(key, callback)`. Several callbacks may share a key
//! and the same callback may be registered under several keys; removal
//! matches on callback identity.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

/// Semantic property name a consumer subscribes to
pub trait WatchKey: Copy + Eq + fmt::Debug + Send + Sync + 'static {
    /// Stable wire name of the key
    fn name(self) -> &'static str;

    /// Watching this key needs backing data that is fetched on demand
    fn requires_data(self) -> bool {
        false
    }
}

/// Watch callback. Receives the key that changed.
pub type WatchCallback<K> = Arc<dyn Fn(K) + Send + Sync>;

/// Wrap a closure as a callback handle suitable for `unwatch`
pub fn callback<K, F>(f: F) -> WatchCallback<K>
where
    K: WatchKey,
    F: Fn(K) + Send + Sync + 'static,
{
    Arc::new(f)
}

fn same_callback<K>(a: &WatchCallback<K>, b: &WatchCallback<K>) -> bool {
    // Compare data pointers only; vtable pointers are not unique.
    std::ptr::eq(Arc::as_ptr(a) as *const (), Arc::as_ptr(b) as *const ())
}

struct WatchEntry<K> {
    key: K,
    callbacks: Vec<WatchCallback<K>>,
}

/// Ordered registry of watch registrations for one model
pub struct WatchRegistry<K: WatchKey> {
    entries: Vec<WatchEntry<K>>,
}

impl<K: WatchKey> Default for WatchRegistry<K> {
    fn default() -> Self {
        WatchRegistry {
            entries: Vec::new(),
        }
    }
}

impl<K: WatchKey> WatchRegistry<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback under a key
    pub fn add(&mut self, key: K, callback: WatchCallback<K>) {
        match self.entries.iter_mut().find(|e| e.key == key) {
            Some(entry) => entry.callbacks.push(callback),
            None => self.entries.push(WatchEntry {
                key,
                callbacks: vec![callback],
            }),
        }
    }

    /// Remove the exact `(key, callback)` pair. Returns false if absent.
    pub fn remove(&mut self, key: K, callback: &WatchCallback<K>) -> bool {
        let Some(pos) = self.entries.iter().position(|e| e.key == key) else {
            return false;
        };
        let entry = &mut self.entries[pos];
        let Some(idx) = entry.callbacks.iter().position(|c| same_callback(c, callback)) else {
            return false;
        };
        entry.callbacks.remove(idx);
        if entry.callbacks.is_empty() {
            self.entries.remove(pos);
        }
        true
    }

    /// Copy of the callbacks for a key, safe to invoke while the registry
    /// is being modified.
    pub fn callbacks(&self, key: K) -> Vec<WatchCallback<K>> {
        self.entries
            .iter()
            .find(|e| e.key == key)
            .map(|e| e.callbacks.clone())
            .unwrap_or_default()
    }

    /// Watched keys, in the order they were first watched
    pub fn keys(&self) -> Vec<K> {
        self.entries.iter().map(|e| e.key).collect()
    }

    pub fn has_watchers(&self, key: K) -> bool {
        self.entries.iter().any(|e| e.key == key)
    }

    /// Total number of registrations
    pub fn len(&self) -> usize {
        self.entries.iter().map(|e| e.callbacks.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: WatchKey> fmt::Debug for WatchRegistry<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.entries.iter().map(|e| (e.key, e.callbacks.len())))
            .finish()
    }
}

/// Result of invoking the callbacks of one key
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InvocationOutcome {
    pub invoked: u32,
    pub failed: u32,
}

/// Invoke every callback for `key`.
///
/// With `isolate` set, a panicking callback is caught and logged and the
/// remaining callbacks still run.
pub fn invoke_callbacks<K: WatchKey>(
    model: &str,
    key: K,
    callbacks: &[WatchCallback<K>],
    isolate: bool,
) -> InvocationOutcome {
    let mut outcome = InvocationOutcome::default();

    for cb in callbacks {
        outcome.invoked += 1;
        if !isolate {
            cb(key);
            continue;
        }
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| cb(key))) {
            outcome.failed += 1;
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| (*s).to_owned())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "non-string panic payload".to_owned());
            tracing::error!(model, key = key.name(), %message, "watch callback panicked");
        }
    }

    outcome
}
