//! Recording watch callbacks

use std::sync::Arc;

use mirra_state::{callback, WatchCallback, WatchKey};
use parking_lot::Mutex;

/// Records every key its callbacks are invoked with
pub struct WatchProbe<K> {
    calls: Arc<Mutex<Vec<K>>>,
}

impl<K: WatchKey> Default for WatchProbe<K> {
    fn default() -> Self {
        WatchProbe {
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl<K: WatchKey> WatchProbe<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// A fresh callback recording into this probe. Keep the handle to
    /// unwatch it later.
    pub fn callback(&self) -> WatchCallback<K> {
        let calls = Arc::clone(&self.calls);
        callback(move |key| calls.lock().push(key))
    }

    pub fn count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Number of invocations for `key`
    pub fn count_of(&self, key: K) -> usize {
        self.calls.lock().iter().filter(|&&k| k == key).count()
    }

    pub fn calls(&self) -> Vec<K> {
        self.calls.lock().clone()
    }

    pub fn clear(&self) {
        self.calls.lock().clear();
    }
}
