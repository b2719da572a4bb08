//! Update dispatcher - applies host batches and notifies watchers
//!
//! Pipeline for each batch:
//! 1. Let every live listener observe the pre-batch tree
//! 2. Apply all updates to the store as one write
//! 3. Ask every listener which of its watched keys the batch affected
//! 4. Invoke each affected key's callbacks once
//!
//! Batches are processed one at a time to completion. A batch delivered
//! while another is being dispatched (for example from inside a callback)
//! is queued and processed right after.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use mirra_core::{ModelUpdate, Path};
use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::{BaseData, BaseStore, InvocationOutcome, WatchKey};

/// Per-batch context handed to listeners
#[derive(Debug, Clone, Copy)]
pub struct BatchContext<'a> {
    updates: &'a [ModelUpdate],
    version: u64,
    isolate_panics: bool,
}

impl<'a> BatchContext<'a> {
    pub fn new(updates: &'a [ModelUpdate], version: u64, isolate_panics: bool) -> Self {
        BatchContext {
            updates,
            version,
            isolate_panics,
        }
    }

    pub fn updates(&self) -> &'a [ModelUpdate] {
        self.updates
    }

    /// Store version after the batch was applied
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn isolate_panics(&self) -> bool {
        self.isolate_panics
    }
}

/// What one listener did with a batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListenerReport {
    pub notified_keys: Vec<&'static str>,
    pub invoked: u32,
    pub failed: u32,
}

impl ListenerReport {
    pub fn record(&mut self, key: &'static str, outcome: InvocationOutcome) {
        self.notified_keys.push(key);
        self.invoked += outcome.invoked;
        self.failed += outcome.failed;
    }
}

/// A live model instance that wants batch notifications
pub trait BatchListener: Send + Sync {
    /// Short label for logs
    fn label(&self) -> &str;

    /// Observe the tree before the batch is applied
    fn before_batch(&self, _data: &BaseData) {}

    /// Notify affected watchers after the batch is applied
    fn handle_batch(&self, batch: &BatchContext<'_>) -> ListenerReport;
}

/// Keys whose interest paths are touched by any update, in the order of
/// `interests`. Each key appears at most once.
pub fn affected_keys<K: WatchKey>(interests: &[(K, Vec<Path>)], updates: &[ModelUpdate]) -> Vec<K> {
    let mut affected: Vec<K> = Vec::new();
    for (key, paths) in interests {
        if affected.contains(key) {
            continue;
        }
        if updates.iter().any(|update| update.path.affects(paths)) {
            affected.push(*key);
        }
    }
    affected
}

/// Summary of one `apply_batch` call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Batches processed by this call (queued ones included)
    pub batches: u32,
    pub updates: usize,
    pub notified_keys: usize,
    pub invoked_callbacks: u32,
    pub failed_callbacks: u32,
    /// Store version after the last processed batch
    pub version: u64,
    /// The batch was queued behind a dispatch already in progress
    pub deferred: bool,
}

impl DispatchReport {
    fn deferred() -> Self {
        DispatchReport {
            deferred: true,
            ..Default::default()
        }
    }
}

struct DispatchGuard<'a>(&'a AtomicBool);

impl Drop for DispatchGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Applies host batches to the store and fans them out to listeners
pub struct UpdateDispatcher {
    store: BaseStore,
    listeners: Mutex<Vec<Weak<dyn BatchListener>>>,
    queue: Mutex<VecDeque<Vec<ModelUpdate>>>,
    dispatching: AtomicBool,
    isolate_panics: bool,
}

impl UpdateDispatcher {
    pub fn new(store: BaseStore) -> Self {
        Self::with_isolation(store, true)
    }

    pub fn with_isolation(store: BaseStore, isolate_panics: bool) -> Self {
        UpdateDispatcher {
            store,
            listeners: Mutex::new(Vec::new()),
            queue: Mutex::new(VecDeque::new()),
            dispatching: AtomicBool::new(false),
            isolate_panics,
        }
    }

    pub fn store(&self) -> &BaseStore {
        &self.store
    }

    pub fn isolate_panics(&self) -> bool {
        self.isolate_panics
    }

    /// Register a listener. Dropped listeners are pruned lazily.
    pub fn register(&self, listener: Weak<dyn BatchListener>) {
        self.listeners.lock().push(listener);
    }

    /// Number of listeners still alive
    pub fn listener_count(&self) -> usize {
        self.live_listeners().len()
    }

    fn live_listeners(&self) -> Vec<Arc<dyn BatchListener>> {
        let mut listeners = self.listeners.lock();
        listeners.retain(|l| l.strong_count() > 0);
        listeners.iter().filter_map(Weak::upgrade).collect()
    }

    /// Apply one ordered batch and notify every affected watcher once
    pub fn apply_batch(&self, updates: Vec<ModelUpdate>) -> DispatchReport {
        self.queue.lock().push_back(updates);

        if self.dispatching.swap(true, Ordering::AcqRel) {
            debug!("batch queued behind dispatch in progress");
            return DispatchReport::deferred();
        }

        let mut report = DispatchReport::default();
        loop {
            {
                let _guard = DispatchGuard(&self.dispatching);
                loop {
                    let next = self.queue.lock().pop_front();
                    let Some(batch) = next else { break };
                    self.dispatch_one(&batch, &mut report);
                }
            }
            // Another caller may have queued between the drain and the reset.
            if self.queue.lock().is_empty() || self.dispatching.swap(true, Ordering::AcqRel) {
                break;
            }
        }
        report
    }

    fn dispatch_one(&self, batch: &[ModelUpdate], report: &mut DispatchReport) {
        let listeners = self.live_listeners();

        self.store.read(|data| {
            for listener in &listeners {
                listener.before_batch(data);
            }
        });

        let version = self.store.apply_updates(batch);
        let ctx = BatchContext::new(batch, version, self.isolate_panics);

        let mut notified = 0;
        for listener in &listeners {
            let outcome = listener.handle_batch(&ctx);
            if !outcome.notified_keys.is_empty() {
                trace!(
                    model = listener.label(),
                    keys = ?outcome.notified_keys,
                    "watchers notified"
                );
            }
            notified += outcome.notified_keys.len();
            report.invoked_callbacks += outcome.invoked;
            report.failed_callbacks += outcome.failed;
        }

        report.batches += 1;
        report.updates += batch.len();
        report.notified_keys += notified;
        report.version = version;

        debug!(
            version,
            updates = batch.len(),
            listeners = listeners.len(),
            notified,
            "applied model update batch"
        );
    }
}
