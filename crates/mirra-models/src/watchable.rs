//! Watchable model base
//!
//! Every entity model owns a `ModelCore`: its watch registry, its load
//! state and the shared context (store, host, dispatcher). The
//! `Watchable` trait supplies watch/unwatch, the lazy load/unload
//! lifecycle and the per-batch notification logic on top of a handful of
//! model-specific hooks.

use std::str::FromStr;
use std::sync::{Arc, Weak};

use futures::future::{self, BoxFuture, FutureExt, Shared};
use mirra_core::{MirraError, MirraResult, ModelUpdate, Path};
use mirra_state::{
    affected_keys, callback, invoke_callbacks, BaseData, BaseStore, BatchContext, BatchListener,
    InvocationOutcome, ListenerReport, UpdateDispatcher, WatchCallback, WatchKey, WatchRegistry,
};
use parking_lot::Mutex;
use serde_json::Value;
use tokio::runtime::Handle;
use tracing::{debug, warn};

use crate::{Host, MutationGateway};

/// In-flight fetch-and-subscribe, shared by every caller that asks for it
pub type LoadFuture = Shared<BoxFuture<'static, MirraResult<()>>>;

#[derive(Default)]
pub(crate) struct LoadState {
    loaded: bool,
    /// Bumped on every unload; a fetch started under an older generation
    /// is stale when it completes.
    generation: u64,
    in_flight: Option<LoadFuture>,
}

/// Shared collaborators every model is bound to
#[derive(Clone)]
pub struct ModelContext {
    store: BaseStore,
    host: Arc<dyn Host>,
    dispatcher: Arc<UpdateDispatcher>,
}

impl ModelContext {
    pub fn new(host: Arc<dyn Host>, dispatcher: Arc<UpdateDispatcher>) -> Self {
        ModelContext {
            store: dispatcher.store().clone(),
            host,
            dispatcher,
        }
    }

    pub fn store(&self) -> &BaseStore {
        &self.store
    }

    pub fn host(&self) -> &Arc<dyn Host> {
        &self.host
    }

    pub fn dispatcher(&self) -> &Arc<UpdateDispatcher> {
        &self.dispatcher
    }

    /// Start delivering batches to `model`
    pub fn register<M: BatchListener + 'static>(&self, model: &Arc<M>) {
        let weak: Weak<dyn BatchListener> = Arc::downgrade(model) as Weak<dyn BatchListener>;
        self.dispatcher.register(weak);
    }

    pub fn mutations(&self) -> MutationGateway {
        MutationGateway::new(Arc::clone(&self.host), self.store.clone())
    }
}

/// Watch registry, load state and context of one model instance
pub struct ModelCore<K: WatchKey> {
    label: String,
    ctx: ModelContext,
    watchers: Mutex<WatchRegistry<K>>,
    load: Mutex<LoadState>,
}

impl<K: WatchKey> ModelCore<K> {
    pub fn new(label: impl Into<String>, ctx: ModelContext) -> Self {
        ModelCore {
            label: label.into(),
            ctx,
            watchers: Mutex::new(WatchRegistry::new()),
            load: Mutex::new(LoadState::default()),
        }
    }

    /// Short label for logs, e.g. `field:fld1`
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn context(&self) -> &ModelContext {
        &self.ctx
    }

    pub fn store(&self) -> &BaseStore {
        &self.ctx.store
    }

    pub fn host(&self) -> &Arc<dyn Host> {
        &self.ctx.host
    }

    pub fn isolate_panics(&self) -> bool {
        self.ctx.dispatcher.isolate_panics()
    }

    /// Watched keys, in the order they were first watched
    pub fn watched_keys(&self) -> Vec<K> {
        self.watchers.lock().keys()
    }

    pub fn has_watchers(&self, key: K) -> bool {
        self.watchers.lock().has_watchers(key)
    }

    /// Total number of watch registrations
    pub fn watcher_count(&self) -> usize {
        self.watchers.lock().len()
    }

    /// Invoke the callbacks of `key`. The registry lock is released before
    /// any callback runs, so callbacks may watch or unwatch freely.
    pub fn notify(&self, key: K, isolate: bool) -> InvocationOutcome {
        let callbacks = self.watchers.lock().callbacks(key);
        invoke_callbacks(&self.label, key, &callbacks, isolate)
    }

    pub fn is_loaded(&self) -> bool {
        self.load.lock().loaded
    }

    pub fn is_loading(&self) -> bool {
        self.load.lock().in_flight.is_some()
    }
}

/// Behavior shared by every entity model
pub trait Watchable: Send + Sync + Sized + 'static {
    type Key: WatchKey + FromStr<Err = MirraError>;

    fn core(&self) -> &ModelCore<Self::Key>;

    /// Tree paths backing `key`, resolved against `data`
    fn interest_paths(&self, key: Self::Key, data: &BaseData) -> Vec<Path>;

    /// Key that reports the load state, for models with lazily loaded data
    fn load_state_key() -> Option<Self::Key> {
        None
    }

    /// Fetch-and-subscribe for the model's backing data
    fn fetch_data(self: &Arc<Self>) -> BoxFuture<'static, MirraResult<Value>> {
        future::ready(Ok(Value::Null)).boxed()
    }

    /// Place fetched data into the store
    fn install_data(&self, _data: Value) {}

    /// Release the host subscription made by `fetch_data`
    fn teardown_data(&self) {}

    /// Look at the tree before a batch is applied
    fn observe_before_batch(&self, _data: &BaseData) {}

    /// Drop cached child handles whose entities are gone from `data`
    fn prune_handles(&self, _data: &BaseData) {}

    /// Keys changed by a batch in ways path matching cannot see
    fn derived_changes(&self, _data: &BaseData, _updates: &[ModelUpdate]) -> Vec<Self::Key> {
        Vec::new()
    }

    /// Register `callback` under `key` and hand it back for `unwatch`.
    ///
    /// Watching a key that needs backing data starts the load on the
    /// current tokio runtime, at most once.
    fn watch(self: &Arc<Self>, key: Self::Key, callback: WatchCallback<Self::Key>) -> WatchCallback<Self::Key> {
        self.core().watchers.lock().add(key, Arc::clone(&callback));

        if key.requires_data() && Self::load_state_key().is_some() {
            let (load, started) = begin_load(self);
            if started {
                spawn_load(self.core().label(), load);
            }
        }
        callback
    }

    fn watch_fn<F>(self: &Arc<Self>, key: Self::Key, f: F) -> WatchCallback<Self::Key>
    where
        F: Fn(Self::Key) + Send + Sync + 'static,
    {
        self.watch(key, callback(f))
    }

    /// Watch by wire name
    fn watch_by_name(
        self: &Arc<Self>,
        key: &str,
        callback: WatchCallback<Self::Key>,
    ) -> MirraResult<WatchCallback<Self::Key>> {
        let key = key.parse::<Self::Key>()?;
        Ok(self.watch(key, callback))
    }

    /// Remove the exact `(key, callback)` pair. Loaded data stays loaded
    /// until `unload_data`.
    fn unwatch(&self, key: Self::Key, callback: &WatchCallback<Self::Key>) -> bool {
        self.core().watchers.lock().remove(key, callback)
    }

    fn is_data_loaded(&self) -> bool {
        Self::load_state_key().is_none() || self.core().is_loaded()
    }

    /// Fetch-and-subscribe if needed. Concurrent callers share one fetch.
    fn load_data(self: &Arc<Self>) -> LoadFuture {
        begin_load(self).0
    }

    /// Drop the host subscription and mark the data unloaded. A fetch still
    /// in flight is discarded when it completes.
    fn unload_data(&self) {
        let Some(state_key) = Self::load_state_key() else {
            return;
        };
        let core = self.core();
        let was_loaded = {
            let mut state = core.load.lock();
            state.generation += 1;
            state.in_flight = None;
            std::mem::replace(&mut state.loaded, false)
        };
        if !was_loaded {
            return;
        }

        self.teardown_data();
        debug!(model = core.label(), "data unloaded");
        core.notify(state_key, core.isolate_panics());
    }

    /// Notify every watched key the batch affected, once each
    fn dispatch_batch(&self, batch: &BatchContext<'_>) -> ListenerReport {
        let core = self.core();
        core.store().read(|data| self.prune_handles(data));

        let mut report = ListenerReport::default();
        let keys = core.watched_keys();
        if keys.is_empty() {
            return report;
        }

        let (direct, derived) = core.store().read(|data| {
            let interests: Vec<_> = keys
                .iter()
                .map(|&key| (key, self.interest_paths(key, data)))
                .collect();
            (
                affected_keys(&interests, batch.updates()),
                self.derived_changes(data, batch.updates()),
            )
        });

        for key in keys {
            if direct.contains(&key) || derived.contains(&key) {
                report.record(key.name(), core.notify(key, batch.isolate_panics()));
            }
        }
        report
    }
}

fn begin_load<M: Watchable>(model: &Arc<M>) -> (LoadFuture, bool) {
    let mut state = model.core().load.lock();
    if state.loaded || M::load_state_key().is_none() {
        let done: BoxFuture<'static, MirraResult<()>> = future::ready(Ok(())).boxed();
        return (done.shared(), false);
    }
    if let Some(in_flight) = &state.in_flight {
        return (in_flight.clone(), false);
    }

    let generation = state.generation;
    let fetch = model.fetch_data();
    let weak = Arc::downgrade(model);
    let load = async move {
        let result = fetch.await;
        match weak.upgrade() {
            Some(model) => finish_load(model.as_ref(), generation, result),
            None => Err(MirraError::Unloaded),
        }
    }
    .boxed()
    .shared();

    debug!(model = model.core().label(), generation, "data load started");
    state.in_flight = Some(load.clone());
    (load, true)
}

fn finish_load<M: Watchable>(model: &M, generation: u64, result: MirraResult<Value>) -> MirraResult<()> {
    let core = model.core();
    let mut state = core.load.lock();

    if state.generation != generation {
        let superseded = state.loaded || state.in_flight.is_some();
        drop(state);
        if result.is_ok() && !superseded {
            model.teardown_data();
        }
        debug!(model = core.label(), generation, "discarded stale load result");
        return Err(MirraError::Unloaded);
    }

    state.in_flight = None;
    let data = match result {
        Ok(data) => data,
        Err(err) => {
            warn!(model = core.label(), error = %err, "data load failed");
            return Err(err);
        }
    };
    model.install_data(data);
    state.loaded = true;
    drop(state);

    debug!(model = core.label(), "data loaded");
    let isolate = core.isolate_panics();
    for key in core.watched_keys() {
        if key.requires_data() {
            core.notify(key, isolate);
        }
    }
    Ok(())
}

fn spawn_load(label: &str, load: LoadFuture) {
    match Handle::try_current() {
        Ok(handle) => {
            let label = label.to_owned();
            handle.spawn(async move {
                if let Err(err) = load.await {
                    debug!(model = %label, error = %err, "background load did not complete");
                }
            });
        }
        Err(_) => warn!(model = label, "no tokio runtime, data loads on the next load_data call"),
    }
}
