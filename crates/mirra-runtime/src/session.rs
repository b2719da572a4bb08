//! Session - one host connection and its root models

use std::sync::Arc;

use mirra_core::ModelUpdate;
use mirra_models::{Base, Cursor, Host, ModelContext};
use mirra_state::{BaseData, BaseStore, DispatchReport, UpdateDispatcher};
use tracing::{info, trace};

use crate::SessionConfig;

/// Owns the store and dispatcher for one host and hands out the root
/// models. Host batches are applied for as long as the session is alive.
pub struct Session {
    config: SessionConfig,
    host: Arc<dyn Host>,
    dispatcher: Arc<UpdateDispatcher>,
    base: Arc<Base>,
    cursor: Arc<Cursor>,
}

impl Session {
    pub fn new(host: Arc<dyn Host>) -> Self {
        Self::with_config(host, SessionConfig::default())
    }

    pub fn with_config(host: Arc<dyn Host>, config: SessionConfig) -> Self {
        let store = BaseStore::new(BaseData::new(host.initial_base_data()));
        let dispatcher = Arc::new(UpdateDispatcher::with_isolation(
            store,
            config.isolate_watcher_panics,
        ));

        let ctx = ModelContext::new(Arc::clone(&host), Arc::clone(&dispatcher));
        let base = Base::new(ctx.clone());
        let cursor = Cursor::new(ctx);

        let weak = Arc::downgrade(&dispatcher);
        host.subscribe_to_model_updates(Arc::new(move |updates: Vec<ModelUpdate>| {
            match weak.upgrade() {
                Some(dispatcher) => {
                    dispatcher.apply_batch(updates);
                }
                None => trace!(updates = updates.len(), "session closed, dropping update batch"),
            }
        }));

        info!(
            base = %base.id(),
            tables = base.tables().len(),
            isolate_watcher_panics = config.isolate_watcher_panics,
            "session started"
        );

        Session {
            config,
            host,
            dispatcher,
            base,
            cursor,
        }
    }

    pub fn base(&self) -> &Arc<Base> {
        &self.base
    }

    pub fn cursor(&self) -> &Arc<Cursor> {
        &self.cursor
    }

    pub fn host(&self) -> &Arc<dyn Host> {
        &self.host
    }

    pub fn store(&self) -> &BaseStore {
        self.dispatcher.store()
    }

    pub fn dispatcher(&self) -> &Arc<UpdateDispatcher> {
        &self.dispatcher
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Apply a batch directly, bypassing the host channel
    pub fn apply_model_updates(&self, updates: Vec<ModelUpdate>) -> DispatchReport {
        self.dispatcher.apply_batch(updates)
    }
}
