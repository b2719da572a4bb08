//! Cursor - where the user is and what they have selected
//!
//! The active table and view are always present in the base tree. The
//! selection sets live under `cursorData` and are only mirrored after the
//! cursor data has been fetched and subscribed to.

use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use mirra_core::{FieldId, MirraResult, ModelUpdate, Path, RecordId, TableId, ViewId};
use mirra_state::BaseData;
use parking_lot::Mutex;
use serde_json::Value;
use tracing::debug;

use crate::{paths, FieldRef, ModelContext, ModelCore, RecordRef, TableRef, ViewRef, Watchable};

watch_keys! {
    /// Watchable properties of the cursor
    pub enum CursorKey for "cursor" {
        IsDataLoaded => "isDataLoaded",
        ActiveTableId => "activeTableId",
        ActiveViewId => "activeViewId",
        SelectedRecordIds => "selectedRecordIds",
        SelectedFieldIds => "selectedFieldIds",
    }
    requires_data: [IsDataLoaded, SelectedRecordIds, SelectedFieldIds]
}

pub struct Cursor {
    core: ModelCore<CursorKey>,
    /// Active view id resolved from the tree as it was before the batch
    /// currently being dispatched
    active_view_before: Mutex<Option<String>>,
}

batch_listener!(Cursor);

impl Cursor {
    pub fn new(ctx: ModelContext) -> Arc<Self> {
        let cursor = Arc::new(Cursor {
            core: ModelCore::new("cursor", ctx.clone()),
            active_view_before: Mutex::new(None),
        });
        ctx.register(&cursor);
        cursor
    }

    pub fn active_table_id(&self) -> Option<TableId> {
        self.core.store().read(|data| active_table(data).map(TableId::from))
    }

    /// The active table's own `activeViewId`
    pub fn active_view_id(&self) -> Option<ViewId> {
        self.core.store().read(|data| active_view(data).map(ViewId::from))
    }

    /// Selected record ids, empty until the cursor data is loaded
    pub fn selected_record_ids(&self) -> Vec<RecordId> {
        self.selection(&paths::selected_record_id_set())
            .into_iter()
            .map(RecordId::from)
            .collect()
    }

    /// Selected field ids, empty until the cursor data is loaded
    pub fn selected_field_ids(&self) -> Vec<FieldId> {
        self.selection(&paths::selected_field_id_set())
            .into_iter()
            .map(FieldId::from)
            .collect()
    }

    pub fn is_record_selected<'a>(&self, record: impl Into<RecordRef<'a>>) -> bool {
        let id = record.into().id();
        self.is_member(&paths::selected_record_id_set(), id)
    }

    pub fn is_field_selected<'a>(&self, field: impl Into<FieldRef<'a>>) -> bool {
        let id = field.into().id();
        self.is_member(&paths::selected_field_id_set(), id)
    }

    /// Ask the host to switch tables. Local state changes only when the
    /// host pushes the resulting update.
    pub fn set_active_table<'a>(&self, table: impl Into<TableRef<'a>>) {
        let table_id = TableId::from(table.into().id());
        debug!(table = %table_id, "requesting active table change");
        self.core.host().set_active_view_or_table(&table_id, None);
    }

    /// Ask the host to switch to `view` of `table`
    pub fn set_active_view<'a, 'b>(&self, table: impl Into<TableRef<'a>>, view: impl Into<ViewRef<'b>>) {
        let table_id = TableId::from(table.into().id());
        let view_id = ViewId::from(view.into().id());
        debug!(table = %table_id, view = %view_id, "requesting active view change");
        self.core.host().set_active_view_or_table(&table_id, Some(&view_id));
    }

    fn selection(&self, path: &Path) -> Vec<String> {
        if !self.is_data_loaded() {
            return Vec::new();
        }
        self.core.store().read(|data| {
            data.get_object(path)
                .map(|set| {
                    set.iter()
                        .filter(|(_, selected)| **selected == Value::Bool(true))
                        .map(|(id, _)| id.clone())
                        .collect()
                })
                .unwrap_or_default()
        })
    }

    fn is_member(&self, path: &Path, id: &str) -> bool {
        self.is_data_loaded()
            && self
                .core
                .store()
                .read(|data| data.get(&path.child(id)) == Some(&Value::Bool(true)))
    }
}

fn active_table(data: &BaseData) -> Option<&str> {
    data.get_str(&paths::active_table_id())
}

fn active_view(data: &BaseData) -> Option<&str> {
    let table = TableId::from(active_table(data)?);
    data.get_str(&paths::table(&table).child("activeViewId"))
}

impl Watchable for Cursor {
    type Key = CursorKey;

    fn core(&self) -> &ModelCore<CursorKey> {
        &self.core
    }

    fn interest_paths(&self, key: CursorKey, data: &BaseData) -> Vec<Path> {
        match key {
            CursorKey::IsDataLoaded => Vec::new(),
            CursorKey::ActiveTableId => vec![paths::active_table_id()],
            CursorKey::ActiveViewId => active_table(data)
                .map(|table| vec![paths::table(&TableId::from(table)).child("activeViewId")])
                .unwrap_or_default(),
            CursorKey::SelectedRecordIds => vec![paths::selected_record_id_set()],
            CursorKey::SelectedFieldIds => vec![paths::selected_field_id_set()],
        }
    }

    fn load_state_key() -> Option<CursorKey> {
        Some(CursorKey::IsDataLoaded)
    }

    fn fetch_data(self: &Arc<Self>) -> BoxFuture<'static, MirraResult<Value>> {
        let host = Arc::clone(self.core.host());
        async move { host.fetch_and_subscribe_to_cursor_data().await }.boxed()
    }

    fn install_data(&self, data: Value) {
        self.core.store().install(&paths::cursor_data(), data);
    }

    fn teardown_data(&self) {
        self.core.host().unsubscribe_from_cursor_data();
    }

    fn observe_before_batch(&self, data: &BaseData) {
        *self.active_view_before.lock() = active_view(data).map(str::to_owned);
    }

    /// Switching tables changes the active view without touching its path
    fn derived_changes(&self, data: &BaseData, updates: &[ModelUpdate]) -> Vec<CursorKey> {
        let before = self.active_view_before.lock().take();
        let table_switched = updates
            .iter()
            .any(|update| update.path.is_compatible_with(&paths::active_table_id()));
        if table_switched && before.as_deref() != active_view(data) {
            vec![CursorKey::ActiveViewId]
        } else {
            Vec::new()
        }
    }
}
