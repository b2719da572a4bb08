//! Table - schema container for fields and views, plus lazily loaded
//! records

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use mirra_core::{FieldId, MirraResult, ModelUpdate, Path, RecordId, TableId, ViewId};
use mirra_state::BaseData;
use parking_lot::Mutex;
use serde_json::{Map, Value};

use crate::{paths, Field, ModelContext, ModelCore, Record, View, Watchable};

watch_keys! {
    /// Watchable properties of a table
    pub enum TableKey for "table" {
        Name => "name",
        Description => "description",
        PrimaryField => "primaryField",
        Fields => "fields",
        Views => "views",
        Records => "records",
        IsDataLoaded => "isDataLoaded",
    }
    requires_data: [Records, IsDataLoaded]
}

/// Ids of the members of the collection at `path`, in stored order
pub(crate) fn member_ids(data: &BaseData, path: &Path) -> Vec<String> {
    data.get_object(path)
        .map(|members| {
            members
                .iter()
                .filter(|(_, member)| !member.is_null())
                .map(|(id, _)| id.clone())
                .collect()
        })
        .unwrap_or_default()
}

/// Member ids sorted for order-insensitive comparison
pub(crate) fn member_set(data: &BaseData, path: &Path) -> Vec<String> {
    let mut ids = member_ids(data, path);
    ids.sort_unstable();
    ids
}

/// Keep only the cached handles whose id is still in `members`
pub(crate) fn retain_members<I: AsRef<str>, M>(cache: &Mutex<HashMap<I, M>>, members: &[String]) {
    cache
        .lock()
        .retain(|id, _| members.binary_search_by(|member| member.as_str().cmp(id.as_ref())).is_ok());
}

#[derive(Default)]
struct MembershipSnapshot {
    fields: Vec<String>,
    views: Vec<String>,
}

pub struct Table {
    core: ModelCore<TableKey>,
    id: TableId,
    fields: Mutex<HashMap<FieldId, Arc<Field>>>,
    views: Mutex<HashMap<ViewId, Arc<View>>>,
    records: Mutex<HashMap<RecordId, Arc<Record>>>,
    before: Mutex<Option<MembershipSnapshot>>,
}

batch_listener!(Table);
entity_handle!(Table, TableId);

impl Table {
    pub fn new(ctx: ModelContext, id: TableId) -> Arc<Self> {
        let table = Arc::new(Table {
            core: ModelCore::new(format!("table:{id}"), ctx.clone()),
            id,
            fields: Mutex::new(HashMap::new()),
            views: Mutex::new(HashMap::new()),
            records: Mutex::new(HashMap::new()),
            before: Mutex::new(None),
        });
        ctx.register(&table);
        table
    }

    pub fn id(&self) -> &TableId {
        &self.id
    }

    fn path(&self) -> Path {
        paths::table(&self.id)
    }

    pub fn name(&self) -> String {
        self.core.store().get_str(&self.path().child("name")).unwrap_or_default()
    }

    pub fn description(&self) -> Option<String> {
        self.core.store().get_str(&self.path().child("description"))
    }

    pub fn is_deleted(&self) -> bool {
        !self.core.store().contains(&self.path())
    }

    pub fn primary_field_id(&self) -> Option<FieldId> {
        self.core
            .store()
            .get_str(&self.path().child("primaryFieldId"))
            .map(FieldId::from)
    }

    pub fn primary_field(&self) -> Option<Arc<Field>> {
        self.field_by_id(self.primary_field_id()?.as_str())
    }

    /// Fields in stored order
    pub fn fields(&self) -> Vec<Arc<Field>> {
        let ids = self
            .core
            .store()
            .read(|data| member_ids(data, &paths::fields_by_id(&self.id)));
        ids.iter().map(|id| self.field_handle(id)).collect()
    }

    pub fn field_by_id(&self, id: &str) -> Option<Arc<Field>> {
        let exists = self
            .core
            .store()
            .contains(&paths::field(&self.id, &FieldId::from(id)));
        exists.then(|| self.field_handle(id))
    }

    pub fn field_by_name(&self, name: &str) -> Option<Arc<Field>> {
        self.fields().into_iter().find(|field| field.name() == name)
    }

    /// Views in `viewOrder`, falling back to stored order
    pub fn views(&self) -> Vec<Arc<View>> {
        let ids = self.core.store().read(|data| {
            let order = data
                .get(&self.path().child(paths::VIEW_ORDER))
                .and_then(Value::as_array)
                .map(|order| {
                    order
                        .iter()
                        .filter_map(Value::as_str)
                        .map(str::to_owned)
                        .collect::<Vec<_>>()
                });
            order.unwrap_or_else(|| member_ids(data, &paths::views_by_id(&self.id)))
        });
        ids.iter().map(|id| self.view_handle(id)).collect()
    }

    pub fn view_by_id(&self, id: &str) -> Option<Arc<View>> {
        let exists = self
            .core
            .store()
            .contains(&paths::view(&self.id, &ViewId::from(id)));
        exists.then(|| self.view_handle(id))
    }

    pub fn view_by_name(&self, name: &str) -> Option<Arc<View>> {
        self.views().into_iter().find(|view| view.name() == name)
    }

    /// Record ids, empty until record data is loaded
    pub fn record_ids(&self) -> Vec<RecordId> {
        if !self.is_data_loaded() {
            return Vec::new();
        }
        self.core
            .store()
            .read(|data| member_ids(data, &paths::records_by_id(&self.id)))
            .into_iter()
            .map(RecordId::from)
            .collect()
    }

    pub fn records(&self) -> Vec<Arc<Record>> {
        self.record_ids()
            .iter()
            .map(|id| self.record_handle(id.as_str()))
            .collect()
    }

    pub fn record_by_id(&self, id: &str) -> Option<Arc<Record>> {
        if !self.is_data_loaded() {
            return None;
        }
        let exists = self
            .core
            .store()
            .contains(&paths::record(&self.id, &RecordId::from(id)));
        exists.then(|| self.record_handle(id))
    }

    fn field_handle(&self, id: &str) -> Arc<Field> {
        let id = FieldId::from(id);
        let mut fields = self.fields.lock();
        let field = fields.entry(id.clone()).or_insert_with(|| {
            Field::new(self.core.context().clone(), self.id.clone(), id)
        });
        Arc::clone(field)
    }

    fn view_handle(&self, id: &str) -> Arc<View> {
        let id = ViewId::from(id);
        let mut views = self.views.lock();
        let view = views
            .entry(id.clone())
            .or_insert_with(|| View::new(self.core.context().clone(), self.id.clone(), id));
        Arc::clone(view)
    }

    fn record_handle(&self, id: &str) -> Arc<Record> {
        let id = RecordId::from(id);
        let mut records = self.records.lock();
        let record = records
            .entry(id.clone())
            .or_insert_with(|| Record::new(self.core.context().clone(), self.id.clone(), id));
        Arc::clone(record)
    }
}

impl Watchable for Table {
    type Key = TableKey;

    fn core(&self) -> &ModelCore<TableKey> {
        &self.core
    }

    fn interest_paths(&self, key: TableKey, _data: &BaseData) -> Vec<Path> {
        let table = self.path();
        match key {
            TableKey::Name => vec![table.child("name")],
            TableKey::Description => vec![table.child("description")],
            TableKey::PrimaryField => vec![table.child("primaryFieldId")],
            // Membership changes are picked up by `derived_changes`
            TableKey::Fields => Vec::new(),
            TableKey::Views => vec![table.child(paths::VIEW_ORDER)],
            TableKey::Records => vec![paths::records_by_id(&self.id)],
            TableKey::IsDataLoaded => Vec::new(),
        }
    }

    fn load_state_key() -> Option<TableKey> {
        Some(TableKey::IsDataLoaded)
    }

    fn fetch_data(self: &Arc<Self>) -> BoxFuture<'static, MirraResult<Value>> {
        let host = Arc::clone(self.core.host());
        let table_id = self.id.clone();
        async move { host.fetch_and_subscribe_to_table_data(&table_id).await }.boxed()
    }

    fn install_data(&self, data: Value) {
        let records = data
            .get(paths::RECORDS_BY_ID)
            .filter(|records| records.is_object())
            .cloned()
            .unwrap_or_else(|| Value::Object(Map::new()));
        self.core.store().install(&paths::records_by_id(&self.id), records);
    }

    fn teardown_data(&self) {
        self.core.host().unsubscribe_from_table_data(&self.id);
    }

    fn prune_handles(&self, data: &BaseData) {
        retain_members(&self.fields, &member_set(data, &paths::fields_by_id(&self.id)));
        retain_members(&self.views, &member_set(data, &paths::views_by_id(&self.id)));
        retain_members(&self.records, &member_set(data, &paths::records_by_id(&self.id)));
    }

    fn observe_before_batch(&self, data: &BaseData) {
        let snapshot = MembershipSnapshot {
            fields: member_set(data, &paths::fields_by_id(&self.id)),
            views: member_set(data, &paths::views_by_id(&self.id)),
        };
        *self.before.lock() = Some(snapshot);
    }

    fn derived_changes(&self, data: &BaseData, _updates: &[ModelUpdate]) -> Vec<TableKey> {
        let Some(before) = self.before.lock().take() else {
            return Vec::new();
        };
        let mut changed = Vec::new();
        if before.fields != member_set(data, &paths::fields_by_id(&self.id)) {
            changed.push(TableKey::Fields);
        }
        if before.views != member_set(data, &paths::views_by_id(&self.id)) {
            changed.push(TableKey::Views);
        }
        changed
    }
}
