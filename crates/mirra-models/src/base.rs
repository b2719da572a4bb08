//! Base - the root entity owning every table

use std::collections::HashMap;
use std::sync::Arc;

use mirra_core::{ModelUpdate, Path, TableId};
use mirra_state::BaseData;
use parking_lot::Mutex;
use serde_json::Value;

use crate::table::{member_ids, member_set, retain_members};
use crate::{paths, ModelContext, ModelCore, Table, Watchable};

watch_keys! {
    pub enum BaseKey for "base" {
        Name => "name",
        Tables => "tables",
    }
    requires_data: []
}

pub struct Base {
    core: ModelCore<BaseKey>,
    tables: Mutex<HashMap<TableId, Arc<Table>>>,
    tables_before: Mutex<Option<Vec<String>>>,
}

batch_listener!(Base);

impl Base {
    pub fn new(ctx: ModelContext) -> Arc<Self> {
        let base = Arc::new(Base {
            core: ModelCore::new("base", ctx.clone()),
            tables: Mutex::new(HashMap::new()),
            tables_before: Mutex::new(None),
        });
        ctx.register(&base);
        base
    }

    pub fn id(&self) -> String {
        self.core.store().get_str(&Path::from_keys(["id"])).unwrap_or_default()
    }

    pub fn name(&self) -> String {
        self.core.store().get_str(&Path::from_keys(["name"])).unwrap_or_default()
    }

    /// Tables in `tableOrder`, falling back to stored order
    pub fn tables(&self) -> Vec<Arc<Table>> {
        let ids = self.core.store().read(|data| {
            let order = data.get(&paths::table_order()).and_then(Value::as_array).map(|order| {
                order
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_owned)
                    .collect::<Vec<_>>()
            });
            order.unwrap_or_else(|| member_ids(data, &paths::tables_by_id()))
        });
        ids.iter().map(|id| self.table_handle(id)).collect()
    }

    pub fn table_by_id(&self, id: &str) -> Option<Arc<Table>> {
        let exists = self.core.store().contains(&paths::table(&TableId::from(id)));
        exists.then(|| self.table_handle(id))
    }

    pub fn table_by_name(&self, name: &str) -> Option<Arc<Table>> {
        self.tables().into_iter().find(|table| table.name() == name)
    }

    fn table_handle(&self, id: &str) -> Arc<Table> {
        let id = TableId::from(id);
        let mut tables = self.tables.lock();
        let table = tables
            .entry(id.clone())
            .or_insert_with(|| Table::new(self.core.context().clone(), id));
        Arc::clone(table)
    }
}

impl Watchable for Base {
    type Key = BaseKey;

    fn core(&self) -> &ModelCore<BaseKey> {
        &self.core
    }

    fn interest_paths(&self, key: BaseKey, _data: &BaseData) -> Vec<Path> {
        match key {
            BaseKey::Name => vec![Path::from_keys(["name"])],
            BaseKey::Tables => vec![paths::table_order()],
        }
    }

    fn prune_handles(&self, data: &BaseData) {
        retain_members(&self.tables, &member_set(data, &paths::tables_by_id()));
    }

    fn observe_before_batch(&self, data: &BaseData) {
        *self.tables_before.lock() = Some(member_set(data, &paths::tables_by_id()));
    }

    fn derived_changes(&self, data: &BaseData, _updates: &[ModelUpdate]) -> Vec<BaseKey> {
        match self.tables_before.lock().take() {
            Some(before) if before != member_set(data, &paths::tables_by_id()) => vec![BaseKey::Tables],
            _ => Vec::new(),
        }
    }
}
