//! View - a named presentation of a table

use std::sync::Arc;

use mirra_core::{Path, TableId, ViewId};
use mirra_state::BaseData;

use crate::{paths, ModelContext, ModelCore, Watchable};

watch_keys! {
    pub enum ViewKey for "view" {
        Name => "name",
    }
    requires_data: []
}

pub struct View {
    core: ModelCore<ViewKey>,
    table_id: TableId,
    id: ViewId,
}

batch_listener!(View);
entity_handle!(View, ViewId);

impl View {
    pub fn new(ctx: ModelContext, table_id: TableId, id: ViewId) -> Arc<Self> {
        let view = Arc::new(View {
            core: ModelCore::new(format!("view:{id}"), ctx.clone()),
            table_id,
            id,
        });
        ctx.register(&view);
        view
    }

    pub fn id(&self) -> &ViewId {
        &self.id
    }

    pub fn parent_table_id(&self) -> &TableId {
        &self.table_id
    }

    pub fn name(&self) -> String {
        let path = paths::view(&self.table_id, &self.id).child("name");
        self.core.store().get_str(&path).unwrap_or_default()
    }

    pub fn is_deleted(&self) -> bool {
        !self.core.store().contains(&paths::view(&self.table_id, &self.id))
    }
}

impl Watchable for View {
    type Key = ViewKey;

    fn core(&self) -> &ModelCore<ViewKey> {
        &self.core
    }

    fn interest_paths(&self, key: ViewKey, _data: &BaseData) -> Vec<Path> {
        match key {
            ViewKey::Name => vec![paths::view(&self.table_id, &self.id).child("name")],
        }
    }
}
