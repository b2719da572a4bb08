//! Record - one row of a table whose record data has been loaded

use std::sync::Arc;

use mirra_core::{Path, RecordId, TableId};
use mirra_state::BaseData;
use serde_json::Value;

use crate::{paths, FieldRef, ModelContext, ModelCore, Watchable};

watch_keys! {
    pub enum RecordKey for "record" {
        CellValues => "cellValues",
        CommentCount => "commentCount",
    }
    requires_data: []
}

pub struct Record {
    core: ModelCore<RecordKey>,
    table_id: TableId,
    id: RecordId,
}

batch_listener!(Record);
entity_handle!(Record, RecordId);

impl Record {
    pub fn new(ctx: ModelContext, table_id: TableId, id: RecordId) -> Arc<Self> {
        let record = Arc::new(Record {
            core: ModelCore::new(format!("record:{id}"), ctx.clone()),
            table_id,
            id,
        });
        ctx.register(&record);
        record
    }

    pub fn id(&self) -> &RecordId {
        &self.id
    }

    pub fn parent_table_id(&self) -> &TableId {
        &self.table_id
    }

    fn path(&self) -> Path {
        paths::record(&self.table_id, &self.id)
    }

    /// Value of one cell; `None` for empty cells and unknown fields
    pub fn cell_value<'a>(&self, field: impl Into<FieldRef<'a>>) -> Option<Value> {
        let path = self.path().child("cellValuesByFieldId").child(field.into().id());
        self.core.store().get(&path)
    }

    pub fn comment_count(&self) -> u64 {
        self.core
            .store()
            .get(&self.path().child("commentCount"))
            .and_then(|count| count.as_u64())
            .unwrap_or_default()
    }

    pub fn created_time(&self) -> Option<String> {
        self.core.store().get_str(&self.path().child("createdTime"))
    }

    pub fn is_deleted(&self) -> bool {
        !self.core.store().contains(&self.path())
    }
}

impl Watchable for Record {
    type Key = RecordKey;

    fn core(&self) -> &ModelCore<RecordKey> {
        &self.core
    }

    fn interest_paths(&self, key: RecordKey, _data: &BaseData) -> Vec<Path> {
        match key {
            RecordKey::CellValues => vec![self.path().child("cellValuesByFieldId")],
            RecordKey::CommentCount => vec![self.path().child("commentCount")],
        }
    }
}
