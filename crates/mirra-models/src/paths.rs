//! Well-known locations in the base data tree

use mirra_core::{FieldId, Path, RecordId, TableId, ViewId};

pub const ACTIVE_TABLE_ID: &str = "activeTableId";
pub const TABLES_BY_ID: &str = "tablesById";
pub const TABLE_ORDER: &str = "tableOrder";
pub const FIELDS_BY_ID: &str = "fieldsById";
pub const VIEWS_BY_ID: &str = "viewsById";
pub const VIEW_ORDER: &str = "viewOrder";
pub const RECORDS_BY_ID: &str = "recordsById";
pub const CURSOR_DATA: &str = "cursorData";
pub const SELECTED_RECORD_ID_SET: &str = "selectedRecordIdSet";
pub const SELECTED_FIELD_ID_SET: &str = "selectedFieldIdSet";

pub fn active_table_id() -> Path {
    Path::from_keys([ACTIVE_TABLE_ID])
}

pub fn table_order() -> Path {
    Path::from_keys([TABLE_ORDER])
}

pub fn tables_by_id() -> Path {
    Path::from_keys([TABLES_BY_ID])
}

pub fn table(table_id: &TableId) -> Path {
    tables_by_id().child(table_id)
}

pub fn fields_by_id(table_id: &TableId) -> Path {
    table(table_id).child(FIELDS_BY_ID)
}

pub fn field(table_id: &TableId, field_id: &FieldId) -> Path {
    fields_by_id(table_id).child(field_id)
}

pub fn views_by_id(table_id: &TableId) -> Path {
    table(table_id).child(VIEWS_BY_ID)
}

pub fn view(table_id: &TableId, view_id: &ViewId) -> Path {
    views_by_id(table_id).child(view_id)
}

pub fn records_by_id(table_id: &TableId) -> Path {
    table(table_id).child(RECORDS_BY_ID)
}

pub fn record(table_id: &TableId, record_id: &RecordId) -> Path {
    records_by_id(table_id).child(record_id)
}

pub fn cursor_data() -> Path {
    Path::from_keys([CURSOR_DATA])
}

pub fn selected_record_id_set() -> Path {
    cursor_data().child(SELECTED_RECORD_ID_SET)
}

pub fn selected_field_id_set() -> Path {
    cursor_data().child(SELECTED_FIELD_ID_SET)
}
