use std::sync::Arc;

use mirra_core::{FieldId, MirraError, ModelUpdate, RecordId, TableId};
use mirra_models::{CursorKey, Field, FieldKey, ModelContext, RecordKey, TableKey, Watchable};
use mirra_state::WatchCallback;
use parking_lot::Mutex;
use serde_json::json;

use mirra_test::*;

/// Let spawned loads run on the current-thread runtime
async fn settle() {
    for _ in 0..8 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test]
async fn test_concurrent_watches_share_one_fetch() {
    let host = MockHost::project_tracker_example();
    let session = host.session();
    let cursor = session.cursor();
    host.hold_fetches();

    let probe = WatchProbe::new();
    cursor.watch(CursorKey::SelectedRecordIds, probe.callback());
    cursor.watch(CursorKey::SelectedFieldIds, probe.callback());
    cursor.watch(CursorKey::IsDataLoaded, probe.callback());
    settle().await;

    let first = cursor.load_data();
    let second = cursor.load_data();
    host.release_fetches();
    let (first, second) = futures::join!(first, second);

    assert_eq!(first, Ok(()));
    assert_eq!(second, Ok(()));
    assert_eq!(host.cursor_fetches(), 1);
    assert!(cursor.is_data_loaded());
    // Each watched data key hears about the load once
    assert_eq!(probe.count_of(CursorKey::IsDataLoaded), 1);
    assert_eq!(probe.count_of(CursorKey::SelectedRecordIds), 1);
    assert_eq!(probe.count_of(CursorKey::SelectedFieldIds), 1);

    // Loaded: further calls resolve without fetching
    cursor.load_data().await.unwrap();
    cursor.watch(CursorKey::SelectedRecordIds, probe.callback());
    settle().await;
    assert_eq!(host.cursor_fetches(), 1);
}

#[tokio::test]
async fn test_late_fetch_result_after_unload_is_discarded() {
    let host = MockHost::project_tracker_example();
    let session = host.session();
    let cursor = session.cursor();
    host.set_cursor_data(Ok(json!({
        "selectedRecordIdSet": {"recA": true},
        "selectedFieldIdSet": {}
    })));
    host.hold_fetches();

    let probe = WatchProbe::new();
    cursor.watch(CursorKey::IsDataLoaded, probe.callback());
    let pending = cursor.load_data();
    settle().await;
    assert_eq!(host.cursor_fetches(), 1);

    cursor.unload_data();
    host.release_fetches();

    assert_eq!(pending.await, Err(MirraError::Unloaded));
    assert!(!cursor.is_data_loaded());
    assert!(cursor.selected_record_ids().is_empty());
    // Never loaded, so nothing to report; the stale subscription is released
    assert_eq!(probe.count(), 0);
    assert_eq!(host.cursor_unsubscribes(), 1);
}

#[tokio::test]
async fn test_reload_after_unload() {
    let host = MockHost::project_tracker_example();
    let session = host.session();
    let cursor = session.cursor();

    cursor.load_data().await.unwrap();
    cursor.unload_data();
    assert!(!cursor.is_data_loaded());

    cursor.load_data().await.unwrap();
    assert!(cursor.is_data_loaded());
    assert_eq!(host.cursor_fetches(), 2);
    assert_eq!(host.cursor_unsubscribes(), 1);
}

#[tokio::test]
async fn test_fetch_failure_is_propagated_and_retryable() {
    let host = MockHost::project_tracker_example();
    let session = host.session();
    let cursor = session.cursor();
    host.set_cursor_data(Err(MirraError::Transport("host went away".into())));

    let result = cursor.load_data().await;
    assert_eq!(result, Err(MirraError::Transport("host went away".into())));
    assert!(!cursor.is_data_loaded());

    host.set_cursor_data(Ok(empty_cursor_data()));
    cursor.load_data().await.unwrap();
    assert!(cursor.is_data_loaded());
    assert_eq!(host.cursor_fetches(), 2);
}

#[tokio::test]
async fn test_unwatch_keeps_data_loaded() {
    let host = MockHost::project_tracker_example();
    let session = host.session();
    let cursor = session.cursor();

    let probe = WatchProbe::new();
    let callback = cursor.watch(CursorKey::SelectedRecordIds, probe.callback());
    cursor.load_data().await.unwrap();

    assert!(cursor.unwatch(CursorKey::SelectedRecordIds, &callback));
    assert!(!cursor.unwatch(CursorKey::SelectedRecordIds, &callback));
    assert!(cursor.is_data_loaded());
    assert_eq!(host.cursor_unsubscribes(), 0);
}

#[test]
fn test_callback_may_unwatch_itself() {
    let host = MockHost::project_tracker_example();
    let session = host.session();
    let table = session.base().table_by_id(DESIGN_PROJECTS_TABLE).unwrap();
    let name_field = table.field_by_id(DESIGN_PROJECTS_NAME_FIELD).unwrap();

    let calls = Arc::new(Mutex::new(0));
    let own_handle: Arc<Mutex<Option<WatchCallback<FieldKey>>>> = Arc::new(Mutex::new(None));
    let callback = {
        let calls = Arc::clone(&calls);
        let own_handle = Arc::clone(&own_handle);
        let field = Arc::downgrade(&name_field);
        mirra_state::callback(move |key: FieldKey| {
            *calls.lock() += 1;
            let handle = own_handle.lock().take();
            if let (Some(field), Some(handle)) = (field.upgrade(), handle) {
                assert!(field.unwatch(key, &handle));
            }
        })
    };
    *own_handle.lock() = Some(name_field.watch(FieldKey::Name, callback));

    let rename = |name: &str| {
        vec![ModelUpdate::set(
            [
                "tablesById",
                DESIGN_PROJECTS_TABLE,
                "fieldsById",
                DESIGN_PROJECTS_NAME_FIELD,
                "name",
            ],
            json!(name),
        )]
    };
    host.trigger_model_updates(rename("Project"));
    host.trigger_model_updates(rename("Project name"));

    assert_eq!(*calls.lock(), 1);
    assert_eq!(name_field.name(), "Project name");
}

#[tokio::test]
async fn test_table_records_load_and_unload() {
    let host = MockHost::project_tracker_example();
    let session = host.session();
    let table = session.base().table_by_name("Design projects").unwrap();
    assert!(!table.is_data_loaded());
    assert!(table.record_ids().is_empty());
    assert!(table.record_by_id("recA").is_none());

    let probe = WatchProbe::new();
    table.watch(TableKey::Records, probe.callback());
    table.load_data().await.unwrap();

    assert_eq!(host.table_fetches(), vec![TableId::from(DESIGN_PROJECTS_TABLE)]);
    assert_eq!(table.record_ids(), vec!["recA", "recB"]);
    let record = table.record_by_id("recA").unwrap();
    assert_eq!(record.id(), &RecordId::from("recA"));
    assert_eq!(record.cell_value(DESIGN_PROJECTS_NAME_FIELD), Some(json!("Coffee packaging")));
    assert_eq!(record.cell_value(CLIENT_FIELD), None);
    assert_eq!(record.comment_count(), 2);
    assert_eq!(probe.count_of(TableKey::Records), 1);

    table.unload_data();
    assert!(table.record_ids().is_empty());
    assert_eq!(host.table_unsubscribes(), vec![TableId::from(DESIGN_PROJECTS_TABLE)]);
}

#[tokio::test]
async fn test_table_without_record_data_fails_to_load() {
    let host = MockHost::project_tracker_example();
    let session = host.session();
    let clients = session.base().table_by_id(CLIENTS_TABLE).unwrap();

    let result = clients.load_data().await;

    assert!(matches!(result, Err(MirraError::Transport(_))));
    assert!(!clients.is_data_loaded());
}

#[tokio::test]
async fn test_record_cell_values_watch() {
    let host = MockHost::project_tracker_example();
    let session = host.session();
    let table = session.base().table_by_id(DESIGN_PROJECTS_TABLE).unwrap();
    table.load_data().await.unwrap();
    let record = table.record_by_id("recB").unwrap();

    let probe = WatchProbe::new();
    record.watch(RecordKey::CellValues, probe.callback());
    record.watch(RecordKey::CommentCount, probe.callback());

    host.trigger_model_updates(vec![ModelUpdate::set(
        [
            "tablesById",
            DESIGN_PROJECTS_TABLE,
            "recordsById",
            "recB",
            "cellValuesByFieldId",
            COMPLETE_FIELD,
        ],
        json!(true),
    )]);

    assert_eq!(probe.calls(), vec![RecordKey::CellValues]);
    assert_eq!(record.cell_value(COMPLETE_FIELD), Some(json!(true)));

    host.trigger_model_updates(vec![ModelUpdate::delete([
        "tablesById",
        DESIGN_PROJECTS_TABLE,
        "recordsById",
        "recB",
    ])]);
    assert!(record.is_deleted());
    assert_eq!(probe.count(), 3);
}

#[test]
fn test_dropped_models_are_pruned() {
    let host = MockHost::project_tracker_example();
    let session = host.session();
    let before = session.dispatcher().listener_count();

    let ctx = ModelContext::new(Arc::clone(session.host()), Arc::clone(session.dispatcher()));
    let field = Field::new(
        ctx,
        TableId::from(DESIGN_PROJECTS_TABLE),
        FieldId::from(CLIENT_FIELD),
    );
    assert_eq!(session.dispatcher().listener_count(), before + 1);

    drop(field);
    assert_eq!(session.dispatcher().listener_count(), before);
}

fn field_path(field_id: &str) -> [&str; 4] {
    ["tablesById", DESIGN_PROJECTS_TABLE, "fieldsById", field_id]
}

#[test]
fn test_deleted_fields_release_their_handles() {
    let host = MockHost::project_tracker_example();
    let session = host.session();
    let table = session.base().table_by_id(DESIGN_PROJECTS_TABLE).unwrap();
    table.fields();
    let baseline = session.dispatcher().listener_count();

    let ids: Vec<String> = (0..20).map(|n| format!("fldScratch{n:02}")).collect();
    for id in &ids {
        host.trigger_model_updates(vec![ModelUpdate::set(
            field_path(id),
            json!({"id": id, "name": id, "type": "text", "typeOptions": null}),
        )]);
        assert!(table.field_by_id(id).is_some());
    }
    assert_eq!(session.dispatcher().listener_count(), baseline + ids.len());

    for id in &ids {
        host.trigger_model_updates(vec![ModelUpdate::delete(field_path(id))]);
    }
    assert_eq!(session.dispatcher().listener_count(), baseline);
    assert!(table.field_by_id("fldScratch00").is_none());
}

#[test]
fn test_held_handle_outlives_deletion() {
    let host = MockHost::project_tracker_example();
    let session = host.session();
    let table = session.base().table_by_id(DESIGN_PROJECTS_TABLE).unwrap();
    let client = table.field_by_id(CLIENT_FIELD).unwrap();

    host.trigger_model_updates(vec![ModelUpdate::delete(field_path(CLIENT_FIELD))]);
    assert!(client.is_deleted());

    // Re-adding the id hands out a fresh handle
    host.trigger_model_updates(vec![ModelUpdate::set(
        field_path(CLIENT_FIELD),
        json!({"id": CLIENT_FIELD, "name": "Client", "type": "text"}),
    )]);
    let restored = table.field_by_id(CLIENT_FIELD).unwrap();
    assert!(!Arc::ptr_eq(&client, &restored));
    assert_eq!(restored.name(), "Client");
}

#[test]
fn test_deleted_table_releases_its_children() {
    let host = MockHost::project_tracker_example();
    let session = host.session();
    let clients = session.base().table_by_id(CLIENTS_TABLE).unwrap();
    let children = clients.fields().len() + clients.views().len();
    drop(clients);
    let before = session.dispatcher().listener_count();

    host.trigger_model_updates(vec![ModelUpdate::delete(["tablesById", CLIENTS_TABLE])]);

    assert_eq!(session.dispatcher().listener_count(), before - 1 - children);
    assert!(session.base().table_by_id(CLIENTS_TABLE).is_none());
}

#[test]
fn test_panicking_watcher_is_isolated() {
    let host = MockHost::project_tracker_example();
    let session = host.session();
    let table = session.base().table_by_id(DESIGN_PROJECTS_TABLE).unwrap();
    let client = table.field_by_id(CLIENT_FIELD).unwrap();

    let probe = WatchProbe::new();
    client.watch_fn(FieldKey::Name, |_| panic!("watcher failure"));
    client.watch(FieldKey::Name, probe.callback());

    let report = session.apply_model_updates(vec![ModelUpdate::set(
        ["tablesById", DESIGN_PROJECTS_TABLE, "fieldsById", CLIENT_FIELD, "name"],
        json!("Customer"),
    )]);

    assert_eq!(probe.count(), 1);
    assert_eq!(report.invoked_callbacks, 2);
    assert_eq!(report.failed_callbacks, 1);
    assert_eq!(client.name(), "Customer");
}

#[test]
fn test_watch_without_runtime_defers_load() {
    let host = MockHost::project_tracker_example();
    let session = host.session();
    let cursor = session.cursor();

    cursor.watch(CursorKey::SelectedRecordIds, WatchProbe::new().callback());

    assert!(!cursor.is_data_loaded());
    assert!(cursor.core().is_loading());

    let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
    runtime.block_on(cursor.load_data()).unwrap();
    assert!(cursor.is_data_loaded());
    assert_eq!(host.cursor_fetches(), 1);
}
