use mirra_core::{ModelUpdate, TableId};
use mirra_models::{BaseKey, FieldKey, TableKey, ViewKey, Watchable};
use proptest::prelude::*;
use serde_json::json;

use mirra_test::*;

fn field_path(table: &str, field: &str, leaf: &str) -> [String; 5] {
    [
        "tablesById".to_owned(),
        table.to_owned(),
        "fieldsById".to_owned(),
        field.to_owned(),
        leaf.to_owned(),
    ]
}

#[test]
fn test_many_paths_on_one_key_fire_once() {
    let host = MockHost::project_tracker_example();
    let session = host.session();
    let table = session.base().table_by_id(DESIGN_PROJECTS_TABLE).unwrap();
    let category = table.field_by_id(CATEGORY_FIELD).unwrap();

    let probe = WatchProbe::new();
    category.watch(FieldKey::Options, probe.callback());

    let report = session.apply_model_updates(vec![
        ModelUpdate::set(
            [
                "tablesById",
                DESIGN_PROJECTS_TABLE,
                "fieldsById",
                CATEGORY_FIELD,
                "typeOptions",
                "choices",
                "0",
                "name",
            ],
            json!("Branding"),
        ),
        ModelUpdate::set(
            [
                "tablesById",
                DESIGN_PROJECTS_TABLE,
                "fieldsById",
                CATEGORY_FIELD,
                "typeOptions",
                "choices",
                "1",
                "color",
            ],
            json!("red"),
        ),
    ]);

    assert_eq!(probe.calls(), vec![FieldKey::Options]);
    assert_eq!(report.batches, 1);
    assert_eq!(report.updates, 2);
    assert_eq!(report.invoked_callbacks, 1);
    assert_eq!(report.version, session.store().version());
}

#[test]
fn test_base_reads() {
    let host = MockHost::project_tracker_example();
    let session = host.session();
    let base = session.base();

    assert_eq!(base.id(), PROJECT_TRACKER_BASE);
    assert_eq!(base.name(), "Project tracker");
    let tables: Vec<_> = base.tables().iter().map(|t| t.id().clone()).collect();
    assert_eq!(tables, vec![DESIGN_PROJECTS_TABLE, CLIENTS_TABLE]);
    assert_eq!(base.table_by_name("Clients").unwrap().id(), &TableId::from(CLIENTS_TABLE));
    assert!(base.table_by_name("Invoices").is_none());
    assert!(base.table_by_id("tblMissing").is_none());
    // Handles are cached
    assert!(std::sync::Arc::ptr_eq(
        &base.table_by_id(CLIENTS_TABLE).unwrap(),
        &base.tables()[1],
    ));
}

#[test]
fn test_base_name_watch() {
    let host = MockHost::project_tracker_example();
    let session = host.session();
    let base = session.base();

    let probe = WatchProbe::new();
    base.watch(BaseKey::Name, probe.callback());
    base.watch(BaseKey::Tables, probe.callback());

    host.trigger_model_updates(vec![ModelUpdate::set(["name"], json!("Studio tracker"))]);

    assert_eq!(probe.calls(), vec![BaseKey::Name]);
    assert_eq!(base.name(), "Studio tracker");
}

#[test]
fn test_adding_a_table_fires_tables() {
    let host = MockHost::project_tracker_example();
    let session = host.session();
    let base = session.base();

    let probe = WatchProbe::new();
    base.watch(BaseKey::Tables, probe.callback());

    host.trigger_model_updates(vec![
        ModelUpdate::set(
            ["tablesById", "tblInvoices"],
            json!({
                "id": "tblInvoices",
                "name": "Invoices",
                "primaryFieldId": "fldInvoiceNo",
                "fieldsById": {},
                "viewOrder": [],
                "viewsById": {}
            }),
        ),
        ModelUpdate::set(
            ["tableOrder"],
            json!([DESIGN_PROJECTS_TABLE, CLIENTS_TABLE, "tblInvoices"]),
        ),
    ]);

    assert_eq!(probe.calls(), vec![BaseKey::Tables]);
    assert_eq!(base.tables().len(), 3);
    assert_eq!(base.table_by_name("Invoices").unwrap().id(), &TableId::from("tblInvoices"));
}

#[test]
fn test_table_membership_without_order_change_fires_tables() {
    let host = MockHost::project_tracker_example();
    let session = host.session();
    let base = session.base();

    let probe = WatchProbe::new();
    base.watch(BaseKey::Tables, probe.callback());

    host.trigger_model_updates(vec![ModelUpdate::delete(["tablesById", CLIENTS_TABLE])]);

    assert_eq!(probe.count(), 1);
}

#[test]
fn test_renaming_a_field_does_not_fire_tables() {
    let host = MockHost::project_tracker_example();
    let session = host.session();
    let base = session.base();
    let table = base.table_by_id(DESIGN_PROJECTS_TABLE).unwrap();

    let probe = WatchProbe::new();
    base.watch(BaseKey::Tables, probe.callback());
    let table_probe = WatchProbe::new();
    table.watch(TableKey::Fields, table_probe.callback());

    host.trigger_model_updates(vec![ModelUpdate::set(
        field_path(DESIGN_PROJECTS_TABLE, CLIENT_FIELD, "name"),
        json!("Customer"),
    )]);

    assert_eq!(probe.count(), 0);
    assert_eq!(table_probe.count(), 0);
}

#[test]
fn test_table_fields_membership() {
    let host = MockHost::project_tracker_example();
    let session = host.session();
    let table = session.base().table_by_id(DESIGN_PROJECTS_TABLE).unwrap();
    assert_eq!(table.fields().len(), 6);

    let probe = WatchProbe::new();
    table.watch(TableKey::Fields, probe.callback());

    host.trigger_model_updates(vec![ModelUpdate::set(
        ["tablesById", DESIGN_PROJECTS_TABLE, "fieldsById", "fldBudget"],
        json!({
            "id": "fldBudget",
            "name": "Budget",
            "type": "number",
            "typeOptions": {"format": "currency", "precision": 2},
            "description": null,
            "lock": null
        }),
    )]);
    assert_eq!(probe.count(), 1);
    assert_eq!(table.fields().len(), 7);
    assert_eq!(table.field_by_name("Budget").unwrap().name(), "Budget");

    host.trigger_model_updates(vec![ModelUpdate::delete([
        "tablesById",
        DESIGN_PROJECTS_TABLE,
        "fieldsById",
        PROJECT_LEAD_FIELD,
    ])]);
    assert_eq!(probe.count(), 2);
    assert!(table.field_by_id(PROJECT_LEAD_FIELD).is_none());
    assert_eq!(table.fields().len(), 6);
}

#[test]
fn test_table_reads() {
    let host = MockHost::project_tracker_example();
    let session = host.session();
    let table = session.base().table_by_id(DESIGN_PROJECTS_TABLE).unwrap();

    assert_eq!(table.name(), "Design projects");
    assert_eq!(table.description(), None);
    assert_eq!(
        table.primary_field().unwrap().id(),
        &mirra_core::FieldId::from(DESIGN_PROJECTS_NAME_FIELD)
    );
    let names: Vec<_> = table.fields().iter().map(|f| f.name()).collect();
    assert_eq!(
        names,
        vec!["Name", "Client", "Category", "Complete", "Kickoff date", "Project lead"]
    );
    assert_eq!(table.view_by_name("Project pipeline").unwrap().id().as_str(), KANBAN_VIEW);

    let clients = session.base().table_by_id(CLIENTS_TABLE).unwrap();
    assert_eq!(clients.description().as_deref(), Some("Companies we work with"));
}

#[test]
fn test_views_follow_view_order() {
    let host = MockHost::project_tracker_example();
    let session = host.session();
    let table = session.base().table_by_id(DESIGN_PROJECTS_TABLE).unwrap();

    let probe = WatchProbe::new();
    table.watch(TableKey::Views, probe.callback());
    let view_probe = WatchProbe::new();
    let kanban = table.view_by_id(KANBAN_VIEW).unwrap();
    kanban.watch(ViewKey::Name, view_probe.callback());

    host.trigger_model_updates(vec![ModelUpdate::set(
        ["tablesById", DESIGN_PROJECTS_TABLE, "viewOrder"],
        json!([KANBAN_VIEW, ALL_PROJECTS_VIEW, BY_CATEGORY_VIEW]),
    )]);

    assert_eq!(probe.count(), 1);
    assert_eq!(view_probe.count(), 0);
    let order: Vec<_> = table.views().iter().map(|v| v.name()).collect();
    assert_eq!(order, vec!["Project pipeline", "All projects", "By category"]);

    host.trigger_model_updates(vec![ModelUpdate::set(
        ["tablesById", DESIGN_PROJECTS_TABLE, "viewsById", KANBAN_VIEW, "name"],
        json!("Pipeline"),
    )]);
    assert_eq!(probe.count(), 1);
    assert_eq!(view_probe.calls(), vec![ViewKey::Name]);
    assert_eq!(kanban.name(), "Pipeline");
}

#[test]
fn test_table_deletion() {
    let host = MockHost::project_tracker_example();
    let session = host.session();
    let base = session.base();
    let clients = base.table_by_id(CLIENTS_TABLE).unwrap();
    let name_field = clients.field_by_id(CLIENTS_NAME_FIELD).unwrap();

    let probe = WatchProbe::new();
    clients.watch(TableKey::Name, probe.callback());
    clients.watch(TableKey::Fields, probe.callback());
    let field_probe = WatchProbe::new();
    name_field.watch(FieldKey::Name, field_probe.callback());

    host.trigger_model_updates(vec![
        ModelUpdate::delete(["tablesById", CLIENTS_TABLE]),
        ModelUpdate::set(["tableOrder"], json!([DESIGN_PROJECTS_TABLE])),
    ]);

    assert!(clients.is_deleted());
    assert!(name_field.is_deleted());
    assert_eq!(clients.name(), "");
    assert!(clients.fields().is_empty());
    assert_eq!(probe.calls(), vec![TableKey::Name, TableKey::Fields]);
    assert_eq!(field_probe.count(), 1);
    assert_eq!(base.tables().len(), 1);
    assert!(base.table_by_id(CLIENTS_TABLE).is_none());
}

#[test]
fn test_versions_advance_per_batch() {
    let host = MockHost::project_tracker_example();
    let session = host.session();
    let start = session.store().version();

    let first = session.apply_model_updates(vec![ModelUpdate::set(["name"], json!("One"))]);
    let second = session.apply_model_updates(vec![
        ModelUpdate::set(["name"], json!("Two")),
        ModelUpdate::set(["name"], json!("Three")),
    ]);

    assert_eq!(first.version, start + 1);
    assert_eq!(second.version, start + 2);
    assert!(!second.deferred);
    assert_eq!(session.base().name(), "Three");
}

#[test]
fn test_unwatched_models_are_not_notified() {
    let host = MockHost::project_tracker_example();
    let session = host.session();
    let table = session.base().table_by_id(DESIGN_PROJECTS_TABLE).unwrap();
    let _fields = table.fields();

    let report = session.apply_model_updates(vec![ModelUpdate::set(
        field_path(DESIGN_PROJECTS_TABLE, CLIENT_FIELD, "name"),
        json!("Customer"),
    )]);

    assert_eq!(report.notified_keys, 0);
    assert_eq!(report.invoked_callbacks, 0);
}

const KEY_POOL: &[&str] = &[
    "tablesById",
    DESIGN_PROJECTS_TABLE,
    "fieldsById",
    CLIENT_FIELD,
    "name",
    "type",
    "description",
];

fn related(update: &[String], target: &[String]) -> bool {
    update.iter().zip(target).all(|(a, b)| a == b)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_name_watcher_fires_iff_batch_touches_name(
        batch in prop::collection::vec(
            prop::collection::vec(prop::sample::select(KEY_POOL), 1..6),
            1..4,
        )
    ) {
        let host = MockHost::project_tracker_example();
        let session = host.session();
        let client = session
            .base()
            .table_by_id(DESIGN_PROJECTS_TABLE)
            .unwrap()
            .field_by_id(CLIENT_FIELD)
            .unwrap();
        let probe = WatchProbe::new();
        client.watch(FieldKey::Name, probe.callback());

        let target = field_path(DESIGN_PROJECTS_TABLE, CLIENT_FIELD, "name");
        let paths: Vec<Vec<String>> = batch
            .iter()
            .map(|keys| keys.iter().map(|k| (*k).to_owned()).collect())
            .collect();
        let expected = paths.iter().any(|path| related(path, &target));

        let updates = paths
            .into_iter()
            .map(|path| ModelUpdate::set(path, json!("changed")))
            .collect();
        session.apply_model_updates(updates);

        prop_assert_eq!(probe.count(), usize::from(expected));
    }
}
