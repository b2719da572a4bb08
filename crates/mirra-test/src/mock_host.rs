//! Recording, programmable host
//!
//! `MockHost` records every call the model layer makes and answers with
//! programmable responses. `trigger_model_updates` pushes a batch through
//! the registered sink exactly as a real host would.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use mirra_core::{
    FieldType, MirraError, MirraResult, ModelUpdate, MutationDescriptor, MutationOptions,
    PermissionCheckResult, TableId, ViewId,
};
use mirra_models::{
    FieldTypeProvider, Host, ModelUpdateSink, StandardFieldTypes, ValidationResult,
};
use mirra_runtime::Session;
use mirra_state::BaseData;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::Semaphore;
use tracing::warn;

use crate::fixtures;

#[derive(Debug, Clone, PartialEq)]
pub struct MutationCall {
    pub descriptor: MutationDescriptor,
    pub options: Option<MutationOptions>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PermissionCheckCall {
    pub descriptor: MutationDescriptor,
    /// Snapshot the oracle was handed
    pub data: Value,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationCall {
    pub table_id: TableId,
    pub view_id: Option<ViewId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConvertCall {
    pub field_type: FieldType,
    pub raw: String,
    pub field_data: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidateCall {
    pub field_type: FieldType,
    pub value: Value,
    pub previous: Option<Value>,
    pub field_data: Value,
}

/// Field type provider that answers from `StandardFieldTypes` unless a
/// response has been programmed
#[derive(Default)]
pub struct MockFieldTypeProvider {
    standard: StandardFieldTypes,
    type_override: Mutex<Option<FieldType>>,
    is_computed: Mutex<Option<bool>>,
    converted: Mutex<Option<Value>>,
    validation: Mutex<Option<ValidationResult>>,
    convert_calls: Mutex<Vec<ConvertCall>>,
    validate_calls: Mutex<Vec<ValidateCall>>,
    is_computed_calls: AtomicUsize,
}

impl MockFieldTypeProvider {
    pub fn set_type_override(&self, field_type: Option<FieldType>) {
        *self.type_override.lock() = field_type;
    }

    pub fn set_is_computed(&self, computed: bool) {
        *self.is_computed.lock() = Some(computed);
    }

    pub fn set_converted_value(&self, value: Value) {
        *self.converted.lock() = Some(value);
    }

    pub fn set_validation(&self, result: ValidationResult) {
        *self.validation.lock() = Some(result);
    }

    pub fn convert_calls(&self) -> Vec<ConvertCall> {
        self.convert_calls.lock().clone()
    }

    pub fn validate_calls(&self) -> Vec<ValidateCall> {
        self.validate_calls.lock().clone()
    }

    pub fn is_computed_calls(&self) -> usize {
        self.is_computed_calls.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        *self.type_override.lock() = None;
        *self.is_computed.lock() = None;
        *self.converted.lock() = None;
        *self.validation.lock() = None;
        self.convert_calls.lock().clear();
        self.validate_calls.lock().clear();
        self.is_computed_calls.store(0, Ordering::SeqCst);
    }
}

impl FieldTypeProvider for MockFieldTypeProvider {
    fn sdk_field_type_override(&self, _raw_type: &str, _type_options: Option<&Value>) -> Option<FieldType> {
        *self.type_override.lock()
    }

    fn has_options(&self, field_type: FieldType) -> bool {
        self.standard.has_options(field_type)
    }

    fn is_computed(&self, field_type: FieldType, type_options: Option<&Value>) -> bool {
        self.is_computed_calls.fetch_add(1, Ordering::SeqCst);
        let programmed = *self.is_computed.lock();
        programmed.unwrap_or_else(|| self.standard.is_computed(field_type, type_options))
    }

    fn convert_string_to_cell_value(
        &self,
        data: &BaseData,
        field_type: FieldType,
        raw: &str,
        field_data: &Value,
    ) -> Value {
        self.convert_calls.lock().push(ConvertCall {
            field_type,
            raw: raw.to_owned(),
            field_data: field_data.clone(),
        });
        let programmed = self.converted.lock().clone();
        programmed.unwrap_or_else(|| {
            self.standard
                .convert_string_to_cell_value(data, field_type, raw, field_data)
        })
    }

    fn validate_cell_value_for_update(
        &self,
        data: &BaseData,
        field_type: FieldType,
        value: &Value,
        previous: Option<&Value>,
        field_data: &Value,
    ) -> ValidationResult {
        self.validate_calls.lock().push(ValidateCall {
            field_type,
            value: value.clone(),
            previous: previous.cloned(),
            field_data: field_data.clone(),
        });
        let programmed = self.validation.lock().clone();
        programmed.unwrap_or_else(|| {
            self.standard
                .validate_cell_value_for_update(data, field_type, value, previous, field_data)
        })
    }
}

/// In-memory host for tests
pub struct MockHost {
    base_data: Mutex<Value>,
    sink: Mutex<Option<ModelUpdateSink>>,
    provider: Arc<MockFieldTypeProvider>,

    cursor_data: Mutex<MirraResult<Value>>,
    table_data: Mutex<HashMap<TableId, Value>>,
    fetch_gate: Mutex<Option<Arc<Semaphore>>>,

    cursor_fetches: AtomicUsize,
    cursor_unsubscribes: AtomicUsize,
    table_fetches: Mutex<Vec<TableId>>,
    table_unsubscribes: Mutex<Vec<TableId>>,

    mutation_result: Mutex<MirraResult<()>>,
    mutations: Mutex<Vec<MutationCall>>,
    permission_result: Mutex<PermissionCheckResult>,
    permission_checks: Mutex<Vec<PermissionCheckCall>>,
    navigations: Mutex<Vec<NavigationCall>>,
}

impl MockHost {
    pub fn new(base_data: Value) -> Arc<Self> {
        Arc::new(MockHost {
            base_data: Mutex::new(base_data),
            sink: Mutex::new(None),
            provider: Arc::new(MockFieldTypeProvider::default()),
            cursor_data: Mutex::new(Ok(fixtures::empty_cursor_data())),
            table_data: Mutex::new(HashMap::new()),
            fetch_gate: Mutex::new(None),
            cursor_fetches: AtomicUsize::new(0),
            cursor_unsubscribes: AtomicUsize::new(0),
            table_fetches: Mutex::new(Vec::new()),
            table_unsubscribes: Mutex::new(Vec::new()),
            mutation_result: Mutex::new(Ok(())),
            mutations: Mutex::new(Vec::new()),
            permission_result: Mutex::new(PermissionCheckResult::allowed()),
            permission_checks: Mutex::new(Vec::new()),
            navigations: Mutex::new(Vec::new()),
        })
    }

    /// Host serving the project tracker fixture, with record data for the
    /// design projects table
    pub fn project_tracker_example() -> Arc<Self> {
        let host = MockHost::new(fixtures::project_tracker_example());
        host.set_table_data(
            fixtures::DESIGN_PROJECTS_TABLE,
            fixtures::design_projects_records(),
        );
        host
    }

    /// Start a session over this host
    pub fn session(self: &Arc<Self>) -> Session {
        Session::new(Arc::clone(self) as Arc<dyn Host>)
    }

    /// Edit the data future sessions start from
    pub fn edit_base_data(&self, edit: impl FnOnce(&mut Value)) {
        edit(&mut self.base_data.lock());
    }

    pub fn field_types(&self) -> &Arc<MockFieldTypeProvider> {
        &self.provider
    }

    /// Push a batch through the registered sink
    pub fn trigger_model_updates(&self, updates: Vec<ModelUpdate>) {
        let sink = self.sink.lock().clone();
        match sink {
            Some(sink) => sink(updates),
            None => warn!("no model update sink registered, batch dropped"),
        }
    }

    pub fn set_cursor_data(&self, result: MirraResult<Value>) {
        *self.cursor_data.lock() = result;
    }

    pub fn set_table_data(&self, table_id: &str, data: Value) {
        self.table_data.lock().insert(TableId::from(table_id), data);
    }

    /// Park every fetch until `release_fetches`
    pub fn hold_fetches(&self) {
        *self.fetch_gate.lock() = Some(Arc::new(Semaphore::new(0)));
    }

    pub fn release_fetches(&self) {
        if let Some(gate) = self.fetch_gate.lock().take() {
            gate.close();
        }
    }

    pub fn set_mutation_result(&self, result: MirraResult<()>) {
        *self.mutation_result.lock() = result;
    }

    pub fn set_permission_result(&self, result: PermissionCheckResult) {
        *self.permission_result.lock() = result;
    }

    pub fn cursor_fetches(&self) -> usize {
        self.cursor_fetches.load(Ordering::SeqCst)
    }

    pub fn cursor_unsubscribes(&self) -> usize {
        self.cursor_unsubscribes.load(Ordering::SeqCst)
    }

    pub fn table_fetches(&self) -> Vec<TableId> {
        self.table_fetches.lock().clone()
    }

    pub fn table_unsubscribes(&self) -> Vec<TableId> {
        self.table_unsubscribes.lock().clone()
    }

    pub fn mutations(&self) -> Vec<MutationCall> {
        self.mutations.lock().clone()
    }

    pub fn permission_checks(&self) -> Vec<PermissionCheckCall> {
        self.permission_checks.lock().clone()
    }

    pub fn navigations(&self) -> Vec<NavigationCall> {
        self.navigations.lock().clone()
    }

    async fn wait_for_gate(&self) {
        let gate = self.fetch_gate.lock().clone();
        if let Some(gate) = gate {
            // Resolves with an error once the gate is closed
            let _ = gate.acquire().await;
        }
    }
}

#[async_trait]
impl Host for MockHost {
    fn initial_base_data(&self) -> Value {
        self.base_data.lock().clone()
    }

    fn subscribe_to_model_updates(&self, sink: ModelUpdateSink) {
        *self.sink.lock() = Some(sink);
    }

    async fn fetch_and_subscribe_to_cursor_data(&self) -> MirraResult<Value> {
        self.cursor_fetches.fetch_add(1, Ordering::SeqCst);
        self.wait_for_gate().await;
        self.cursor_data.lock().clone()
    }

    fn unsubscribe_from_cursor_data(&self) {
        self.cursor_unsubscribes.fetch_add(1, Ordering::SeqCst);
    }

    async fn fetch_and_subscribe_to_table_data(&self, table_id: &TableId) -> MirraResult<Value> {
        self.table_fetches.lock().push(table_id.clone());
        self.wait_for_gate().await;
        self.table_data
            .lock()
            .get(table_id)
            .cloned()
            .ok_or_else(|| MirraError::Transport(format!("no record data for {table_id}")))
    }

    fn unsubscribe_from_table_data(&self, table_id: &TableId) {
        self.table_unsubscribes.lock().push(table_id.clone());
    }

    async fn apply_mutation(
        &self,
        descriptor: MutationDescriptor,
        options: Option<MutationOptions>,
    ) -> MirraResult<()> {
        self.mutations.lock().push(MutationCall { descriptor, options });
        self.mutation_result.lock().clone()
    }

    fn check_permissions_for_mutation(
        &self,
        descriptor: &MutationDescriptor,
        data: &BaseData,
    ) -> PermissionCheckResult {
        self.permission_checks.lock().push(PermissionCheckCall {
            descriptor: descriptor.clone(),
            data: data.as_value().clone(),
        });
        self.permission_result.lock().clone()
    }

    fn set_active_view_or_table(&self, table_id: &TableId, view_id: Option<&ViewId>) {
        self.navigations.lock().push(NavigationCall {
            table_id: table_id.clone(),
            view_id: view_id.cloned(),
        });
    }

    fn field_type_provider(&self) -> Arc<dyn FieldTypeProvider> {
        Arc::clone(&self.provider) as Arc<dyn FieldTypeProvider>
    }
}
