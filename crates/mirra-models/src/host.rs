//! Host boundary
//!
//! Everything the model layer needs from the outside world: the patch
//! channel, lazy fetch-and-subscribe for cursor and record data, mutation
//! execution, the synchronous permission oracle and the field type
//! provider.

use std::sync::Arc;

use async_trait::async_trait;
use mirra_core::{
    FieldType, MirraResult, ModelUpdate, MutationDescriptor, MutationOptions,
    PermissionCheckResult, TableId, ViewId,
};
use mirra_state::BaseData;
use serde_json::Value;

/// Receiver for host-pushed update batches
pub type ModelUpdateSink = Arc<dyn Fn(Vec<ModelUpdate>) + Send + Sync>;

/// Outcome of a cell value validation
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub reason: Option<String>,
}

impl ValidationResult {
    pub fn valid() -> Self {
        ValidationResult {
            is_valid: true,
            reason: None,
        }
    }

    pub fn invalid(reason: impl Into<String>) -> Self {
        ValidationResult {
            is_valid: false,
            reason: Some(reason.into()),
        }
    }
}

/// Per-type behavior the field model delegates to
pub trait FieldTypeProvider: Send + Sync {
    /// Host-specific type remap. Wins over the built-in legacy map.
    fn sdk_field_type_override(&self, _raw_type: &str, _type_options: Option<&Value>) -> Option<FieldType> {
        None
    }

    fn has_options(&self, field_type: FieldType) -> bool;

    fn is_computed(&self, field_type: FieldType, type_options: Option<&Value>) -> bool;

    /// Parse a user-typed string into a cell value for the field.
    /// `field_type` is the type the field model resolved, override included.
    fn convert_string_to_cell_value(
        &self,
        data: &BaseData,
        field_type: FieldType,
        raw: &str,
        field_data: &Value,
    ) -> Value;

    fn validate_cell_value_for_update(
        &self,
        data: &BaseData,
        field_type: FieldType,
        value: &Value,
        previous: Option<&Value>,
        field_data: &Value,
    ) -> ValidationResult;
}

/// The embedding environment
#[async_trait]
pub trait Host: Send + Sync {
    /// Tree the session starts from
    fn initial_base_data(&self) -> Value;

    /// Register the single receiver of update batches
    fn subscribe_to_model_updates(&self, sink: ModelUpdateSink);

    /// Fetch the cursor's selection data and keep it current
    async fn fetch_and_subscribe_to_cursor_data(&self) -> MirraResult<Value>;

    fn unsubscribe_from_cursor_data(&self);

    /// Fetch a table's records and keep them current
    async fn fetch_and_subscribe_to_table_data(&self, table_id: &TableId) -> MirraResult<Value>;

    fn unsubscribe_from_table_data(&self, table_id: &TableId);

    async fn apply_mutation(
        &self,
        descriptor: MutationDescriptor,
        options: Option<MutationOptions>,
    ) -> MirraResult<()>;

    /// Synchronous permission oracle over the full current snapshot
    fn check_permissions_for_mutation(
        &self,
        descriptor: &MutationDescriptor,
        data: &BaseData,
    ) -> PermissionCheckResult;

    /// Ask the host UI to navigate. Never changes local state directly.
    fn set_active_view_or_table(&self, table_id: &TableId, view_id: Option<&ViewId>);

    fn field_type_provider(&self) -> Arc<dyn FieldTypeProvider>;
}
