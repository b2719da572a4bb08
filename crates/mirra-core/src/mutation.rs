//! Mutation descriptors and permission results
//!
//! A descriptor is built once and handed, unchanged, to both the
//! permission oracle and the execution call.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{FieldId, TableId};

/// Minimum time the host holds a field config change before committing.
/// Rapid successive option updates to the same field race without it.
pub const UPDATE_OPTIONS_HOLD_MS: u64 = 100;

/// Kind tag of a mutation
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MutationKind {
    UpdateSingleFieldConfig,
}

/// New configuration for a field.
///
/// `type` is the field's type tag as the host knows it: a logical type
/// name, or the stored tag when no logical type applies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldConfig {
    #[serde(rename = "type")]
    pub field_type: String,
    pub options: Option<Value>,
}

/// Structured request describing one intended remote state change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum MutationDescriptor {
    #[serde(rename_all = "camelCase")]
    UpdateSingleFieldConfig {
        table_id: TableId,
        id: FieldId,
        config: FieldConfig,
    },
}

impl MutationDescriptor {
    pub fn update_single_field_config(
        table_id: TableId,
        id: FieldId,
        field_type: impl Into<String>,
        options: Option<Value>,
    ) -> Self {
        MutationDescriptor::UpdateSingleFieldConfig {
            table_id,
            id,
            config: FieldConfig {
                field_type: field_type.into(),
                options,
            },
        }
    }

    pub fn kind(&self) -> MutationKind {
        match self {
            MutationDescriptor::UpdateSingleFieldConfig { .. } => MutationKind::UpdateSingleFieldConfig,
        }
    }

    pub fn table_id(&self) -> &TableId {
        match self {
            MutationDescriptor::UpdateSingleFieldConfig { table_id, .. } => table_id,
        }
    }

    /// Id of the entity the mutation targets
    pub fn target_id(&self) -> &str {
        match self {
            MutationDescriptor::UpdateSingleFieldConfig { id, .. } => id.as_str(),
        }
    }
}

/// Execution hints passed alongside a descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MutationOptions {
    pub hold_for_ms: Option<u64>,
}

impl MutationOptions {
    pub fn hold_for(ms: u64) -> Self {
        MutationOptions {
            hold_for_ms: Some(ms),
        }
    }
}

/// Outcome of a permission check. A denial is a value, not an error.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionCheckResult {
    pub has_permission: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason_display_string: Option<String>,
}

impl PermissionCheckResult {
    pub fn allowed() -> Self {
        PermissionCheckResult {
            has_permission: true,
            reason_display_string: None,
        }
    }

    pub fn denied(reason: impl Into<String>) -> Self {
        PermissionCheckResult {
            has_permission: false,
            reason_display_string: Some(reason.into()),
        }
    }
}
