//! Field - one schema attribute of a table

use std::sync::Arc;

use mirra_core::{
    FieldId, FieldType, MirraResult, MutationDescriptor, MutationOptions, Path,
    PermissionCheckResult, TableId, UPDATE_OPTIONS_HOLD_MS,
};
use mirra_state::BaseData;
use serde_json::Value;

use crate::{paths, ModelContext, ModelCore, Watchable};

watch_keys! {
    /// Watchable properties of a field
    pub enum FieldKey for "field" {
        Name => "name",
        Type => "type",
        Options => "options",
        Description => "description",
        IsComputed => "isComputed",
    }
    requires_data: []
}

/// Raw tags whose logical type also depends on `typeOptions`
const OPTION_DEPENDENT_TAGS: [&str; 3] = ["number", "text", "date"];

pub struct Field {
    core: ModelCore<FieldKey>,
    table_id: TableId,
    id: FieldId,
}

batch_listener!(Field);
entity_handle!(Field, FieldId);

impl Field {
    pub fn new(ctx: ModelContext, table_id: TableId, id: FieldId) -> Arc<Self> {
        let field = Arc::new(Field {
            core: ModelCore::new(format!("field:{id}"), ctx.clone()),
            table_id,
            id,
        });
        ctx.register(&field);
        field
    }

    pub fn id(&self) -> &FieldId {
        &self.id
    }

    pub fn parent_table_id(&self) -> &TableId {
        &self.table_id
    }

    fn path(&self) -> Path {
        paths::field(&self.table_id, &self.id)
    }

    fn read<R>(&self, f: impl FnOnce(&Value) -> Option<R>) -> Option<R> {
        let path = self.path();
        self.core.store().read(|data| data.get(&path).and_then(f))
    }

    pub fn name(&self) -> String {
        self.read(|field| field.get("name")?.as_str().map(str::to_owned))
            .unwrap_or_default()
    }

    pub fn description(&self) -> Option<String> {
        self.read(|field| field.get("description")?.as_str().map(str::to_owned))
    }

    /// Type tag exactly as stored
    pub fn raw_type(&self) -> Option<String> {
        self.read(|field| field.get("type")?.as_str().map(str::to_owned))
    }

    fn raw_options(&self) -> Option<Value> {
        self.read(|field| field.get("typeOptions").filter(|opts| !opts.is_null()).cloned())
    }

    /// Logical type. The host's override wins over the built-in remap.
    pub fn field_type(&self) -> FieldType {
        let Some(raw) = self.raw_type() else {
            return FieldType::Unknown;
        };
        let options = self.raw_options();
        self.core
            .host()
            .field_type_provider()
            .sdk_field_type_override(&raw, options.as_ref())
            .unwrap_or_else(|| FieldType::from_raw(&raw, options.as_ref()))
    }

    pub fn is_computed(&self) -> bool {
        let field_type = self.field_type();
        let options = self.raw_options();
        self.core
            .host()
            .field_type_provider()
            .is_computed(field_type, options.as_ref())
    }

    /// `typeOptions` passed through unchanged, or `None` for types without
    /// options
    pub fn options(&self) -> Option<Value> {
        if !self.core.host().field_type_provider().has_options(self.field_type()) {
            return None;
        }
        self.raw_options()
    }

    pub fn is_deleted(&self) -> bool {
        !self.core.store().contains(&self.path())
    }

    pub fn is_primary_field(&self) -> bool {
        let path = paths::table(&self.table_id).child("primaryFieldId");
        self.core.store().get_str(&path).as_deref() == Some(self.id.as_str())
    }

    /// Type tag used in mutation descriptors: the logical type name, or the
    /// stored tag when the field has no logical type
    pub fn type_tag(&self) -> String {
        match self.field_type() {
            FieldType::Unknown => self.raw_type().unwrap_or_else(|| FieldType::Unknown.into()),
            known => known.into(),
        }
    }

    fn update_options_descriptor(&self, options: Option<Value>) -> MutationDescriptor {
        MutationDescriptor::update_single_field_config(
            self.table_id.clone(),
            self.id.clone(),
            self.type_tag(),
            options,
        )
    }

    /// Replace the field's options. The host commits the change after
    /// holding it for `UPDATE_OPTIONS_HOLD_MS`.
    pub async fn update_options(&self, options: Option<Value>) -> MirraResult<()> {
        let descriptor = self.update_options_descriptor(options);
        self.core
            .context()
            .mutations()
            .apply(descriptor, Some(MutationOptions::hold_for(UPDATE_OPTIONS_HOLD_MS)))
            .await
    }

    /// Whether `update_options(options)` would be permitted. Never executes
    /// anything.
    pub fn check_permissions_for_update_options(&self, options: Option<Value>) -> PermissionCheckResult {
        let descriptor = self.update_options_descriptor(options);
        self.core.context().mutations().check(&descriptor)
    }

    pub fn has_permission_to_update_options(&self, options: Option<Value>) -> bool {
        self.check_permissions_for_update_options(options).has_permission
    }

    /// Parse a user-typed string into a cell value for this field.
    ///
    /// Computed fields return the parsed value as-is; others return it only
    /// if it validates as a fresh write.
    pub fn convert_string_to_cell_value(&self, raw: &str) -> Option<Value> {
        let provider = self.core.host().field_type_provider();
        let field_type = self.field_type();
        let computed = self.is_computed();
        let path = self.path();

        self.core.store().read(|data| {
            let field_data = data.get(&path)?;
            let parsed = provider.convert_string_to_cell_value(data, field_type, raw, field_data);
            if computed {
                return non_null(parsed);
            }
            let verdict =
                provider.validate_cell_value_for_update(data, field_type, &parsed, None, field_data);
            if verdict.is_valid {
                non_null(parsed)
            } else {
                None
            }
        })
    }
}

fn non_null(value: Value) -> Option<Value> {
    (!value.is_null()).then_some(value)
}

impl Watchable for Field {
    type Key = FieldKey;

    fn core(&self) -> &ModelCore<FieldKey> {
        &self.core
    }

    fn interest_paths(&self, key: FieldKey, data: &BaseData) -> Vec<Path> {
        let field = self.path();
        match key {
            FieldKey::Name => vec![field.child("name")],
            FieldKey::Description => vec![field.child("description")],
            FieldKey::Options => vec![field.child("typeOptions")],
            FieldKey::IsComputed => vec![field.child("type")],
            FieldKey::Type => {
                let raw = data.get_str(&field.child("type"));
                let mut interest = vec![field.child("type")];
                if raw.is_some_and(|tag| OPTION_DEPENDENT_TAGS.contains(&tag)) {
                    interest.push(field.child("typeOptions"));
                }
                interest
            }
        }
    }
}
