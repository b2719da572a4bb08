//! Field type capability table
//!
//! One `FieldTypeBehavior` per logical `FieldType`, covering whether the
//! type is computed, whether it carries options, and how user-typed strings
//! are parsed and validated. `StandardFieldTypes` exposes the table as a
//! `FieldTypeProvider`.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use mirra_core::FieldType;
use mirra_state::BaseData;
use serde_json::{json, Value};

use crate::{FieldTypeProvider, ValidationResult};

type ComputedFn = fn(Option<&Value>) -> bool;
type ParseFn = fn(&str, Option<&Value>) -> Value;
type ValidateFn = fn(&Value, Option<&Value>) -> ValidationResult;

/// Per-type capabilities
#[derive(Clone, Copy)]
pub struct FieldTypeBehavior {
    pub is_computed: ComputedFn,
    pub has_options: bool,
    pub parse: ParseFn,
    pub validate: ValidateFn,
}

impl std::fmt::Debug for FieldTypeBehavior {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldTypeBehavior")
            .field("is_computed", &(self.is_computed)(None))
            .field("has_options", &self.has_options)
            .finish_non_exhaustive()
    }
}

/// Built-in capability table for every logical field type
#[derive(Debug, Clone)]
pub struct StandardFieldTypes {
    behaviors: HashMap<FieldType, FieldTypeBehavior>,
}

impl Default for StandardFieldTypes {
    fn default() -> Self {
        Self::new()
    }
}

impl StandardFieldTypes {
    pub fn new() -> Self {
        let behaviors = FieldType::ALL
            .iter()
            .map(|&field_type| (field_type, behavior_for(field_type)))
            .collect();
        StandardFieldTypes { behaviors }
    }

    pub fn behavior(&self, field_type: FieldType) -> FieldTypeBehavior {
        self.behaviors
            .get(&field_type)
            .copied()
            .unwrap_or(UNKNOWN)
    }

    /// Replace the behavior of one type
    pub fn with_behavior(mut self, field_type: FieldType, behavior: FieldTypeBehavior) -> Self {
        self.behaviors.insert(field_type, behavior);
        self
    }

    /// Logical type of a raw field record
    pub fn field_type_of(field_data: &Value) -> FieldType {
        let raw = field_data.get("type").and_then(Value::as_str).unwrap_or_default();
        FieldType::from_raw(raw, type_options(field_data))
    }
}

impl FieldTypeProvider for StandardFieldTypes {
    fn has_options(&self, field_type: FieldType) -> bool {
        self.behavior(field_type).has_options
    }

    fn is_computed(&self, field_type: FieldType, type_options: Option<&Value>) -> bool {
        (self.behavior(field_type).is_computed)(type_options)
    }

    fn convert_string_to_cell_value(
        &self,
        _data: &BaseData,
        field_type: FieldType,
        raw: &str,
        field_data: &Value,
    ) -> Value {
        (self.behavior(field_type).parse)(raw, type_options(field_data))
    }

    fn validate_cell_value_for_update(
        &self,
        _data: &BaseData,
        field_type: FieldType,
        value: &Value,
        _previous: Option<&Value>,
        field_data: &Value,
    ) -> ValidationResult {
        (self.behavior(field_type).validate)(value, type_options(field_data))
    }
}

fn type_options(field_data: &Value) -> Option<&Value> {
    field_data.get("typeOptions").filter(|opts| !opts.is_null())
}

fn behavior_for(field_type: FieldType) -> FieldTypeBehavior {
    use FieldType::*;

    match field_type {
        SingleLineText | Email | Url | MultilineText | RichText | PhoneNumber | Barcode => TEXT,
        Number | Currency | Duration | Rating => NUMBER,
        Percent => PERCENT,
        Checkbox => CHECKBOX,
        SingleSelect => SINGLE_SELECT,
        MultipleSelects => MULTIPLE_SELECTS,
        Date => DATE,
        DateTime => DATE_TIME,
        SingleCollaborator | MultipleCollaborators | MultipleRecordLinks | MultipleAttachments => {
            STRUCTURED
        }
        Formula | Rollup | Count | MultipleLookupValues | AutoNumber | CreatedTime
        | LastModifiedTime | CreatedBy | LastModifiedBy | Button => COMPUTED,
        Unknown => UNKNOWN,
    }
}

fn never(_: Option<&Value>) -> bool {
    false
}

fn always(_: Option<&Value>) -> bool {
    true
}

const TEXT: FieldTypeBehavior = FieldTypeBehavior {
    is_computed: never,
    has_options: false,
    parse: parse_text,
    validate: validate_text,
};

const NUMBER: FieldTypeBehavior = FieldTypeBehavior {
    is_computed: never,
    has_options: true,
    parse: parse_number,
    validate: validate_number,
};

const PERCENT: FieldTypeBehavior = FieldTypeBehavior {
    parse: parse_percent,
    ..NUMBER
};

const CHECKBOX: FieldTypeBehavior = FieldTypeBehavior {
    is_computed: never,
    has_options: true,
    parse: parse_checkbox,
    validate: validate_checkbox,
};

const SINGLE_SELECT: FieldTypeBehavior = FieldTypeBehavior {
    is_computed: never,
    has_options: true,
    parse: parse_single_select,
    validate: validate_single_select,
};

const MULTIPLE_SELECTS: FieldTypeBehavior = FieldTypeBehavior {
    is_computed: never,
    has_options: true,
    parse: parse_multiple_selects,
    validate: validate_multiple_selects,
};

const DATE: FieldTypeBehavior = FieldTypeBehavior {
    is_computed: never,
    has_options: true,
    parse: parse_date,
    validate: validate_date,
};

const DATE_TIME: FieldTypeBehavior = FieldTypeBehavior {
    parse: parse_date_time,
    validate: validate_date_time,
    ..DATE
};

const STRUCTURED: FieldTypeBehavior = FieldTypeBehavior {
    is_computed: never,
    has_options: true,
    parse: parse_nothing,
    validate: validate_structured,
};

const COMPUTED: FieldTypeBehavior = FieldTypeBehavior {
    is_computed: always,
    has_options: true,
    parse: parse_nothing,
    validate: validate_read_only,
};

const UNKNOWN: FieldTypeBehavior = FieldTypeBehavior {
    is_computed: never,
    has_options: true,
    parse: parse_nothing,
    validate: validate_read_only,
};

fn parse_nothing(_raw: &str, _opts: Option<&Value>) -> Value {
    Value::Null
}

fn parse_text(raw: &str, _opts: Option<&Value>) -> Value {
    if raw.is_empty() {
        Value::Null
    } else {
        Value::String(raw.to_owned())
    }
}

fn numeric(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, ',' | '$' | '%' | ' '))
        .collect();
    cleaned.parse::<f64>().ok().filter(|n| n.is_finite())
}

fn parse_number(raw: &str, _opts: Option<&Value>) -> Value {
    numeric(raw).map_or(Value::Null, |n| json!(n))
}

fn parse_percent(raw: &str, _opts: Option<&Value>) -> Value {
    numeric(raw).map_or(Value::Null, |n| json!(n / 100.0))
}

fn parse_checkbox(raw: &str, _opts: Option<&Value>) -> Value {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "checked" | "on" | "1" | "x" => Value::Bool(true),
        _ => Value::Null,
    }
}

fn choices(opts: Option<&Value>) -> &[Value] {
    opts.and_then(|opts| opts.get("choices"))
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

fn find_choice<'a>(name: &str, opts: Option<&'a Value>) -> Option<&'a Value> {
    let name = name.trim();
    choices(opts).iter().find(|choice| {
        choice
            .get("name")
            .and_then(Value::as_str)
            .is_some_and(|candidate| candidate.trim().eq_ignore_ascii_case(name))
    })
}

fn is_known_choice(value: &Value, opts: Option<&Value>) -> bool {
    let id = value.get("id").and_then(Value::as_str);
    let name = value.get("name").and_then(Value::as_str);
    choices(opts).iter().any(|choice| {
        (id.is_some() && choice.get("id").and_then(Value::as_str) == id)
            || (name.is_some() && choice.get("name").and_then(Value::as_str) == name)
    })
}

fn parse_single_select(raw: &str, opts: Option<&Value>) -> Value {
    find_choice(raw, opts).cloned().unwrap_or(Value::Null)
}

fn parse_multiple_selects(raw: &str, opts: Option<&Value>) -> Value {
    let selected: Vec<Value> = raw
        .split(',')
        .filter(|part| !part.trim().is_empty())
        .filter_map(|part| find_choice(part, opts).cloned())
        .collect();
    if selected.is_empty() {
        Value::Null
    } else {
        Value::Array(selected)
    }
}

const DATE_FORMAT: &str = "%Y-%m-%d";

fn calendar_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).ok()
}

fn timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw.trim())
        .ok()
        .map(|parsed| parsed.with_timezone(&Utc))
}

/// `YYYY-MM-DD` calendar dates
fn parse_date(raw: &str, _opts: Option<&Value>) -> Value {
    calendar_date(raw).map_or(Value::Null, |date| {
        Value::String(date.format(DATE_FORMAT).to_string())
    })
}

/// RFC 3339 timestamps, stored in UTC with millisecond precision
fn parse_date_time(raw: &str, _opts: Option<&Value>) -> Value {
    timestamp(raw).map_or(Value::Null, |at| {
        Value::String(at.to_rfc3339_opts(SecondsFormat::Millis, true))
    })
}

fn validate_text(value: &Value, _opts: Option<&Value>) -> ValidationResult {
    match value {
        Value::Null | Value::String(_) => ValidationResult::valid(),
        _ => ValidationResult::invalid("expected a string"),
    }
}

fn validate_number(value: &Value, _opts: Option<&Value>) -> ValidationResult {
    match value {
        Value::Null | Value::Number(_) => ValidationResult::valid(),
        _ => ValidationResult::invalid("expected a number"),
    }
}

fn validate_checkbox(value: &Value, _opts: Option<&Value>) -> ValidationResult {
    match value {
        Value::Null | Value::Bool(_) => ValidationResult::valid(),
        _ => ValidationResult::invalid("expected a boolean"),
    }
}

fn validate_single_select(value: &Value, opts: Option<&Value>) -> ValidationResult {
    match value {
        Value::Null => ValidationResult::valid(),
        choice if is_known_choice(choice, opts) => ValidationResult::valid(),
        _ => ValidationResult::invalid("no such choice"),
    }
}

fn validate_multiple_selects(value: &Value, opts: Option<&Value>) -> ValidationResult {
    match value {
        Value::Null => ValidationResult::valid(),
        Value::Array(items) if items.iter().all(|item| is_known_choice(item, opts)) => {
            ValidationResult::valid()
        }
        _ => ValidationResult::invalid("no such choice"),
    }
}

fn validate_date(value: &Value, _opts: Option<&Value>) -> ValidationResult {
    match value {
        Value::Null => ValidationResult::valid(),
        Value::String(s) if calendar_date(s).is_some() => ValidationResult::valid(),
        _ => ValidationResult::invalid("expected a YYYY-MM-DD date"),
    }
}

fn validate_date_time(value: &Value, _opts: Option<&Value>) -> ValidationResult {
    match value {
        Value::Null => ValidationResult::valid(),
        Value::String(s) if timestamp(s).is_some() => ValidationResult::valid(),
        _ => ValidationResult::invalid("expected an RFC 3339 timestamp"),
    }
}

fn validate_structured(value: &Value, _opts: Option<&Value>) -> ValidationResult {
    match value {
        Value::Null | Value::Object(_) | Value::Array(_) => ValidationResult::valid(),
        _ => ValidationResult::invalid("expected an object or a list"),
    }
}

fn validate_read_only(_value: &Value, _opts: Option<&Value>) -> ValidationResult {
    ValidationResult::invalid("field values cannot be written")
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn provider() -> StandardFieldTypes {
        StandardFieldTypes::new()
    }

    fn convert(types: &StandardFieldTypes, raw: &str, field: &Value) -> Value {
        let field_type = StandardFieldTypes::field_type_of(field);
        types.convert_string_to_cell_value(&BaseData::default(), field_type, raw, field)
    }

    fn validate(types: &StandardFieldTypes, value: &Value, field: &Value) -> ValidationResult {
        let field_type = StandardFieldTypes::field_type_of(field);
        types.validate_cell_value_for_update(&BaseData::default(), field_type, value, None, field)
    }

    #[test]
    fn test_every_type_has_a_behavior() {
        let types = provider();
        for field_type in FieldType::ALL {
            assert!(types.behaviors.contains_key(&field_type), "{field_type}");
        }
    }

    #[test]
    fn test_computed_types() {
        let types = provider();
        assert!(types.is_computed(FieldType::Formula, None));
        assert!(types.is_computed(FieldType::MultipleLookupValues, None));
        assert!(types.is_computed(FieldType::AutoNumber, None));
        assert!(!types.is_computed(FieldType::MultipleRecordLinks, None));
        assert!(!types.is_computed(FieldType::Checkbox, None));
        assert!(!types.is_computed(FieldType::Unknown, None));
    }

    #[test]
    fn test_text_types_have_no_options() {
        let types = provider();
        assert!(!types.has_options(FieldType::SingleLineText));
        assert!(!types.has_options(FieldType::Email));
        assert!(types.has_options(FieldType::SingleSelect));
        assert!(types.has_options(FieldType::MultipleRecordLinks));
    }

    #[test]
    fn test_select_parses_by_choice_name() {
        let field = json!({
            "type": "select",
            "typeOptions": {"choices": [
                {"id": "sel1", "name": "In progress"},
                {"id": "sel2", "name": "Done"}
            ]}
        });
        let types = provider();

        let parsed = convert(&types, " done ", &field);
        assert_eq!(parsed, json!({"id": "sel2", "name": "Done"}));
        assert!(validate(&types, &parsed, &field).is_valid);

        assert_eq!(convert(&types, "Blocked", &field), Value::Null);
        assert!(!validate(&types, &json!({"id": "sel9"}), &field).is_valid);
    }

    #[test]
    fn test_number_formats() {
        let types = provider();
        let currency = json!({"type": "number", "typeOptions": {"format": "currency"}});
        let percent = json!({"type": "number", "typeOptions": {"format": "percentV2"}});

        assert_eq!(convert(&types, "$1,250.5", &currency), json!(1250.5));
        assert_eq!(convert(&types, "50%", &percent), json!(0.5));
        assert_eq!(convert(&types, "lots", &currency), Value::Null);
    }

    #[test]
    fn test_checkbox_and_date() {
        let types = provider();
        let checkbox = json!({"type": "checkbox"});
        let date = json!({"type": "date", "typeOptions": {"isDateTime": false}});

        assert_eq!(convert(&types, "Yes", &checkbox), json!(true));
        assert_eq!(convert(&types, "nope", &checkbox), Value::Null);
        assert_eq!(convert(&types, " 2024-03-01 ", &date), json!("2024-03-01"));
        assert_eq!(convert(&types, "March 1st", &date), Value::Null);
    }

    #[test]
    fn test_impossible_or_trailing_dates_are_rejected() {
        let types = provider();
        let date = json!({"type": "date", "typeOptions": {"isDateTime": false}});

        assert_eq!(convert(&types, "2024-13-45", &date), Value::Null);
        assert_eq!(convert(&types, "2023-02-29", &date), Value::Null);
        assert_eq!(convert(&types, "2024-03-01 garbage", &date), Value::Null);
        assert_eq!(convert(&types, "2024-02-29", &date), json!("2024-02-29"));

        assert!(!validate(&types, &json!("2024-13-45"), &date).is_valid);
        assert!(!validate(&types, &json!("2024-03-01 garbage"), &date).is_valid);
        assert!(validate(&types, &json!("2024-03-01"), &date).is_valid);
    }

    #[test]
    fn test_date_time_normalizes_to_utc() {
        let types = provider();
        let date_time = json!({"type": "date", "typeOptions": {"isDateTime": true}});
        assert_eq!(StandardFieldTypes::field_type_of(&date_time), FieldType::DateTime);

        assert_eq!(
            convert(&types, "2024-03-01T09:30:00+02:00", &date_time),
            json!("2024-03-01T07:30:00.000Z")
        );
        assert_eq!(convert(&types, "2024-03-01", &date_time), Value::Null);
        assert_eq!(convert(&types, "2024-03-01T25:00:00Z", &date_time), Value::Null);
        assert!(validate(&types, &json!("2024-03-01T07:30:00.000Z"), &date_time).is_valid);
        assert!(!validate(&types, &json!("2024-03-01"), &date_time).is_valid);
    }

    #[test]
    fn test_conversion_follows_the_given_type() {
        let types = provider();
        let text = json!({"type": "text"});
        let data = BaseData::default();

        let as_text = types.convert_string_to_cell_value(&data, FieldType::SingleLineText, "yes", &text);
        let as_checkbox = types.convert_string_to_cell_value(&data, FieldType::Checkbox, "yes", &text);

        assert_eq!(as_text, json!("yes"));
        assert_eq!(as_checkbox, json!(true));
        assert!(!types
            .validate_cell_value_for_update(&data, FieldType::Checkbox, &json!("yes"), None, &text)
            .is_valid);
    }

    #[test]
    fn test_computed_values_never_validate() {
        let types = provider();
        let formula = json!({"type": "formula", "typeOptions": {"formulaText": "1+1"}});
        let result = validate(&types, &json!(2), &formula);
        assert!(!result.is_valid);
        assert!(result.reason.is_some());
    }

    proptest! {
        #[test]
        fn prop_calendar_dates_keep_their_text(year in 1i32..=9999, ordinal in 1u32..=365) {
            let day = NaiveDate::from_yo_opt(year, ordinal).unwrap();
            let text = day.format("%Y-%m-%d").to_string();
            prop_assert_eq!(parse_date(&text, None), Value::String(text.clone()));
        }

        #[test]
        fn prop_parsed_dates_always_validate(raw in "\\PC{0,24}") {
            let parsed = parse_date(&raw, None);
            prop_assert!(validate_date(&parsed, None).is_valid);
        }
    }
}
