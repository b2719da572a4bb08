//! Logical field types
//!
//! The host stores a raw type tag per field. Some of those tags are legacy
//! or generic (`text`, `number`, `lookup`) and only become a precise
//! logical type once the field's own `typeOptions` are consulted. Tags with
//! no built-in mapping, such as `foreignKey`, are left to the host's type
//! provider.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Closed set of logical field types
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldType {
    SingleLineText,
    Email,
    Url,
    MultilineText,
    RichText,
    PhoneNumber,
    Number,
    Percent,
    Currency,
    Duration,
    Rating,
    Checkbox,
    SingleSelect,
    MultipleSelects,
    SingleCollaborator,
    MultipleCollaborators,
    MultipleRecordLinks,
    Date,
    DateTime,
    MultipleAttachments,
    Barcode,
    Formula,
    Rollup,
    Count,
    MultipleLookupValues,
    AutoNumber,
    CreatedTime,
    LastModifiedTime,
    CreatedBy,
    LastModifiedBy,
    Button,
    /// A tag this build does not recognize yet
    Unknown,
}

impl FieldType {
    pub const ALL: [FieldType; 32] = [
        FieldType::SingleLineText,
        FieldType::Email,
        FieldType::Url,
        FieldType::MultilineText,
        FieldType::RichText,
        FieldType::PhoneNumber,
        FieldType::Number,
        FieldType::Percent,
        FieldType::Currency,
        FieldType::Duration,
        FieldType::Rating,
        FieldType::Checkbox,
        FieldType::SingleSelect,
        FieldType::MultipleSelects,
        FieldType::SingleCollaborator,
        FieldType::MultipleCollaborators,
        FieldType::MultipleRecordLinks,
        FieldType::Date,
        FieldType::DateTime,
        FieldType::MultipleAttachments,
        FieldType::Barcode,
        FieldType::Formula,
        FieldType::Rollup,
        FieldType::Count,
        FieldType::MultipleLookupValues,
        FieldType::AutoNumber,
        FieldType::CreatedTime,
        FieldType::LastModifiedTime,
        FieldType::CreatedBy,
        FieldType::LastModifiedBy,
        FieldType::Button,
        FieldType::Unknown,
    ];

    /// Wire name of the logical type
    pub fn as_str(self) -> &'static str {
        match self {
            FieldType::SingleLineText => "singleLineText",
            FieldType::Email => "email",
            FieldType::Url => "url",
            FieldType::MultilineText => "multilineText",
            FieldType::RichText => "richText",
            FieldType::PhoneNumber => "phoneNumber",
            FieldType::Number => "number",
            FieldType::Percent => "percent",
            FieldType::Currency => "currency",
            FieldType::Duration => "duration",
            FieldType::Rating => "rating",
            FieldType::Checkbox => "checkbox",
            FieldType::SingleSelect => "singleSelect",
            FieldType::MultipleSelects => "multipleSelects",
            FieldType::SingleCollaborator => "singleCollaborator",
            FieldType::MultipleCollaborators => "multipleCollaborators",
            FieldType::MultipleRecordLinks => "multipleRecordLinks",
            FieldType::Date => "date",
            FieldType::DateTime => "dateTime",
            FieldType::MultipleAttachments => "multipleAttachments",
            FieldType::Barcode => "barcode",
            FieldType::Formula => "formula",
            FieldType::Rollup => "rollup",
            FieldType::Count => "count",
            FieldType::MultipleLookupValues => "multipleLookupValues",
            FieldType::AutoNumber => "autoNumber",
            FieldType::CreatedTime => "createdTime",
            FieldType::LastModifiedTime => "lastModifiedTime",
            FieldType::CreatedBy => "createdBy",
            FieldType::LastModifiedBy => "lastModifiedBy",
            FieldType::Button => "button",
            FieldType::Unknown => "unknown",
        }
    }

    /// Resolve a raw stored tag to a logical type.
    ///
    /// Legacy tags are remapped, consulting `type_options` where the raw
    /// tag alone is ambiguous. Logical names are accepted verbatim and
    /// anything else becomes `Unknown`.
    pub fn from_raw(raw: &str, type_options: Option<&Value>) -> FieldType {
        let option_str = |name: &str| {
            type_options
                .and_then(|opts| opts.get(name))
                .and_then(Value::as_str)
        };

        match raw {
            "text" => match option_str("validatorName") {
                Some("email") => FieldType::Email,
                Some("url") => FieldType::Url,
                _ => FieldType::SingleLineText,
            },
            "number" => match option_str("format") {
                Some("currency") => FieldType::Currency,
                Some("percentV2") => FieldType::Percent,
                Some("duration") => FieldType::Duration,
                _ => FieldType::Number,
            },
            "date" => {
                let is_date_time = type_options
                    .and_then(|opts| opts.get("isDateTime"))
                    .and_then(Value::as_bool)
                    .unwrap_or(false);
                if is_date_time {
                    FieldType::DateTime
                } else {
                    FieldType::Date
                }
            }
            "phone" => FieldType::PhoneNumber,
            "select" => FieldType::SingleSelect,
            "multiSelect" => FieldType::MultipleSelects,
            "collaborator" => FieldType::SingleCollaborator,
            "multiCollaborator" => FieldType::MultipleCollaborators,
            "lookup" => FieldType::MultipleLookupValues,
            "multipleAttachment" => FieldType::MultipleAttachments,
            other => other.parse().unwrap_or(FieldType::Unknown),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for a name that is not a logical field type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownFieldType(pub String);

impl fmt::Display for UnknownFieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown field type: {}", self.0)
    }
}

impl std::error::Error for UnknownFieldType {}

impl From<FieldType> for String {
    fn from(field_type: FieldType) -> Self {
        field_type.as_str().to_owned()
    }
}

impl FromStr for FieldType {
    type Err = UnknownFieldType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FieldType::ALL
            .iter()
            .copied()
            .find(|t| *t != FieldType::Unknown && t.as_str() == s)
            .ok_or_else(|| UnknownFieldType(s.to_owned()))
    }
}
