//! Pure field-extraction cascade over sampled record payloads.
//!
//! Each rung is a standalone function returning `None` when its shape is
//! absent or empty, so the priority order stays testable rung by rung.

use bridge_schema::{FieldDescriptor, RecordPayload, RecordTemplate, TemplateField};
use serde::Serialize;
use serde_json::Value;

/// Which rung of the discovery cascade produced a field list. `Fallback`
/// marks non-authoritative data; callers surface that as a warning instead of
/// reverse-engineering field names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldSource {
    TemplateMetadata,
    RecordFieldValues,
    RecordFieldsArray,
    RecordKeys,
    Fallback,
}

impl FieldSource {
    pub fn is_fallback(self) -> bool {
        matches!(self, FieldSource::Fallback)
    }
}

/// A normalized field list tagged with where it came from.
#[derive(Debug, Clone)]
pub struct DiscoveredFields {
    pub fields: Vec<FieldDescriptor>,
    pub source: FieldSource,
}

/// Bookkeeping keys that are not queryable attributes of a record.
const DENY_LIST: [&str; 6] = [
    "id",
    "recordId",
    "recordTemplateId",
    "createdAt",
    "updatedAt",
    "lastChangedOn",
];

/// Rung 1: explicit `fields` metadata on the template. Authoritative.
pub fn fields_from_template(template: &RecordTemplate) -> Option<Vec<FieldDescriptor>> {
    if template.fields.is_empty() {
        return None;
    }
    Some(template.fields.iter().map(descriptor_from_template_field).collect())
}

/// Rung 2: keys of the record's `fieldValues` mapping.
pub fn fields_from_field_values(record: &RecordPayload) -> Option<Vec<FieldDescriptor>> {
    if record.field_values.is_empty() {
        return None;
    }
    Some(
        record
            .field_values
            .iter()
            .map(|(identifier, value)| descriptor_from_field_value(identifier, value))
            .collect(),
    )
}

/// Rung 3: a `fields` array on the record itself.
pub fn fields_from_fields_array(record: &RecordPayload) -> Option<Vec<FieldDescriptor>> {
    if record.fields.is_empty() {
        return None;
    }
    Some(record.fields.iter().map(descriptor_from_template_field).collect())
}

/// Rung 4: the record's own top-level keys minus the bookkeeping deny-list.
pub fn fields_from_record_keys(record: &RecordPayload) -> Option<Vec<FieldDescriptor>> {
    let fields: Vec<FieldDescriptor> = record
        .extra
        .keys()
        .filter(|key| !DENY_LIST.contains(&key.as_str()))
        .map(|key| FieldDescriptor::new(key.as_str()))
        .collect();
    if fields.is_empty() { None } else { Some(fields) }
}

/// Run the sample-record rungs in priority order; first non-empty wins.
pub fn fields_from_record(record: &RecordPayload) -> Option<DiscoveredFields> {
    fields_from_field_values(record)
        .map(|fields| DiscoveredFields {
            fields,
            source: FieldSource::RecordFieldValues,
        })
        .or_else(|| {
            fields_from_fields_array(record).map(|fields| DiscoveredFields {
                fields,
                source: FieldSource::RecordFieldsArray,
            })
        })
        .or_else(|| {
            fields_from_record_keys(record).map(|fields| DiscoveredFields {
                fields,
                source: FieldSource::RecordKeys,
            })
        })
}

/// Fixed non-authoritative set that keeps dependent UI functional when live
/// discovery yields nothing.
pub fn fallback_fields() -> Vec<FieldDescriptor> {
    vec![
        FieldDescriptor::named("Name", "Name"),
        FieldDescriptor::named("Description", "Description"),
        FieldDescriptor::named("Status", "Status"),
        FieldDescriptor::named("ExternalId", "External ID"),
    ]
}

fn descriptor_from_template_field(field: &TemplateField) -> FieldDescriptor {
    let mut descriptor = FieldDescriptor::new(field.identifier.as_str());
    if let Some(name) = field.display_name.as_deref() {
        descriptor.name = name.to_string();
    }
    descriptor.required = field.required;
    descriptor
}

fn descriptor_from_field_value(identifier: &str, value: &Value) -> FieldDescriptor {
    let mut descriptor = FieldDescriptor::new(identifier);
    // Rich field values carry their own display metadata; scalars do not.
    if let Value::Object(map) = value {
        if let Some(name) = map.get("displayName").and_then(Value::as_str) {
            descriptor.name = name.to_string();
        }
        if let Some(kind) = map.get("type").and_then(Value::as_str) {
            descriptor.field_type = Some(kind.to_string());
        }
    }
    descriptor
}
