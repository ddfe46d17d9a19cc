use serde::{Deserialize, Serialize};

/// One schema attribute of a record type. Unique by identifier within a
/// record type's field list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub identifier: String,
    pub name: String,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub field_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
}

impl FieldDescriptor {
    /// Descriptor whose display name defaults to its identifier.
    pub fn new(identifier: impl Into<String>) -> Self {
        let identifier = identifier.into();
        Self {
            name: identifier.clone(),
            identifier,
            field_type: None,
            required: None,
        }
    }

    pub fn named(identifier: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            name: name.into(),
            field_type: None,
            required: None,
        }
    }
}

/// User-defined source-to-target association stored inside an integration
/// configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMappingEntry {
    pub source_field: String,
    pub target_field: String,
    #[serde(default)]
    pub required: bool,
}
