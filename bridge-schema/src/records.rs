use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field entry as it appears inside a record template's metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateField {
    pub identifier: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub required: Option<bool>,
}

/// A schema/template exposed by a tenant.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordTemplate {
    pub identifier: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    /// Present only on deployments that expose field metadata directly.
    #[serde(default)]
    pub fields: Vec<TemplateField>,
}

impl RecordTemplate {
    /// Display label with `displayName ?? name ?? identifier` precedence.
    pub fn label(&self) -> &str {
        self.display_name
            .as_deref()
            .or(self.name.as_deref())
            .unwrap_or(&self.identifier)
    }
}

/// The record-templates listing arrives either bare or wrapped.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RecordTemplateList {
    Bare(Vec<RecordTemplate>),
    Wrapped {
        #[serde(rename = "recordTemplates")]
        record_templates: Vec<RecordTemplate>,
    },
}

impl RecordTemplateList {
    pub fn into_vec(self) -> Vec<RecordTemplate> {
        match self {
            RecordTemplateList::Bare(templates) => templates,
            RecordTemplateList::Wrapped { record_templates } => record_templates,
        }
    }
}

/// Caller-facing record-type summary: `{identifier, name}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordTypeSummary {
    pub identifier: String,
    pub name: String,
}

impl From<RecordTemplate> for RecordTypeSummary {
    fn from(template: RecordTemplate) -> Self {
        let name = template.label().to_string();
        Self {
            identifier: template.identifier,
            name,
        }
    }
}

/// Body of the bounded sample query against the record-search endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterRecordsRequest {
    pub query_term: String,
    pub record_template_identifier: String,
    pub drop: u32,
    pub take: u32,
    pub last_changed_on_from: String,
    pub last_changed_on_to: String,
}

impl FilterRecordsRequest {
    /// One record, near-universal predicate, maximal date window.
    pub fn sample(record_type: &str) -> Self {
        Self {
            query_term: "Result.Status == 'Valid'".to_string(),
            record_template_identifier: record_type.to_string(),
            drop: 0,
            take: 1,
            last_changed_on_from: "2021-03-03T00:00:00Z".to_string(),
            last_changed_on_to: "2028-03-04T00:00:00Z".to_string(),
        }
    }
}

/// Record-search response: `{records: [...]}` or a bare list.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum FilterRecordsResponse {
    Wrapped { records: Vec<RecordPayload> },
    Bare(Vec<RecordPayload>),
}

impl FilterRecordsResponse {
    pub fn into_records(self) -> Vec<RecordPayload> {
        match self {
            FilterRecordsResponse::Wrapped { records } => records,
            FilterRecordsResponse::Bare(records) => records,
        }
    }
}

/// One sampled record. `field_values` and `fields` cover the two structured
/// layouts; everything else lands in `extra` for the raw-key fallback.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecordPayload {
    #[serde(default, rename = "fieldValues")]
    pub field_values: Map<String, Value>,
    #[serde(default)]
    pub fields: Vec<TemplateField>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn template_label_precedence() {
        let raw = json!([
            { "identifier": "Sample", "displayName": "Lab Sample", "name": "sample" },
            { "identifier": "Batch", "name": "Production Batch" },
            { "identifier": "Result" }
        ]);
        let templates: Vec<RecordTemplate> = serde_json::from_value(raw).expect("parse templates");
        assert_eq!(templates[0].label(), "Lab Sample");
        assert_eq!(templates[1].label(), "Production Batch");
        assert_eq!(templates[2].label(), "Result");
    }

    #[test]
    fn template_list_accepts_bare_and_wrapped() {
        let bare = json!([ { "identifier": "Sample" } ]);
        let wrapped = json!({ "recordTemplates": [ { "identifier": "Sample" } ] });

        let from_bare: RecordTemplateList = serde_json::from_value(bare).expect("parse bare");
        let from_wrapped: RecordTemplateList =
            serde_json::from_value(wrapped).expect("parse wrapped");

        assert_eq!(from_bare.into_vec().len(), 1);
        assert_eq!(from_wrapped.into_vec().len(), 1);
    }

    #[test]
    fn sample_request_is_bounded_to_one_record() {
        let req = FilterRecordsRequest::sample("Sample");
        assert_eq!(req.take, 1);
        assert_eq!(req.drop, 0);
        assert_eq!(req.record_template_identifier, "Sample");

        let value = serde_json::to_value(&req).expect("serialize request");
        assert_eq!(value["queryTerm"], "Result.Status == 'Valid'");
        assert_eq!(value["recordTemplateIdentifier"], "Sample");
        assert_eq!(value["lastChangedOnFrom"], "2021-03-03T00:00:00Z");
    }

    #[test]
    fn filter_response_accepts_both_shapes() {
        let wrapped = json!({ "records": [ { "fieldValues": { "Status": "Valid" } } ] });
        let bare = json!([ { "fieldValues": { "Status": "Valid" } } ]);

        let from_wrapped: FilterRecordsResponse =
            serde_json::from_value(wrapped).expect("parse wrapped");
        let from_bare: FilterRecordsResponse = serde_json::from_value(bare).expect("parse bare");

        assert_eq!(from_wrapped.into_records().len(), 1);
        assert_eq!(from_bare.into_records().len(), 1);
    }

    #[test]
    fn record_payload_splits_known_and_raw_keys() {
        let raw = json!({
            "id": 7,
            "recordTemplateId": 3,
            "fieldValues": { "Status": "Valid" },
            "SampleName": "S-001"
        });
        let record: RecordPayload = serde_json::from_value(raw).expect("parse record");
        assert_eq!(record.field_values.len(), 1);
        assert!(record.fields.is_empty());
        assert!(record.extra.contains_key("id"));
        assert!(record.extra.contains_key("SampleName"));
        assert!(!record.extra.contains_key("fieldValues"));
    }
}
