use crate::db::{DbIntegrationConfig, IntegrationCreate};
use crate::error::BridgeError;
use crate::server::router::BridgeState;
use axum::{
    Json,
    extract::{Path, State},
};
use bridge_schema::FieldMappingEntry;
use serde::Deserialize;
use serde_json::{Map, Value, json};
use std::time::Duration;

const SUPPORTED_PLATFORMS: [&str; 3] = ["salesforce", "hubspot", "sap"];

const HEALTH_CHECK_TIMEOUT: Duration = Duration::from_secs(5);

/// Inbound save payload. The platform-specific connection block arrives keyed
/// by the platform name (`salesforce: {...}`), so unknown keys are collected
/// and looked up after validation.
#[derive(Debug, Deserialize)]
pub struct SaveIntegrationRequest {
    #[serde(default)]
    pub platform: String,
    #[serde(default)]
    pub alchemy: Value,
    #[serde(default)]
    pub field_mappings: Vec<FieldMappingEntry>,
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

impl SaveIntegrationRequest {
    fn validate(&self) -> Result<(), BridgeError> {
        if !SUPPORTED_PLATFORMS.contains(&self.platform.as_str()) {
            return Err(BridgeError::InvalidRequest(format!(
                "Unsupported platform: {}",
                self.platform
            )));
        }

        let tenant_id = self.alchemy.get("tenant_id").and_then(Value::as_str);
        let record_type = self.alchemy.get("record_type").and_then(Value::as_str);
        if tenant_id.is_none_or(str::is_empty) || record_type.is_none_or(str::is_empty) {
            return Err(BridgeError::InvalidRequest(
                "Missing required Alchemy configuration (tenant_id, record_type)".to_string(),
            ));
        }

        if self.field_mappings.is_empty() {
            return Err(BridgeError::InvalidRequest(
                "No field mappings provided".to_string(),
            ));
        }
        Ok(())
    }

    fn platform_connection(&self) -> Value {
        self.rest
            .get(self.platform.as_str())
            .cloned()
            .unwrap_or_else(|| Value::Object(Map::new()))
    }
}

pub async fn save_integration(
    State(state): State<BridgeState>,
    Json(req): Json<SaveIntegrationRequest>,
) -> Result<Json<Value>, BridgeError> {
    req.validate()?;

    let create = IntegrationCreate {
        platform: req.platform.clone(),
        alchemy_config: serde_json::to_string(&req.alchemy)?,
        platform_connection: serde_json::to_string(&req.platform_connection())?,
        field_mappings: serde_json::to_string(&req.field_mappings)?,
    };

    let id = state.db.create(create).await?;
    tracing::info!(platform = %req.platform, integration_id = id, "integration saved");

    Ok(Json(json!({
        "status": "success",
        "message": format!("{} integration saved successfully", req.platform),
        "integration_id": id,
    })))
}

/// Rehydrate the opaque blob columns for the caller.
fn integration_json(row: &DbIntegrationConfig) -> Value {
    let parse = |blob: &str| -> Value {
        serde_json::from_str(blob).unwrap_or_else(|_| Value::String(blob.to_string()))
    };
    json!({
        "id": row.id,
        "platform": row.platform,
        "alchemy": parse(&row.alchemy_config),
        "platform_connection": parse(&row.platform_connection),
        "field_mappings": parse(&row.field_mappings),
        "created_at": row.created_at,
        "updated_at": row.updated_at,
    })
}

pub async fn list_integrations(
    State(state): State<BridgeState>,
) -> Result<Json<Value>, BridgeError> {
    let rows = state.db.list_active().await?;
    let integrations: Vec<Value> = rows.iter().map(integration_json).collect();

    Ok(Json(json!({
        "status": "success",
        "message": format!("Found {} integrations", integrations.len()),
        "integrations": integrations,
    })))
}

pub async fn get_integration(
    State(state): State<BridgeState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, BridgeError> {
    let row = state.db.get_by_id(id).await?;

    Ok(Json(json!({
        "status": "success",
        "message": "Integration found",
        "integration": integration_json(&row),
    })))
}

pub async fn delete_integration(
    State(state): State<BridgeState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, BridgeError> {
    state.db.deactivate(id).await?;
    tracing::info!(integration_id = id, "integration deactivated");

    Ok(Json(json!({
        "status": "success",
        "message": format!("Integration {id} deleted"),
    })))
}

/// Sync stub: verifies the integration exists, then answers with a canned
/// queued-job payload. There is no durable sync pipeline behind this.
pub async fn trigger_sync(
    State(state): State<BridgeState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, BridgeError> {
    let row = state.db.get_by_id(id).await?;

    Ok(Json(json!({
        "status": "success",
        "message": format!("Sync queued for {} integration", row.platform),
        "integration_id": row.id,
        "job": { "state": "queued", "records_synced": 0 },
    })))
}

/// Basic connectivity probe against the Alchemy auth and core hosts.
pub async fn api_health_check(State(state): State<BridgeState>) -> Json<Value> {
    async fn probe(client: &reqwest::Client, url: url::Url) -> Value {
        match client
            .get(url)
            .timeout(HEALTH_CHECK_TIMEOUT)
            .send()
            .await
        {
            Ok(resp) => {
                let status = resp.status();
                json!({ "status_code": status.as_u16(), "available": status.as_u16() < 500 })
            }
            Err(e) => json!({ "available": false, "error": e.to_string() }),
        }
    }

    let cfg = state.alchemy.config();
    let auth_url = cfg.auth_base_url.join("auth").ok();
    let core_url = cfg.core_base_url.join("health").ok();

    let (auth, core) = match (auth_url, core_url) {
        (Some(auth_url), Some(core_url)) => (
            probe(state.alchemy.http(), auth_url).await,
            probe(state.alchemy.http(), core_url).await,
        ),
        _ => (
            json!({ "available": false, "error": "invalid base url" }),
            json!({ "available": false, "error": "invalid base url" }),
        ),
    };

    Json(json!({
        "status": "success",
        "auth_api": auth,
        "core_api": core,
    }))
}
