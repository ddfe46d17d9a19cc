use crate::alchemy::{FieldSource, TenantCredential};
use crate::error::BridgeError;
use crate::server::router::BridgeState;
use axum::{Json, extract::State};
use bridge_schema::{FieldDescriptor, RecordTypeSummary};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Inbound payload shared by the discovery endpoints: a tenant plus one of
/// {refresh token, email+password}, and for field discovery a record type.
#[derive(Debug, Deserialize)]
pub struct DiscoveryRequest {
    #[serde(default)]
    pub tenant_id: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub record_type: Option<String>,
}

impl DiscoveryRequest {
    fn tenant_id(&self) -> Result<&str, BridgeError> {
        let tenant_id = self.tenant_id.trim();
        if tenant_id.is_empty() {
            return Err(BridgeError::InvalidRequest("Missing tenant_id".to_string()));
        }
        Ok(tenant_id)
    }

    fn credential(&self) -> Result<TenantCredential, BridgeError> {
        if let Some(refresh_token) = self.refresh_token.as_deref().filter(|t| !t.trim().is_empty())
        {
            return Ok(TenantCredential::RefreshToken(refresh_token.to_string()));
        }
        if let (Some(email), Some(password)) = (self.email.as_deref(), self.password.as_deref())
            && !email.trim().is_empty()
            && !password.is_empty()
        {
            return Ok(TenantCredential::Password {
                email: email.to_string(),
                password: password.to_string(),
            });
        }
        Err(BridgeError::InvalidRequest(
            "Missing refresh_token or email/password".to_string(),
        ))
    }

    fn record_type(&self) -> Result<&str, BridgeError> {
        self.record_type
            .as_deref()
            .map(str::trim)
            .filter(|rt| !rt.is_empty())
            .ok_or_else(|| BridgeError::InvalidRequest("Missing record_type".to_string()))
    }
}

#[derive(Debug, Serialize)]
pub struct AuthTestResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
    pub expires_in: i64,
}

/// Credential diagnostics: resolve a token and report its lifetime.
pub async fn test_alchemy_auth(
    State(state): State<BridgeState>,
    Json(req): Json<DiscoveryRequest>,
) -> Result<Json<AuthTestResponse>, BridgeError> {
    let tenant_id = req.tenant_id()?;
    let credential = req.credential()?;

    let token = state.alchemy.get_token(tenant_id, &credential).await?;

    Ok(Json(AuthTestResponse {
        status: "success",
        message: "Authentication successful",
        access_token: token.value.to_string(),
        expires_at: token.expires_at,
        expires_in: token.seconds_remaining(),
    }))
}

#[derive(Debug, Serialize)]
pub struct RecordTypesResponse {
    pub status: &'static str,
    pub message: String,
    pub record_types: Vec<RecordTypeSummary>,
}

pub async fn get_record_types(
    State(state): State<BridgeState>,
    Json(req): Json<DiscoveryRequest>,
) -> Result<Json<RecordTypesResponse>, BridgeError> {
    let tenant_id = req.tenant_id()?;
    let credential = req.credential()?;

    let token = state.alchemy.get_token(tenant_id, &credential).await?;
    let record_types = state.alchemy.list_record_types(&token, tenant_id).await;

    let (status, message) = if record_types.is_empty() {
        ("warning", "No record types returned".to_string())
    } else {
        (
            "success",
            format!("Successfully fetched {} record types", record_types.len()),
        )
    };

    Ok(Json(RecordTypesResponse {
        status,
        message,
        record_types,
    }))
}

#[derive(Debug, Serialize)]
pub struct FieldsResponse {
    pub status: &'static str,
    pub message: String,
    pub source: FieldSource,
    pub fields: Vec<FieldDescriptor>,
}

pub async fn get_fields(
    State(state): State<BridgeState>,
    Json(req): Json<DiscoveryRequest>,
) -> Result<Json<FieldsResponse>, BridgeError> {
    let tenant_id = req.tenant_id()?;
    let credential = req.credential()?;
    let record_type = req.record_type()?;

    let discovered = state
        .alchemy
        .get_fields(tenant_id, &credential, record_type)
        .await?;

    let (status, message) = if discovered.source.is_fallback() {
        (
            "warning",
            "Using fallback fields; live schema discovery found none".to_string(),
        )
    } else {
        (
            "success",
            format!("Successfully extracted {} fields", discovered.fields.len()),
        )
    };

    Ok(Json(FieldsResponse {
        status,
        message,
        source: discovered.source,
        fields: discovered.fields,
    }))
}
