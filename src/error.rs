use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use serde_json::{Value, json};
use thiserror::Error as ThisError;

pub trait IsRetryable {
    fn is_retryable(&self) -> bool;
}

#[derive(Debug, ThisError)]
pub enum BridgeError {
    /// Auth endpoint rejected the credentials (transport-level failures are
    /// `Transport`; this is a definitive non-2xx from the provider).
    #[error("authentication failed with upstream status {status}")]
    AuthFailure { status: StatusCode, body: String },

    /// Credentials were valid but the requested tenant is absent from the
    /// per-tenant token list. Carries every tenant id the response did hold.
    #[error("tenant `{tenant_id}` not present in sign-in token list")]
    TenantNotFound {
        tenant_id: String,
        available: Vec<String>,
    },

    #[error("upstream error with status: {0}")]
    UpstreamStatus(StatusCode),

    #[error("HTTP request error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("upstream response parse error: {message}. Body: {body}")]
    Parse { message: String, body: String },

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("integration {0} not found")]
    IntegrationNotFound(i64),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("actor error: {0}")]
    Ractor(String),
}

/// Cap upstream bodies carried inside errors and logs.
pub(crate) fn truncate_body(body: &str) -> String {
    body.char_indices()
        .nth(300)
        .map(|(idx, _)| format!("{}...<truncated>", &body[..idx]))
        .unwrap_or_else(|| body.to_string())
}

impl IsRetryable for BridgeError {
    fn is_retryable(&self) -> bool {
        match self {
            BridgeError::Transport(_) | BridgeError::Parse { .. } => true,
            BridgeError::AuthFailure { status, .. } | BridgeError::UpstreamStatus(status) => {
                *status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
            }
            _ => false,
        }
    }
}

/// Outbound failure envelope, matching the `{status, message}` shape every
/// handler speaks.
#[derive(Serialize)]
pub struct ApiFailureBody {
    pub status: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl IntoResponse for BridgeError {
    fn into_response(self) -> axum::response::Response {
        let (status, message, details) = match self {
            BridgeError::AuthFailure {
                status: upstream,
                body,
            } => (
                StatusCode::UNAUTHORIZED,
                "Authentication with Alchemy failed.".to_string(),
                Some(json!({ "upstream_status": upstream.as_u16(), "error_body": body })),
            ),

            BridgeError::TenantNotFound {
                tenant_id,
                available,
            } => (
                StatusCode::UNAUTHORIZED,
                format!("Tenant `{tenant_id}` was not found in the sign-in response."),
                Some(json!({ "tenant_id": tenant_id, "available_tenants": available })),
            ),

            BridgeError::InvalidRequest(message) => (StatusCode::BAD_REQUEST, message, None),

            BridgeError::IntegrationNotFound(id) => (
                StatusCode::NOT_FOUND,
                format!("Integration {id} not found."),
                None,
            ),

            BridgeError::Transport(_) | BridgeError::UpstreamStatus(_) => (
                StatusCode::BAD_GATEWAY,
                "Upstream Alchemy service error.".to_string(),
                None,
            ),

            BridgeError::Parse { .. } => (
                StatusCode::BAD_GATEWAY,
                "Failed to parse upstream response.".to_string(),
                None,
            ),

            BridgeError::Json(_)
            | BridgeError::Url(_)
            | BridgeError::Database(_)
            | BridgeError::Ractor(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "An internal server error occurred.".to_string(),
                None,
            ),
        };

        (
            status,
            Json(ApiFailureBody {
                status: "error",
                message,
                details,
            }),
        )
            .into_response()
    }
}
