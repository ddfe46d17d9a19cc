use crate::server::router::BridgeState;
use axum::{
    Json,
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};
use serde_json::json;
use subtle::ConstantTimeEq;

/// Shared-key guard for the configuration API. The key may arrive as an
/// `x-bridge-key` header, a bearer token, or a `key` query parameter;
/// comparison against the configured key is constant-time.
#[derive(Debug, Clone, Copy)]
pub struct RequireKeyAuth;

/// Pull the supplied key out of the request, checking the dedicated header
/// first, then the Authorization header, then the query string.
fn supplied_key(parts: &Parts) -> Option<String> {
    let headers = &parts.headers;
    if let Some(value) = headers.get("x-bridge-key")
        && let Ok(key) = value.to_str()
    {
        return Some(key.to_string());
    }
    if let Some(bearer) = headers.typed_get::<Authorization<Bearer>>() {
        return Some(bearer.token().to_string());
    }
    let query = parts.uri.query()?;
    url::form_urlencoded::parse(query.as_bytes())
        .find_map(|(k, v)| (k == "key").then(|| v.into_owned()))
}

impl FromRequestParts<BridgeState> for RequireKeyAuth {
    type Rejection = KeyRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &BridgeState,
    ) -> Result<Self, Self::Rejection> {
        let Some(key) = supplied_key(parts) else {
            return Err(KeyRejection("Missing API key"));
        };

        let matches: bool = key
            .as_bytes()
            .ct_eq(state.bridge_key.as_bytes())
            .into();
        if matches {
            Ok(RequireKeyAuth)
        } else {
            Err(KeyRejection("Invalid API key"))
        }
    }
}

pub struct KeyRejection(&'static str);

impl IntoResponse for KeyRejection {
    fn into_response(self) -> Response {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "status": "error", "message": self.0 })),
        )
            .into_response()
    }
}
