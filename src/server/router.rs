use crate::alchemy::AlchemyClient;
use crate::db::DbActorHandle;
use crate::server::guards::auth::RequireKeyAuth;
use crate::server::routes::{discovery, integrations};

use axum::{
    Router,
    extract::Request,
    http::{HeaderName, HeaderValue, StatusCode, header::USER_AGENT},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};
use base64::Engine as _;
use rand::RngCore;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

const MAX_REQUEST_ID_LEN: usize = 128;
const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

fn generate_request_id() -> String {
    // 96 bits => 16 chars base64url (no padding).
    let mut bytes = [0u8; 12];
    rand::rng().fill_bytes(&mut bytes);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

#[derive(Clone)]
pub struct BridgeState {
    pub alchemy: AlchemyClient,
    pub db: DbActorHandle,
    pub bridge_key: Arc<str>,
}

impl BridgeState {
    pub fn new(alchemy: AlchemyClient, db: DbActorHandle, bridge_key: Arc<str>) -> Self {
        Self {
            alchemy,
            db,
            bridge_key,
        }
    }
}

async fn not_found_handler() -> StatusCode {
    StatusCode::NOT_FOUND
}

/// Reuse the caller's request id when it looks sane, otherwise mint one.
fn effective_request_id(req: &Request) -> String {
    req.headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty() && v.len() <= MAX_REQUEST_ID_LEN)
        .map_or_else(generate_request_id, str::to_string)
}

async fn access_log(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let request_id = effective_request_id(&req);
    let user_agent = req
        .headers()
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
        .to_string();

    let start = Instant::now();
    let mut resp = next.run(req).await;

    // Reflect the id so callers can correlate even when they sent none.
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        resp.headers_mut().insert(X_REQUEST_ID, value);
    }

    let status = resp.status();
    let line = format!(
        "| {:>3} | {} | {:^7} | {} | {}ms | {}",
        status.as_u16(),
        request_id,
        method.as_str(),
        path,
        start.elapsed().as_millis(),
        user_agent
    );
    if status.is_server_error() {
        error!("{line}");
    } else if status.is_client_error() {
        warn!("{line}");
    } else {
        info!("{line}");
    }

    resp
}

pub fn bridge_router(state: BridgeState) -> Router {
    let api = Router::new()
        .route("/test-alchemy-auth", post(discovery::test_alchemy_auth))
        .route("/get-alchemy-record-types", post(discovery::get_record_types))
        .route("/get-alchemy-fields", post(discovery::get_fields))
        .route("/save-integration", post(integrations::save_integration))
        .route("/integrations", get(integrations::list_integrations))
        .route(
            "/integrations/{id}",
            get(integrations::get_integration).delete(integrations::delete_integration),
        )
        .route("/sync/{id}", post(integrations::trigger_sync))
        .layer(middleware::from_extractor_with_state::<RequireKeyAuth, _>(
            state.clone(),
        ));

    // Reachability probe stays open; it carries no tenant data.
    let open = Router::new().route("/api-health-check", get(integrations::api_health_check));

    Router::new()
        .merge(api)
        .merge(open)
        .fallback(not_found_handler)
        .with_state(state)
        .layer(middleware::from_fn(access_log))
}
