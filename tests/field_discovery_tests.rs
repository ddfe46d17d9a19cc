use alchemy_bridge::alchemy::{AlchemyClient, FieldSource, TenantCredential};
use alchemy_bridge::config::AlchemyConfig;
use alchemy_bridge::error::BridgeError;
use alchemy_bridge::server::router::{BridgeState, bridge_router};
use axum::{
    Json, Router,
    body::Body,
    extract::{Path, State},
    http::{Request, StatusCode, header},
    routing::{get, post, put},
};
use serde_json::{Value, json};
use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::net::TcpListener;
use tower::ServiceExt;
use url::Url;

const TEST_KEY: &str = "test-bridge-key";

/// Scripted Alchemy upstream covering the whole discovery path: token
/// exchange, template listing, and the bounded sample query.
#[derive(Clone)]
struct UpstreamState {
    templates_status: StatusCode,
    templates_body: Value,
    records_status: StatusCode,
    records_body: Value,
    token_status: StatusCode,
    token_hits: Arc<AtomicUsize>,
    records_hits: Arc<AtomicUsize>,
}

impl UpstreamState {
    fn new() -> Self {
        Self {
            templates_status: StatusCode::OK,
            templates_body: json!([]),
            records_status: StatusCode::OK,
            records_body: json!({ "records": [] }),
            token_status: StatusCode::OK,
            token_hits: Arc::new(AtomicUsize::new(0)),
            records_hits: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn with_templates(mut self, body: Value) -> Self {
        self.templates_body = body;
        self
    }

    fn with_templates_status(mut self, status: StatusCode) -> Self {
        self.templates_status = status;
        self
    }

    fn with_records(mut self, status: StatusCode, body: Value) -> Self {
        self.records_status = status;
        self.records_body = body;
        self
    }

    fn rejecting_auth(mut self) -> Self {
        self.token_status = StatusCode::UNAUTHORIZED;
        self
    }
}

async fn token_handler(
    State(state): State<UpstreamState>,
    Path(_tenant): Path<String>,
) -> (StatusCode, Json<Value>) {
    state.token_hits.fetch_add(1, Ordering::SeqCst);
    let body = if state.token_status.is_success() {
        json!({ "access_token": "at-1", "expires_in": 3600 })
    } else {
        json!({ "error": "invalid_grant" })
    };
    (state.token_status, Json(body))
}

async fn templates_handler(State(state): State<UpstreamState>) -> (StatusCode, Json<Value>) {
    (state.templates_status, Json(state.templates_body.clone()))
}

async fn records_handler(State(state): State<UpstreamState>) -> (StatusCode, Json<Value>) {
    state.records_hits.fetch_add(1, Ordering::SeqCst);
    (state.records_status, Json(state.records_body.clone()))
}

async fn spawn_upstream(state: UpstreamState) -> Url {
    let app = Router::new()
        .route(
            "/auth/realms/{tenant}/protocol/openid-connect/token",
            post(token_handler),
        )
        .route("/core/api/v2/record-templates", get(templates_handler))
        .route("/core/api/v2/filter-records", put(records_handler))
        .with_state(state);

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("server run");
    });

    Url::parse(&format!("http://{addr}")).expect("valid base url")
}

fn client_for(base: &Url) -> AlchemyClient {
    let cfg = AlchemyConfig {
        auth_base_url: base.clone(),
        core_base_url: base.clone(),
        ..AlchemyConfig::default()
    };
    AlchemyClient::new(Arc::new(cfg))
}

fn credential() -> TenantCredential {
    TenantCredential::RefreshToken("rt-1".to_string())
}

#[tokio::test]
async fn template_metadata_wins_and_skips_the_sample_query() {
    let state = UpstreamState::new().with_templates(json!([
        {
            "identifier": "Sample",
            "name": "Sample",
            "fields": [
                { "identifier": "sample_id", "displayName": "Sample ID", "required": true },
                { "identifier": "status" }
            ]
        }
    ]));
    let records_hits = state.records_hits.clone();
    let base = spawn_upstream(state).await;
    let client = client_for(&base);

    let found = client
        .get_fields("acme", &credential(), "Sample")
        .await
        .expect("discovery");

    assert_eq!(found.source, FieldSource::TemplateMetadata);
    let identifiers: Vec<&str> = found.fields.iter().map(|f| f.identifier.as_str()).collect();
    assert_eq!(identifiers, vec!["sample_id", "status"]);
    assert_eq!(found.fields[0].name, "Sample ID");
    assert_eq!(found.fields[0].required, Some(true));
    assert_eq!(
        records_hits.load(Ordering::SeqCst),
        0,
        "template hit must short-circuit the sample query"
    );
}

#[tokio::test]
async fn sample_record_field_values_feed_the_second_rung() {
    let state = UpstreamState::new()
        .with_templates(json!([ { "identifier": "Sample" } ]))
        .with_records(
            StatusCode::OK,
            json!({
                "records": [
                    {
                        "id": 42,
                        "fieldValues": {
                            "sample_name": "S-001",
                            "sample_status": { "displayName": "Sample Status", "type": "enum" }
                        }
                    }
                ]
            }),
        );
    let base = spawn_upstream(state).await;
    let client = client_for(&base);

    let found = client
        .get_fields("acme", &credential(), "Sample")
        .await
        .expect("discovery");

    assert_eq!(found.source, FieldSource::RecordFieldValues);
    let identifiers: Vec<&str> = found.fields.iter().map(|f| f.identifier.as_str()).collect();
    assert!(identifiers.contains(&"sample_name"));
    assert!(identifiers.contains(&"sample_status"));
}

#[tokio::test]
async fn bare_record_list_with_raw_keys_feeds_the_fourth_rung() {
    let state = UpstreamState::new()
        .with_templates(json!({ "recordTemplates": [ { "identifier": "Sample" } ] }))
        .with_records(
            StatusCode::OK,
            json!([
                {
                    "id": 7,
                    "recordTemplateId": 3,
                    "createdAt": "2024-01-01T00:00:00Z",
                    "SampleName": "S-001",
                    "Status": "Valid"
                }
            ]),
        );
    let base = spawn_upstream(state).await;
    let client = client_for(&base);

    let found = client
        .get_fields("acme", &credential(), "Sample")
        .await
        .expect("discovery");

    assert_eq!(found.source, FieldSource::RecordKeys);
    let identifiers: Vec<&str> = found.fields.iter().map(|f| f.identifier.as_str()).collect();
    assert_eq!(identifiers, vec!["SampleName", "Status"]);
}

#[tokio::test]
async fn zero_records_resolves_to_the_fallback_set() {
    let state = UpstreamState::new()
        .with_templates(json!([ { "identifier": "Sample" } ]))
        .with_records(StatusCode::OK, json!({ "records": [] }));
    let base = spawn_upstream(state).await;
    let client = client_for(&base);

    let found = client
        .get_fields("acme", &credential(), "Sample")
        .await
        .expect("discovery");

    assert_eq!(found.source, FieldSource::Fallback);
    let identifiers: Vec<&str> = found.fields.iter().map(|f| f.identifier.as_str()).collect();
    assert_eq!(identifiers, vec!["Name", "Description", "Status", "ExternalId"]);
}

#[tokio::test]
async fn upstream_failure_after_auth_also_resolves_to_fallback() {
    let state = UpstreamState::new()
        .with_templates(json!([]))
        .with_records(StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": "boom" }));
    let base = spawn_upstream(state).await;
    let client = client_for(&base);

    let found = client
        .get_fields("acme", &credential(), "Sample")
        .await
        .expect("post-auth failures must not surface as errors");

    assert_eq!(found.source, FieldSource::Fallback);
    assert_eq!(found.fields.len(), 4);
}

#[tokio::test]
async fn auth_failure_propagates_instead_of_falling_back() {
    let state = UpstreamState::new().rejecting_auth();
    let base = spawn_upstream(state).await;
    let client = client_for(&base);

    let err = client
        .get_fields("acme", &credential(), "Sample")
        .await
        .expect_err("credential rejection must be an error");

    assert!(matches!(err, BridgeError::AuthFailure { .. }));
}

#[tokio::test]
async fn unauthorized_core_api_drops_the_cached_token() {
    let state = UpstreamState::new().with_templates_status(StatusCode::UNAUTHORIZED);
    let token_hits = state.token_hits.clone();
    let base = spawn_upstream(state).await;
    let client = client_for(&base);

    let token = client
        .get_token("acme", &credential())
        .await
        .expect("token");
    assert_eq!(token_hits.load(Ordering::SeqCst), 1);

    // The core API rejects the token: listing degrades to empty and the
    // cached entry is dropped, so the next resolution exchanges again.
    let record_types = client.list_record_types(&token, "acme").await;
    assert!(record_types.is_empty());

    client
        .get_token("acme", &credential())
        .await
        .expect("fresh token");
    assert_eq!(token_hits.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn record_type_listing_labels_and_survives_failure() {
    let state = UpstreamState::new().with_templates(json!([
        { "identifier": "Sample", "displayName": "Lab Sample" },
        { "identifier": "Batch" }
    ]));
    let base = spawn_upstream(state).await;
    let client = client_for(&base);

    let token = client
        .get_token("acme", &credential())
        .await
        .expect("token");
    let record_types = client.list_record_types(&token, "acme").await;

    assert_eq!(record_types.len(), 2);
    assert_eq!(record_types[0].identifier, "Sample");
    assert_eq!(record_types[0].name, "Lab Sample");
    assert_eq!(record_types[1].name, "Batch");

    // Point the core base at a dead port: listing degrades to empty, no panic.
    let mut dead = base.clone();
    dead.set_port(Some(1)).expect("set port");
    let cfg = AlchemyConfig {
        auth_base_url: base.clone(),
        core_base_url: dead,
        connect_timeout_secs: 1,
        request_timeout_secs: 1,
        ..AlchemyConfig::default()
    };
    let degraded = AlchemyClient::new(Arc::new(cfg));
    let record_types = degraded.list_record_types(&token, "acme").await;
    assert!(record_types.is_empty());
}

fn unique_sqlite_url(prefix: &str) -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time before UNIX_EPOCH")
        .as_nanos();

    let mut temp_path = std::env::temp_dir();
    temp_path.push(format!(
        "bridge-{prefix}-{}-{}.sqlite",
        std::process::id(),
        nanos
    ));
    format!("sqlite:{}", temp_path.display())
}

/// Full service router wired to the scripted upstream.
async fn app_for(base: &Url, prefix: &str) -> Router {
    let db = alchemy_bridge::db::spawn(&unique_sqlite_url(prefix)).await;
    let state = BridgeState::new(client_for(base), db, Arc::from(TEST_KEY));
    bridge_router(state)
}

fn fields_request() -> Request<Body> {
    let payload = json!({
        "tenant_id": "acme",
        "refresh_token": "rt-1",
        "record_type": "Sample"
    });
    Request::builder()
        .method("POST")
        .uri("/get-alchemy-fields")
        .header("x-bridge-key", TEST_KEY)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(payload.to_string()))
        .expect("build request")
}

async fn body_json(resp: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("parse body json")
}

#[tokio::test]
async fn fields_route_reports_success_with_live_schema() {
    let state = UpstreamState::new().with_templates(json!([
        {
            "identifier": "Sample",
            "fields": [ { "identifier": "sample_id", "displayName": "Sample ID" } ]
        }
    ]));
    let base = spawn_upstream(state).await;
    let app = app_for(&base, "fieldsok").await;

    let resp = app.oneshot(fields_request()).await.expect("route");
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;

    assert_eq!(body["status"], "success");
    assert_eq!(body["source"], "template_metadata");
    assert_eq!(body["fields"][0]["identifier"], "sample_id");
    assert_eq!(body["fields"][0]["name"], "Sample ID");
}

#[tokio::test]
async fn fields_route_reports_warning_on_fallback() {
    // Live discovery comes up empty end to end, so the route answers with
    // the fixed fallback set and a warning status.
    let state = UpstreamState::new()
        .with_templates(json!([ { "identifier": "Sample" } ]))
        .with_records(StatusCode::OK, json!({ "records": [] }));
    let base = spawn_upstream(state).await;
    let app = app_for(&base, "fieldswarn").await;

    let resp = app.oneshot(fields_request()).await.expect("route");
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;

    assert_eq!(body["status"], "warning");
    assert_eq!(body["source"], "fallback");
    let fields = body["fields"].as_array().expect("fields array");
    assert_eq!(fields.len(), 4);
    assert_eq!(fields[0]["identifier"], "Name");
    assert_eq!(fields[3]["name"], "External ID");
}

#[tokio::test]
async fn fields_route_maps_auth_failure_to_unauthorized_error() {
    let state = UpstreamState::new().rejecting_auth();
    let base = spawn_upstream(state).await;
    let app = app_for(&base, "fieldsauth").await;

    let resp = app.oneshot(fields_request()).await.expect("route");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(resp).await;

    assert_eq!(body["status"], "error");
    assert_eq!(body["details"]["upstream_status"], 401);
}
