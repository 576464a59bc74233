#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use sqlx::PgPool;
use tower::ServiceExt;

use projectree_api::auth::jwt::JwtConfig;
use projectree_api::config::ServerConfig;
use projectree_api::engine::positions::{PgPositionStore, PositionBatchUpdater, PositionConfig};
use projectree_api::router::build_app_router;
use projectree_api::state::AppState;
use projectree_core::types::DbId;
use projectree_db::models::member::CreateMember;
use projectree_db::models::node::NodeSchema;
use projectree_db::repositories::MemberRepo;
use projectree_events::{NodeNotifier, NoopNotifier, NotifyError};

const TEST_JWT_SECRET: &str = "projectree-test-secret";

/// Build a test `ServerConfig` with safe defaults.
///
/// Notifications are off; tests that care swap in their own notifier.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 5,
        jwt: JwtConfig {
            secret: TEST_JWT_SECRET.to_string(),
            leeway_secs: 60,
        },
        collab: None,
        positions: PositionConfig::default(),
    }
}

/// State wired to `pool` and `notifier`, with a real Postgres position store.
pub fn test_state(pool: PgPool, notifier: Arc<dyn NodeNotifier>) -> AppState {
    let config = test_config();
    let positions = PositionBatchUpdater::new(
        Arc::new(PgPositionStore::new(pool.clone())),
        config.positions,
    );
    AppState {
        pool,
        config: Arc::new(config),
        notifier,
        positions,
    }
}

/// The production router over a fresh state with notifications disabled.
pub fn build_test_app(pool: PgPool) -> Router {
    build_test_app_with(pool, Arc::new(NoopNotifier))
}

pub fn build_test_app_with(pool: PgPool, notifier: Arc<dyn NodeNotifier>) -> Router {
    let state = test_state(pool, notifier);
    build_app_router(state, &test_config())
}

/// Router for a state the test keeps a handle to.
pub fn app_for(state: &AppState) -> Router {
    build_app_router(state.clone(), &state.config)
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

pub async fn send(
    app: Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
    token: Option<&str>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, None, None).await
}

pub async fn post_json(app: Router, uri: &str, body: Value) -> Response<Body> {
    send(app, Method::POST, uri, Some(body), None).await
}

pub async fn put_json(app: Router, uri: &str, body: Value) -> Response<Body> {
    send(app, Method::PUT, uri, Some(body), None).await
}

pub async fn patch_json(app: Router, uri: &str, body: Value) -> Response<Body> {
    send(app, Method::PATCH, uri, Some(body), None).await
}

pub async fn delete(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::DELETE, uri, None, None).await
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Insert a member and sign an access token for them.
pub async fn seed_member(pool: &PgPool, email: &str) -> (DbId, String) {
    let member = MemberRepo::create(
        pool,
        &CreateMember {
            email: email.to_string(),
            name: "Tester".to_string(),
        },
    )
    .await
    .unwrap();
    (member.id, member_token(member.id))
}

/// Sign an hour-long token for `member_id`, as the account service would.
pub fn member_token(member_id: DbId) -> String {
    let claims = serde_json::json!({
        "sub": member_id,
        "exp": jsonwebtoken::get_current_timestamp() + 3600,
    });
    jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &claims,
        &jsonwebtoken::EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes()),
    )
    .unwrap()
}

/// Create a workspace through the API and return `(workspace_id, root_id)`.
pub async fn create_workspace(app: Router, token: &str, prefix: &str) -> (DbId, DbId) {
    let response = send(
        app,
        Method::POST,
        "/api/v1/workspaces",
        Some(serde_json::json!({
            "name": "Shop",
            "description": "Online shop",
            "identifier_prefix": prefix,
        })),
        Some(token),
    )
    .await;
    assert_eq!(response.status(), 201);
    let json = body_json(response).await;
    (
        json["data"]["workspace"]["id"].as_i64().unwrap(),
        json["data"]["root"]["id"].as_i64().unwrap(),
    )
}

/// Create a child through the API and return its id.
pub async fn create_child(app: Router, parent_id: DbId, kind: &str, name: &str) -> DbId {
    let response = post_json(
        app,
        "/api/v1/nodes",
        serde_json::json!({ "parent_id": parent_id, "kind": kind, "name": name }),
    )
    .await;
    assert_eq!(response.status(), 201, "creating {kind} {name}");
    body_json(response).await["data"]["id"].as_i64().unwrap()
}

// ---------------------------------------------------------------------------
// Notifiers
// ---------------------------------------------------------------------------

/// Records every notification it receives.
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<(DbId, NodeSchema)>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<(DbId, NodeSchema)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl NodeNotifier for RecordingNotifier {
    async fn node_created(&self, workspace_id: DbId, node: &NodeSchema) -> Result<(), NotifyError> {
        self.sent.lock().unwrap().push((workspace_id, node.clone()));
        Ok(())
    }
}

/// Fails every call, as an unreachable collaboration service would.
pub struct FailingNotifier;

#[async_trait]
impl NodeNotifier for FailingNotifier {
    async fn node_created(&self, _: DbId, _: &NodeSchema) -> Result<(), NotifyError> {
        Err(NotifyError::HttpStatus(503))
    }
}
