// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::body::Body;
use axum::http::{header, Request, Response};
use std::sync::Arc;
use tdil_points::config::Config;
use tdil_points::db::{FirestoreDb, MemoryStore};
use tdil_points::middleware::auth::{create_jwt, Role};
use tdil_points::routes::create_router;
use tdil_points::services::PointsService;
use tdil_points::AppState;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Unique user ID for test isolation against a shared emulator.
#[allow(dead_code)]
pub fn unique_user_id() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos() as u64
}

/// Create a test app backed by the in-memory store.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    create_test_app_with_store(Arc::new(MemoryStore::new()))
}

/// Like `create_test_app`, over a store the test can also write to directly.
#[allow(dead_code)]
pub fn create_test_app_with_store(store: Arc<MemoryStore>) -> (axum::Router, Arc<AppState>) {
    let config = Config::test_default();
    let points = PointsService::new(store, config.login_streak_enabled);
    let state = Arc::new(AppState { config, points });
    (create_router(state.clone()), state)
}

/// Create a test app whose storage is offline; every ledger call fails.
#[allow(dead_code)]
pub fn create_offline_test_app() -> (axum::Router, Arc<AppState>) {
    let config = Config::test_default();
    let points = PointsService::new(Arc::new(FirestoreDb::new_mock()), false);
    let state = Arc::new(AppState { config, points });
    (create_router(state.clone()), state)
}

#[allow(dead_code)]
pub fn create_test_jwt(user_id: u64, role: Role, signing_key: &[u8]) -> String {
    create_jwt(user_id, role, signing_key).expect("Failed to create JWT")
}

/// Build a JSON request with a bearer token.
#[allow(dead_code)]
pub fn json_request(
    method: &str,
    uri: &str,
    token: &str,
    body: Option<serde_json::Value>,
) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token));

    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Read a response body as JSON.
#[allow(dead_code)]
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    serde_json::from_slice(&bytes).expect("Body is not JSON")
}
