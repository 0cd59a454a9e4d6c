#![allow(dead_code)]

pub mod room_service;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::Value;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;
use voxgate_db::{create_pool, run_migrations, DbPool, DbRuntimeSettings};
use voxgate_server::{app, AppState};
use voxgate_voice::{LiveKitConfig, VoiceService};

/// Nothing listens on port 1; Room Service calls fail immediately.
pub const UNREACHABLE_LIVEKIT: &str = "http://127.0.0.1:1";

pub struct TestApp {
    pub router: Router,
    pub pool: DbPool,
    _dir: TempDir,
}

pub fn dev_livekit() -> LiveKitConfig {
    LiveKitConfig::new("ws://localhost:7880", "devkey", "secret")
}

/// Builds the router over a migrated scratch database.
pub fn setup_app(livekit: LiveKitConfig) -> TestApp {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("test.db");
    let pool = create_pool(db_path.to_str().unwrap(), DbRuntimeSettings::default()).unwrap();
    {
        let conn = pool.get().unwrap();
        run_migrations(&conn).unwrap();
    }

    let state = AppState {
        pool: pool.clone(),
        voice_service: Arc::new(VoiceService::new(livekit)),
        allowed_origins: Vec::new(),
    };

    TestApp {
        router: app(state),
        pool,
        _dir: dir,
    }
}

pub async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, body.to_vec())
}

pub async fn get_json(router: &Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let (status, body) = send(router, request).await;
    (status, serde_json::from_slice(&body).unwrap())
}

pub async fn post_json(router: &Router, uri: &str, payload: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(payload.to_string()))
        .unwrap();
    let (status, body) = send(router, request).await;
    (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
}
