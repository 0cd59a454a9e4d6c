//! voxgate HTTP server.
//!
//! Issues LiveKit join tokens, creates and inspects rooms through the LiveKit
//! Room Service, and serves the admin dashboard over stored conversation
//! sessions.

pub mod api;
pub mod api_admin;
pub mod config;

use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::{get, post},
    Extension, Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use voxgate_db::DbPool;
use voxgate_voice::VoiceService;

/// Name reported by the root status endpoint.
pub const SERVICE_NAME: &str = "voxgate API";

/// Maximum request body size (64 KiB). Every request body here is a small
/// JSON object.
const MAX_REQUEST_BODY_BYTES: usize = 64 * 1024;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: DbPool,
    /// LiveKit token and room service.
    pub voice_service: Arc<VoiceService>,
    /// Origins allowed by CORS. Empty allows any origin.
    pub allowed_origins: Vec<String>,
}

/// Handler for `GET /`.
async fn root() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION")
    }))
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if allowed_origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(origins))
}

/// Builds the application router with all routes.
pub fn app(state: AppState) -> Router {
    let cors = cors_layer(&state.allowed_origins);

    Router::new()
        .route("/", get(root))
        .route("/api/health", get(api::health_handler))
        .route("/api/generate-token", post(api::generate_token_handler))
        .route("/api/create-room", post(api::create_room_handler))
        .route("/api/debug/rooms", get(api::debug_rooms_handler))
        .route("/admin", get(api_admin::admin_panel_handler))
        .route("/admin/sessions", get(api_admin::list_sessions_handler))
        .fallback(api::not_found_handler)
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(Extension(Arc::new(state)))
}
