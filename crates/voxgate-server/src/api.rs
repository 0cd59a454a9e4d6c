//! Token, room and health handlers.

use crate::AppState;
use axum::{
    extract::{Extension, Json},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use thiserror::Error;
use voxgate_voice::{RoomOptions, VoiceError};

/// Request body for `POST /api/generate-token`.
#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    /// Requested room. Replaced by `room-{participant_name}` when
    /// per-participant rooms are enabled.
    pub room_name: String,
    /// Identity and display name of the participant.
    pub participant_name: String,
    /// Optional participant metadata, usually a JSON string.
    #[serde(default)]
    pub metadata: Option<String>,
}

/// Response body for `POST /api/generate-token`.
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    /// Signed LiveKit access token.
    pub token: String,
    /// LiveKit server URL the client should connect to.
    pub url: String,
    /// Room the token grants access to.
    pub room_name: String,
    pub participant_name: String,
}

/// Request body for `POST /api/create-room`.
#[derive(Debug, Deserialize)]
pub struct RoomCreateRequest {
    pub room_name: String,
    /// Seconds before an empty room is closed (default 300).
    #[serde(default)]
    pub empty_timeout: Option<u32>,
    /// Default 10.
    #[serde(default)]
    pub max_participants: Option<u32>,
}

/// Response body for `POST /api/create-room`.
#[derive(Debug, Serialize, Deserialize)]
pub struct RoomCreateResponse {
    pub room_name: String,
    /// Room SID assigned by LiveKit.
    pub sid: String,
    /// Unix timestamp of room creation.
    pub created_at: i64,
}

/// Response body for `GET /api/health`.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    /// Whether a LiveKit URL and API key are configured.
    pub livekit_configured: bool,
    pub livekit_url: String,
}

/// API error type mapping to HTTP status codes.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid input: {0}")]
    BadRequest(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("internal server error: {0}")]
    InternalServerError(String),
}

impl ApiError {
    /// Maps a voice error, prefixing internal failures with `context`.
    fn from_voice(context: &str, err: VoiceError) -> Self {
        match err {
            VoiceError::InvalidRequest(msg) => ApiError::BadRequest(msg),
            other => ApiError::InternalServerError(format!("{context}: {other}")),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::InternalServerError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

/// Fallback for unknown routes.
pub async fn not_found_handler(uri: axum::http::Uri) -> ApiError {
    ApiError::NotFound(format!("no route for {}", uri.path()))
}

/// Handler for `GET /api/health`.
pub async fn health_handler(Extension(state): Extension<Arc<AppState>>) -> Json<HealthResponse> {
    let config = state.voice_service.config();
    let livekit_url = if config.url.is_empty() {
        "not configured".to_string()
    } else {
        config.url.clone()
    };

    Json(HealthResponse {
        status: "healthy".to_string(),
        livekit_configured: config.is_configured(),
        livekit_url,
    })
}

/// Handler for `POST /api/generate-token`.
///
/// Each participant gets a dedicated `room-{participant_name}` room unless
/// per-participant rooms are disabled in the LiveKit config.
pub async fn generate_token_handler(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<TokenRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let service = &state.voice_service;
    let room_name = service.room_for_participant(&payload.room_name, &payload.participant_name);

    let token = service
        .generate_join_token(
            &room_name,
            &payload.participant_name,
            &payload.participant_name,
            payload.metadata.as_deref(),
        )
        .map_err(|e| {
            tracing::error!(
                room = %room_name,
                participant = %payload.participant_name,
                "token generation failed: {}",
                e
            );
            ApiError::from_voice("token generation failed", e)
        })?;

    tracing::info!(
        room = %room_name,
        participant = %payload.participant_name,
        "issued access token"
    );

    Ok(Json(TokenResponse {
        token,
        url: service.get_url().to_string(),
        room_name,
        participant_name: payload.participant_name,
    }))
}

/// Handler for `POST /api/create-room`.
pub async fn create_room_handler(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<RoomCreateRequest>,
) -> Result<Json<RoomCreateResponse>, ApiError> {
    let defaults = state.voice_service.default_room_options();
    let options = RoomOptions {
        empty_timeout: payload.empty_timeout.unwrap_or(defaults.empty_timeout),
        max_participants: payload
            .max_participants
            .unwrap_or(defaults.max_participants),
    };

    let room = state
        .voice_service
        .create_room(&payload.room_name, options)
        .await
        .map_err(|e| {
            tracing::error!(room = %payload.room_name, "room creation failed: {}", e);
            ApiError::from_voice("room creation failed", e)
        })?;

    Ok(Json(RoomCreateResponse {
        room_name: room.name,
        sid: room.sid,
        created_at: room.creation_time,
    }))
}

/// Handler for `GET /api/debug/rooms`.
///
/// Lists every active LiveKit room with its participants. Failures are
/// reported in the body with a `200 OK` status.
pub async fn debug_rooms_handler(Extension(state): Extension<Arc<AppState>>) -> Json<Value> {
    let service = &state.voice_service;
    if !service.config().has_credentials() {
        return Json(json!({ "error": "LiveKit credentials not configured" }));
    }

    let http_url = service.config().http_url();
    match service.list_rooms_with_participants().await {
        Ok(rooms) => Json(json!({
            "success": true,
            "livekit_url": http_url,
            "rooms_count": rooms.len(),
            "rooms": rooms,
        })),
        Err(e) => {
            tracing::warn!(livekit_url = %http_url, "listing rooms failed: {}", e);
            Json(json!({
                "success": false,
                "error": e.to_string(),
                "type": e.kind(),
            }))
        }
    }
}
