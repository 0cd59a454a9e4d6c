//! Admin dashboard handlers.

use crate::{api::ApiError, AppState};
use axum::{
    extract::{Extension, Json},
    response::Html,
};
use std::sync::Arc;
use voxgate_db::{list_recent_sessions, MAX_SESSION_PAGE};
use voxgate_types::ConversationSession;

const ADMIN_PAGE: &str = include_str!("../assets/admin.html");

/// Handler for `GET /admin`.
pub async fn admin_panel_handler() -> Html<&'static str> {
    Html(ADMIN_PAGE)
}

/// Handler for `GET /admin/sessions`.
///
/// Returns the 50 most recent sessions, newest first.
pub async fn list_sessions_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<Vec<ConversationSession>>, ApiError> {
    let sessions = tokio::task::spawn_blocking(move || {
        let conn = state
            .pool
            .get()
            .map_err(|e| ApiError::InternalServerError(format!("db connection failed: {}", e)))?;

        list_recent_sessions(&conn, MAX_SESSION_PAGE)
            .map_err(|e| ApiError::InternalServerError(format!("db query failed: {}", e)))
    })
    .await
    .map_err(|e| ApiError::InternalServerError(format!("task join error: {}", e)))??;

    Ok(Json(sessions))
}
