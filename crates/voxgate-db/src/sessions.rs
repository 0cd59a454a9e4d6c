//! Conversation session persistence.
//!
//! The HTTP surface only reads sessions (`list_recent_sessions`). The write
//! helpers are used by the conversation agent to record progress.

use chrono::{SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde_json::{Map, Value};
use thiserror::Error;
use uuid::Uuid;
use voxgate_types::ConversationSession;

/// Upper bound on the number of sessions returned by one listing.
pub const MAX_SESSION_PAGE: usize = 50;

/// Errors that can occur during session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("json serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("session not found: {0}")]
    NotFound(String),
    #[error("collected data must be a JSON object")]
    InvalidCollectedData,
}

/// Parameters for creating a session.
#[derive(Debug, Clone, Default)]
pub struct NewSession {
    /// Explicit id; a v4 UUID is generated when `None`.
    pub session_id: Option<String>,
    pub tenant_id: String,
    pub state: String,
    pub collected_data: Option<Value>,
}

const SESSION_COLUMNS: &str =
    "id, tenant_id, state, collected_data, transcript, created_at, updated_at";

/// Millisecond precision, matching the `strftime('%Y-%m-%dT%H:%M:%fZ')`
/// column default so that timestamps from either source sort as text.
fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn map_row_to_session(row: &Row) -> rusqlite::Result<ConversationSession> {
    let collected_raw: Option<String> = row.get(3)?;
    // Rows written by other tools may hold malformed JSON; show them as empty.
    let collected_data = collected_raw
        .and_then(|raw| serde_json::from_str::<Value>(&raw).ok())
        .filter(|v| !v.is_null())
        .unwrap_or_else(|| Value::Object(Map::new()));
    let transcript: Option<String> = row.get(4)?;

    Ok(ConversationSession {
        session_id: row.get(0)?,
        tenant_id: row.get(1)?,
        state: row.get(2)?,
        collected_data,
        transcript: transcript.unwrap_or_default(),
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

/// Returns the most recent sessions, newest first.
///
/// `limit` is clamped to `1..=MAX_SESSION_PAGE`.
pub fn list_recent_sessions(
    conn: &Connection,
    limit: usize,
) -> Result<Vec<ConversationSession>, SessionError> {
    let limit = limit.clamp(1, MAX_SESSION_PAGE);
    let mut stmt = conn.prepare(&format!(
        "SELECT {SESSION_COLUMNS} FROM conversation_sessions
         ORDER BY created_at DESC, rowid DESC
         LIMIT ?1"
    ))?;

    let rows = stmt.query_map([limit as i64], map_row_to_session)?;
    let mut sessions = Vec::new();
    for row in rows {
        sessions.push(row?);
    }
    Ok(sessions)
}

/// Retrieves a single session by id.
pub fn get_session(conn: &Connection, session_id: &str) -> Result<ConversationSession, SessionError> {
    conn.query_row(
        &format!("SELECT {SESSION_COLUMNS} FROM conversation_sessions WHERE id = ?1"),
        [session_id],
        map_row_to_session,
    )
    .optional()?
    .ok_or_else(|| SessionError::NotFound(session_id.to_string()))
}

/// Inserts a new session and returns it as stored.
pub fn create_session(
    conn: &Connection,
    new: &NewSession,
) -> Result<ConversationSession, SessionError> {
    let session_id = new
        .session_id
        .clone()
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    let collected_json = match &new.collected_data {
        Some(value @ Value::Object(_)) => Some(serde_json::to_string(value)?),
        Some(Value::Null) | None => None,
        Some(_) => return Err(SessionError::InvalidCollectedData),
    };
    let now = now_rfc3339();

    conn.execute(
        "INSERT INTO conversation_sessions (id, tenant_id, state, collected_data, transcript, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, NULL, ?5, ?5)",
        params![session_id, new.tenant_id, new.state, collected_json, now],
    )?;

    tracing::debug!(session_id = %session_id, tenant_id = %new.tenant_id, "created conversation session");
    get_session(conn, &session_id)
}

fn touch_result(changed: usize, session_id: &str) -> Result<(), SessionError> {
    if changed == 0 {
        return Err(SessionError::NotFound(session_id.to_string()));
    }
    Ok(())
}

/// Appends one line to the session transcript.
pub fn append_transcript_line(
    conn: &Connection,
    session_id: &str,
    line: &str,
) -> Result<(), SessionError> {
    let changed = conn.execute(
        "UPDATE conversation_sessions
         SET transcript = COALESCE(transcript, '') || ?1 || char(10), updated_at = ?2
         WHERE id = ?3",
        params![line.trim_end_matches('\n'), now_rfc3339(), session_id],
    )?;
    touch_result(changed, session_id)
}

/// Sets the session's state label.
pub fn update_session_state(
    conn: &Connection,
    session_id: &str,
    state: &str,
) -> Result<(), SessionError> {
    let changed = conn.execute(
        "UPDATE conversation_sessions SET state = ?1, updated_at = ?2 WHERE id = ?3",
        params![state, now_rfc3339(), session_id],
    )?;
    touch_result(changed, session_id)
}

/// Shallow-merges `patch` into the stored collected data and returns the
/// merged object.
pub fn merge_collected_data(
    conn: &Connection,
    session_id: &str,
    patch: &Value,
) -> Result<Value, SessionError> {
    let Value::Object(patch) = patch else {
        return Err(SessionError::InvalidCollectedData);
    };

    let tx = conn.unchecked_transaction()?;
    let mut current = match get_session(&tx, session_id)?.collected_data {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    for (key, value) in patch {
        current.insert(key.clone(), value.clone());
    }
    let merged = Value::Object(current);

    tx.execute(
        "UPDATE conversation_sessions SET collected_data = ?1, updated_at = ?2 WHERE id = ?3",
        params![serde_json::to_string(&merged)?, now_rfc3339(), session_id],
    )?;
    tx.commit()?;
    Ok(merged)
}
