//! Conversation session records.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A stored conversation session as exposed to the admin dashboard.
///
/// `collected_data` is always a JSON object; sessions without collected data
/// carry an empty object. `transcript` holds one line per utterance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationSession {
    /// Session identifier (UUID string).
    pub session_id: String,
    /// Tenant the session belongs to.
    pub tenant_id: String,
    /// Current state label (e.g. `greeting`, `collecting`, `completed`).
    pub state: String,
    /// Free-form data gathered during the conversation.
    pub collected_data: Value,
    /// Newline separated transcript.
    pub transcript: String,
    /// Creation timestamp (RFC 3339).
    pub created_at: Option<String>,
    /// Last update timestamp (RFC 3339).
    pub updated_at: Option<String>,
}
