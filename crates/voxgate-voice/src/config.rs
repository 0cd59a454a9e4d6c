use serde::{Deserialize, Serialize};
use std::fmt;

/// URL used when no LiveKit URL is configured.
pub const DEFAULT_LIVEKIT_URL: &str = "ws://localhost:7880";
/// API key accepted by a LiveKit server started with `--dev`.
pub const DEV_LIVEKIT_API_KEY: &str = "devkey";
/// API secret accepted by a LiveKit server started with `--dev`.
pub const DEV_LIVEKIT_API_SECRET: &str = "secret";

fn default_token_ttl_seconds() -> u64 {
    3600
}

fn default_per_participant_rooms() -> bool {
    true
}

fn default_empty_timeout() -> u32 {
    300
}

fn default_max_participants() -> u32 {
    10
}

#[derive(Clone, Serialize, Deserialize)]
pub struct LiveKitConfig {
    /// Server URL as given to clients (`ws://` or `wss://`). Empty means
    /// unconfigured; [`DEFAULT_LIVEKIT_URL`] is used for outgoing calls.
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default, skip_serializing)]
    pub api_secret: String,
    /// JWT token TTL in seconds for join tokens. Default: 3600 (1 hour).
    #[serde(default = "default_token_ttl_seconds")]
    pub token_ttl_seconds: u64,
    /// When set, every participant joins a dedicated `room-{participant}`
    /// instead of the requested room.
    #[serde(default = "default_per_participant_rooms")]
    pub per_participant_rooms: bool,
    /// Seconds before an empty room is closed.
    #[serde(default = "default_empty_timeout")]
    pub default_empty_timeout: u32,
    #[serde(default = "default_max_participants")]
    pub default_max_participants: u32,
}

impl Default for LiveKitConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            api_key: String::new(),
            api_secret: String::new(),
            token_ttl_seconds: default_token_ttl_seconds(),
            per_participant_rooms: default_per_participant_rooms(),
            default_empty_timeout: default_empty_timeout(),
            default_max_participants: default_max_participants(),
        }
    }
}

impl fmt::Debug for LiveKitConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LiveKitConfig")
            .field("url", &self.url)
            .field("api_key", &self.api_key)
            .field("api_secret", &"[REDACTED]")
            .field("token_ttl_seconds", &self.token_ttl_seconds)
            .field("per_participant_rooms", &self.per_participant_rooms)
            .field("default_empty_timeout", &self.default_empty_timeout)
            .field("default_max_participants", &self.default_max_participants)
            .finish()
    }
}

impl LiveKitConfig {
    pub fn new(
        url: impl Into<String>,
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            api_key: api_key.into(),
            api_secret: api_secret.into(),
            ..Default::default()
        }
    }

    /// Both the API key and secret are present.
    pub fn has_credentials(&self) -> bool {
        !self.api_key.is_empty() && !self.api_secret.is_empty()
    }

    /// A URL and API key are present. Reported by the health endpoint.
    pub fn is_configured(&self) -> bool {
        !self.url.is_empty() && !self.api_key.is_empty()
    }

    /// The configured URL, or [`DEFAULT_LIVEKIT_URL`].
    pub fn effective_url(&self) -> &str {
        if self.url.is_empty() {
            DEFAULT_LIVEKIT_URL
        } else {
            &self.url
        }
    }

    /// The HTTP(S) form of the effective URL, used for Room Service calls.
    pub fn http_url(&self) -> String {
        to_http_url(self.effective_url())
    }
}

fn to_http_url(url: &str) -> String {
    if let Some(rest) = url.strip_prefix("wss://") {
        format!("https://{rest}")
    } else if let Some(rest) = url.strip_prefix("ws://") {
        format!("http://{rest}")
    } else {
        url.to_string()
    }
}
