use thiserror::Error;

#[derive(Error, Debug)]
pub enum VoiceError {
    #[error("LiveKit API error: {0}")]
    LiveKit(#[from] livekit_api::access_token::AccessTokenError),

    #[error("LIVEKIT_API_KEY and LIVEKIT_API_SECRET must be set")]
    MissingCredentials,

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("Room service error: {0}")]
    RoomService(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("TTS error: {0}")]
    Tts(String),

    #[error("WAV decode error: {0}")]
    Decode(#[from] hound::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl VoiceError {
    /// Short variant name, reported by diagnostic endpoints.
    pub fn kind(&self) -> &'static str {
        match self {
            VoiceError::LiveKit(_) => "LiveKit",
            VoiceError::MissingCredentials => "MissingCredentials",
            VoiceError::InvalidRequest(_) => "InvalidRequest",
            VoiceError::RoomService(_) => "RoomService",
            VoiceError::Config(_) => "Config",
            VoiceError::Tts(_) => "Tts",
            VoiceError::Decode(_) => "Decode",
            VoiceError::Io(_) => "Io",
        }
    }
}
