//! Voice infrastructure for voxgate.
//!
//! Wraps the LiveKit server SDK for access tokens and room management, and
//! provides a Flite-backed text-to-speech adapter that republishes
//! synthesized audio as 100 ms frames through an async queue.
//!
//! Token signing and room lifecycle are owned by LiveKit; this crate only
//! validates parameters and carries configuration.

pub mod config;
pub mod error;
pub mod service;
pub mod tts;

pub use config::{
    LiveKitConfig, DEFAULT_LIVEKIT_URL, DEV_LIVEKIT_API_KEY, DEV_LIVEKIT_API_SECRET,
};
pub use error::VoiceError;
pub use service::{ParticipantSummary, RoomDetail, RoomOptions, RoomSummary, VoiceService};
pub use tts::{
    AudioFrame, FliteSynthesizeStream, FliteTts, PcmAudio, SynthesizedAudio,
    DEFAULT_SAMPLE_RATE,
};
