//! Shared types for the voxgate workspace.
//!
//! Holds the serialized shape of conversation sessions as the admin surface
//! emits them, and the voice identifiers understood by the Flite synthesis
//! adapter. Every other crate depends on this one for cross-cutting types.

pub mod session;
pub mod voice;

pub use session::ConversationSession;
pub use voice::{FliteVoice, UnknownVoice};
