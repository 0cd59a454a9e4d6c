//! Database layer for voxgate.
//!
//! Provides SQLite connection pooling (via `r2d2`), WAL-mode initialization,
//! embedded SQL migrations, and the conversation session queries used by the
//! admin dashboard and by the agent that records conversations.
//!
//! Migrations are compiled into the binary with `include_str!` so the schema
//! always ships with the code that reads it.

mod migrations;
mod pool;
pub mod sessions;

pub use migrations::{run_migrations, MigrationError};
pub use pool::{create_pool, DbPool, DbRuntimeSettings, PoolError, IN_MEMORY};
pub use sessions::{
    append_transcript_line, create_session, get_session, list_recent_sessions,
    merge_collected_data, update_session_state, NewSession, SessionError, MAX_SESSION_PAGE,
};
