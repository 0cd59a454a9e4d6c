//! Schema migrations.
//!
//! Migration SQL is compiled in and applied in order on startup. Applied
//! names are recorded in `_voxgate_migrations`; a migration and its record
//! commit together.

use rusqlite::Connection;
use std::collections::HashSet;
use thiserror::Error;

const TRACKING_TABLE_SQL: &str = include_str!("migrations/000_tracking.sql");

/// `(name, sql)` pairs in application order. Append only.
const MIGRATIONS: &[(&str, &str)] = &[(
    "001_conversation_sessions",
    include_str!("migrations/001_conversation_sessions.sql"),
)];

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("failed to create migration tracking table: {0}")]
    Bootstrap(#[source] rusqlite::Error),

    #[error("failed to read applied migrations: {0}")]
    StateQuery(#[source] rusqlite::Error),

    #[error("migration '{name}' failed: {source}")]
    Apply {
        name: String,
        #[source]
        source: rusqlite::Error,
    },
}

/// Applies every pending migration and returns how many ran.
///
/// # Errors
///
/// Fails on the first migration that does not apply cleanly; earlier
/// migrations stay committed.
pub fn run_migrations(conn: &Connection) -> Result<usize, MigrationError> {
    apply_pending(conn, MIGRATIONS)
}

fn applied_names(conn: &Connection) -> Result<HashSet<String>, MigrationError> {
    let mut stmt = conn
        .prepare("SELECT name FROM _voxgate_migrations")
        .map_err(MigrationError::StateQuery)?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(0))
        .map_err(MigrationError::StateQuery)?
        .collect::<Result<HashSet<_>, _>>()
        .map_err(MigrationError::StateQuery)?;
    Ok(names)
}

fn apply_pending(conn: &Connection, migrations: &[(&str, &str)]) -> Result<usize, MigrationError> {
    conn.execute_batch(TRACKING_TABLE_SQL)
        .map_err(MigrationError::Bootstrap)?;

    let applied = applied_names(conn)?;
    let pending: Vec<&(&str, &str)> = migrations
        .iter()
        .filter(|(name, _)| !applied.contains(*name))
        .collect();

    if pending.is_empty() {
        tracing::debug!("database schema is up to date");
        return Ok(0);
    }

    for &&(name, sql) in &pending {
        tracing::info!(migration = name, "applying migration");
        apply_one(conn, name, sql)?;
    }

    Ok(pending.len())
}

fn apply_one(conn: &Connection, name: &str, sql: &str) -> Result<(), MigrationError> {
    let apply_err = |source| MigrationError::Apply {
        name: name.to_string(),
        source,
    };

    let tx = conn.unchecked_transaction().map_err(apply_err)?;
    tx.execute_batch(sql).map_err(apply_err)?;
    tx.execute("INSERT INTO _voxgate_migrations (name) VALUES (?1)", [name])
        .map_err(apply_err)?;
    tx.commit().map_err(apply_err)
}
