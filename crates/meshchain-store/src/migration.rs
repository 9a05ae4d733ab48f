//! Database schema migrations for SQLite.
//!
//! Versioned: each migration moves the schema from version N to N+1 and is
//! recorded in `schema_migrations`.

use rusqlite::Connection;
use tracing::info;

use crate::error::{Result, StoreError};

/// Current schema version.
pub const CURRENT_VERSION: u32 = 1;

/// Initialize or migrate the database schema. Idempotent.
pub fn migrate(conn: &mut Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL
        )",
        [],
    )?;

    let current: u32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )?;

    if current > CURRENT_VERSION {
        return Err(StoreError::Migration(format!(
            "database schema version {} is newer than supported version {}",
            current, CURRENT_VERSION
        )));
    }

    if current < CURRENT_VERSION {
        let tx = conn.transaction()?;

        for version in (current + 1)..=CURRENT_VERSION {
            apply_migration(&tx, version)?;

            tx.execute(
                "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, ?2)",
                rusqlite::params![version, now_millis()],
            )?;
            info!(version, "applied schema migration");
        }

        tx.commit()?;
    }

    Ok(())
}

fn apply_migration(conn: &Connection, version: u32) -> Result<()> {
    match version {
        1 => apply_v1(conn),
        _ => Err(StoreError::Migration(format!(
            "unknown migration version: {}",
            version
        ))),
    }
}

/// Migration v1: records and their chain order.
fn apply_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE records (
            seq INTEGER PRIMARY KEY AUTOINCREMENT,  -- save order
            record_key BLOB NOT NULL UNIQUE,        -- 32 bytes, hash bound to lineage
            hash BLOB NOT NULL,                     -- 32 bytes, SHA-256 of canonical payload
            chain_id TEXT NOT NULL,                 -- root's metadata id
            kind TEXT NOT NULL,                     -- 'root' | 'update'
            parent_key BLOB,                        -- NULL for roots
            wire TEXT NOT NULL,                     -- JSON wire form
            saved_at INTEGER NOT NULL,              -- Unix ms

            CHECK ((kind = 'root') = (parent_key IS NULL)),
            FOREIGN KEY (parent_key) REFERENCES records(record_key)
        );

        CREATE INDEX idx_records_chain ON records(chain_id, seq);
        CREATE INDEX idx_records_parent ON records(parent_key);
        "#,
    )?;

    Ok(())
}

fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
