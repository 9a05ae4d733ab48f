//! SQLite implementation of the RecordStore trait.
//!
//! Uses rusqlite with bundled SQLite, wrapped in async via
//! `tokio::task::spawn_blocking`. Rows hold the JSON wire form; loading a
//! record rebuilds its ancestor chain from the root down and verifies every
//! link again, so a tampered database cannot produce a `Record`.

use std::collections::HashSet;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use meshchain_core::{Record, SealPolicy, Sha256Hash, WireRecord};

use crate::error::{Result, StoreError};
use crate::migration;
use crate::traits::{ancestors, RecordStore, SaveResult};

/// SQLite-based store implementation.
///
/// Thread-safe via internal Mutex. All operations use spawn_blocking
/// to avoid blocking the async runtime.
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if needed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_connection(Connection::open(path)?)
    }

    /// Open an in-memory SQLite database.
    pub fn open_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(mut conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", true)?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `f` against the connection on the blocking pool.
    async fn run<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let mut guard = lock(&conn)?;
            f(&mut guard)
        })
        .await?
    }
}

fn lock(conn: &Mutex<Connection>) -> Result<MutexGuard<'_, Connection>> {
    conn.lock().map_err(|e| {
        StoreError::Database(rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_LOCKED),
            Some(format!("mutex poisoned: {}", e)),
        ))
    })
}

/// A record prepared for insertion.
struct PendingRow {
    key: Sha256Hash,
    hash: Sha256Hash,
    chain_id: String,
    kind: &'static str,
    parent_key: Option<Sha256Hash>,
    wire: String,
}

impl PendingRow {
    fn encode(record: &Record) -> Result<Self> {
        let wire = record
            .to_wire()
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(Self {
            key: record.key(),
            hash: record.hash(),
            chain_id: record.chain_id().to_string(),
            kind: record.kind().as_str(),
            parent_key: record.parent().map(|p| p.key()),
            wire: serde_json::to_string(&wire)
                .map_err(|e| StoreError::Serialization(e.to_string()))?,
        })
    }

    fn insert(&self, conn: &Connection, now: i64) -> Result<SaveResult> {
        if exists(conn, &self.key)? {
            return Ok(SaveResult::AlreadyExists);
        }
        conn.execute(
            "INSERT INTO records (record_key, hash, chain_id, kind, parent_key, wire, saved_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                self.key.as_bytes().as_slice(),
                self.hash.as_bytes().as_slice(),
                self.chain_id,
                self.kind,
                self.parent_key.as_ref().map(|k| k.as_bytes().to_vec()),
                self.wire,
                now,
            ],
        )?;
        Ok(SaveResult::Inserted)
    }
}

fn exists(conn: &Connection, key: &Sha256Hash) -> Result<bool> {
    Ok(conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM records WHERE record_key = ?1)",
        params![key.as_bytes().as_slice()],
        |row| row.get(0),
    )?)
}

fn hash_from_blob(bytes: &[u8]) -> Result<Sha256Hash> {
    Sha256Hash::try_from(bytes).map_err(|e| StoreError::InvalidData(e.to_string()))
}

struct StoredRow {
    hash: Sha256Hash,
    kind: String,
    parent_key: Option<Sha256Hash>,
    wire: String,
}

fn read_row(conn: &Connection, key: &Sha256Hash) -> Result<Option<StoredRow>> {
    let row = conn
        .query_row(
            "SELECT hash, kind, parent_key, wire FROM records WHERE record_key = ?1",
            params![key.as_bytes().as_slice()],
            |row| {
                Ok((
                    row.get::<_, Vec<u8>>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<Vec<u8>>>(2)?,
                    row.get::<_, String>(3)?,
                ))
            },
        )
        .optional()?;

    row.map(|(hash, kind, parent, wire)| {
        Ok(StoredRow {
            hash: hash_from_blob(&hash)?,
            kind,
            parent_key: parent.as_deref().map(hash_from_blob).transpose()?,
            wire,
        })
    })
    .transpose()
}

/// Load and re-verify the record stored under `key` together with its ancestors.
fn load(conn: &Connection, key: &Sha256Hash) -> Result<Option<Arc<Record>>> {
    let mut rows = Vec::new();
    let mut seen = HashSet::new();
    let mut next = Some(*key);

    while let Some(current) = next {
        if !seen.insert(current) {
            return Err(StoreError::InvalidData(format!(
                "ancestor cycle at record {}",
                current
            )));
        }
        match read_row(conn, &current)? {
            Some(row) => {
                next = row.parent_key;
                rows.push((current, row));
            }
            None if rows.is_empty() => return Ok(None),
            None => {
                return Err(StoreError::InvalidData(format!(
                    "missing ancestor {}",
                    current
                )))
            }
        }
    }

    let mut parent: Option<Arc<Record>> = None;
    for (expected, row) in rows.into_iter().rev() {
        let wire: WireRecord = serde_json::from_str(&row.wire)
            .map_err(|e| StoreError::InvalidData(format!("record {}: {}", expected, e)))?;
        let record = wire
            .into_record(parent.take(), SealPolicy::Verify)
            .map_err(|e| StoreError::InvalidData(format!("record {}: {}", expected, e)))?;

        if record.key() != expected
            || record.hash() != row.hash
            || record.kind().as_str() != row.kind
        {
            return Err(StoreError::InvalidData(format!(
                "record {} does not match its row",
                expected
            )));
        }
        parent = Some(Arc::new(record));
    }

    Ok(parent)
}

fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

#[async_trait]
impl RecordStore for SqliteStore {
    async fn save(&self, record: &Record) -> Result<SaveResult> {
        let mut pending = ancestors(record)
            .into_iter()
            .map(PendingRow::encode)
            .collect::<Result<Vec<_>>>()?;
        pending.push(PendingRow::encode(record)?);

        let key = record.key();
        let result = self
            .run(move |conn| {
                let tx = conn.transaction()?;
                let now = now_millis();
                let mut result = SaveResult::AlreadyExists;
                for row in &pending {
                    result = row.insert(&tx, now)?;
                }
                tx.commit()?;
                Ok(result)
            })
            .await?;

        debug!(%key, ?result, "saved record");
        Ok(result)
    }

    async fn fetch(&self, id: &str) -> Result<Option<Arc<Record>>> {
        let id = id.to_string();
        self.run(move |conn| {
            let head: Option<Vec<u8>> = conn
                .query_row(
                    "SELECT record_key FROM records
                     WHERE chain_id = ?1 ORDER BY seq DESC LIMIT 1",
                    params![id],
                    |row| row.get(0),
                )
                .optional()?;
            match head {
                Some(bytes) => load(conn, &hash_from_blob(&bytes)?),
                None => Ok(None),
            }
        })
        .await
    }

    async fn fetch_by_key(&self, key: &Sha256Hash) -> Result<Option<Arc<Record>>> {
        let key = *key;
        self.run(move |conn| load(conn, &key)).await
    }

    async fn contains(&self, key: &Sha256Hash) -> Result<bool> {
        let key = *key;
        self.run(move |conn| exists(conn, &key)).await
    }

    async fn history(&self, id: &str) -> Result<Vec<Sha256Hash>> {
        let id = id.to_string();
        self.run(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT record_key FROM records WHERE chain_id = ?1 ORDER BY seq ASC",
            )?;
            let blobs = stmt
                .query_map(params![id], |row| row.get::<_, Vec<u8>>(0))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            blobs.iter().map(|b| hash_from_blob(b)).collect()
        })
        .await
    }
}
