//! In-memory implementation of the RecordStore trait.
//!
//! Same semantics as SQLite, no persistence. Records are kept as shared
//! handles, so fetching never re-verifies anything.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use meshchain_core::{Record, Sha256Hash};

use crate::error::Result;
use crate::traits::{ancestors, RecordStore, SaveResult};

/// In-memory store implementation.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock.
pub struct MemoryStore {
    inner: RwLock<MemoryStoreInner>,
}

#[derive(Default)]
struct MemoryStoreInner {
    /// Records indexed by key.
    records: HashMap<Sha256Hash, Arc<Record>>,

    /// Chain ID -> keys in save order. The last entry is the head.
    chains: HashMap<String, Vec<Sha256Hash>>,
}

impl MemoryStoreInner {
    fn insert(&mut self, record: &Record) -> SaveResult {
        let key = record.key();
        if self.records.contains_key(&key) {
            return SaveResult::AlreadyExists;
        }
        self.records.insert(key, Arc::new(record.clone()));
        self.chains
            .entry(record.chain_id().to_string())
            .or_default()
            .push(key);
        SaveResult::Inserted
    }
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MemoryStoreInner::default()),
        }
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.inner.read().expect("memory store lock poisoned").records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn save(&self, record: &Record) -> Result<SaveResult> {
        let mut inner = self.inner.write().expect("memory store lock poisoned");
        for ancestor in ancestors(record) {
            inner.insert(ancestor);
        }
        Ok(inner.insert(record))
    }

    async fn fetch(&self, id: &str) -> Result<Option<Arc<Record>>> {
        let inner = self.inner.read().expect("memory store lock poisoned");
        Ok(inner
            .chains
            .get(id)
            .and_then(|hashes| hashes.last())
            .and_then(|head| inner.records.get(head))
            .cloned())
    }

    async fn fetch_by_key(&self, key: &Sha256Hash) -> Result<Option<Arc<Record>>> {
        let inner = self.inner.read().expect("memory store lock poisoned");
        Ok(inner.records.get(key).cloned())
    }

    async fn contains(&self, key: &Sha256Hash) -> Result<bool> {
        let inner = self.inner.read().expect("memory store lock poisoned");
        Ok(inner.records.contains_key(key))
    }

    async fn history(&self, id: &str) -> Result<Vec<Sha256Hash>> {
        let inner = self.inner.read().expect("memory store lock poisoned");
        Ok(inner.chains.get(id).cloned().unwrap_or_default())
    }
}
