//! RecordStore trait: the abstract interface for record persistence.
//!
//! Records are addressed by [`Record::key`], which binds the content hash to
//! the record's lineage. Every record also belongs to a chain named by its
//! root's ID, and each chain has a head: the most recently saved record in it.

use std::sync::Arc;

use async_trait::async_trait;
use meshchain_core::{Record, Sha256Hash};

use crate::error::Result;

/// Result of saving a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveResult {
    /// Record was stored and is now the head of its chain.
    Inserted,
    /// A record with the same key is already stored (idempotent, not an error).
    AlreadyExists,
}

/// Async interface for record persistence.
///
/// Stores only accept [`Record`] values, which are verified on construction.
/// Saving an update also saves any of its ancestors the store has not seen,
/// root first, so a stored update can always be rebuilt from stored rows.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Save a record and make it the head of its chain.
    ///
    /// Returns `AlreadyExists` without moving the head if the key is known.
    /// An update whose content repeats an earlier record under a different
    /// parent has a different key and is stored.
    async fn save(&self, record: &Record) -> Result<SaveResult>;

    /// The head of the chain whose root ID is `id`.
    async fn fetch(&self, id: &str) -> Result<Option<Arc<Record>>>;

    /// A record by its [`Record::key`].
    async fn fetch_by_key(&self, key: &Sha256Hash) -> Result<Option<Arc<Record>>>;

    /// Check if a record exists by key.
    async fn contains(&self, key: &Sha256Hash) -> Result<bool>;

    /// Keys saved in chain `id`, oldest first. Empty if the chain is unknown.
    async fn history(&self, id: &str) -> Result<Vec<Sha256Hash>>;
}

/// Ancestors of `record` (excluding itself), root first.
pub(crate) fn ancestors(record: &Record) -> Vec<&Record> {
    let mut chain = Vec::new();
    let mut current = record.parent();
    while let Some(parent) = current {
        chain.push(parent.as_ref());
        current = parent.parent();
    }
    chain.reverse();
    chain
}
