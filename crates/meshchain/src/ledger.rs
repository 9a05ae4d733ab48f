//! The Ledger: accepts signed records and keeps their chains.
//!
//! Every submission is verified before it reaches the store. Roots must be
//! signed by one of their own keys; updates must be signed by one of the
//! keys of the current head of the chain they extend.

use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, instrument, warn};

use meshchain_core::{
    DecodedRecord, Metadata, Record, RootRecord, SealPolicy, Sha256Hash, UpdateRecord, WireRecord,
};
use meshchain_store::{RecordStore, SaveResult};

use crate::error::{LedgerError, Result};

/// Configuration for the Ledger.
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    /// Reject wire records whose `seal.hash` differs from the recomputed hash.
    pub verify_seal_hash: bool,
    /// Largest accepted `data`, in bytes. Checked before any cryptography.
    pub max_data_len: usize,
    /// Report resubmissions as `Duplicate` instead of failing.
    pub allow_duplicates: bool,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            verify_seal_hash: true,
            max_data_len: 1024 * 1024,
            allow_duplicates: true,
        }
    }
}

/// Outcome of a successful submission, carrying the record's key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitResult {
    /// Record was verified, stored, and is now the head of its chain.
    Accepted(Sha256Hash),
    /// Record was already stored (idempotent).
    Duplicate(Sha256Hash),
}

impl SubmitResult {
    /// The stored record's [`Record::key`].
    pub fn key(&self) -> Sha256Hash {
        match self {
            SubmitResult::Accepted(k) | SubmitResult::Duplicate(k) => *k,
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, SubmitResult::Accepted(_))
    }
}

/// Verified record storage over any [`RecordStore`].
pub struct Ledger<S: RecordStore> {
    store: Arc<S>,
    config: LedgerConfig,
}

impl<S: RecordStore> Ledger<S> {
    pub fn new(store: S, config: LedgerConfig) -> Self {
        Self {
            store: Arc::new(store),
            config,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Submission
    // ─────────────────────────────────────────────────────────────────────────

    /// Verify and store a root record.
    #[instrument(skip_all, fields(local_id = %metadata.local_id))]
    pub async fn submit_root(
        &self,
        metadata: Metadata,
        data: impl Into<Bytes>,
        signature_base64: &str,
    ) -> Result<SubmitResult> {
        let data = data.into();
        self.check_size(data.len())?;
        let record = reject_on_err(RootRecord::new(metadata, data, signature_base64))?;
        self.save(record.into()).await
    }

    /// Verify and store an update of the chain `parent_id`.
    ///
    /// The parent is the chain's current head, so the signature must come
    /// from one of the head's keys.
    #[instrument(skip_all, fields(parent_id = %parent_id))]
    pub async fn submit_update(
        &self,
        parent_id: &str,
        metadata: Metadata,
        data: impl Into<Bytes>,
        signature_base64: &str,
    ) -> Result<SubmitResult> {
        let data = data.into();
        self.check_size(data.len())?;
        let parent = self.parent(parent_id).await?;
        let record =
            reject_on_err(UpdateRecord::new(Some(parent), metadata, data, signature_base64))?;
        self.save(record.into()).await
    }

    /// Parse, verify, and store a root record in wire JSON form.
    #[instrument(skip_all)]
    pub async fn ingest_root_json(&self, json: &str) -> Result<SubmitResult> {
        let decoded = self.decode_wire(json)?;
        let record = reject_on_err(decoded.into_root(self.seal_policy()))?;
        self.save(record.into()).await
    }

    /// Parse, verify, and store an update of chain `parent_id` in wire JSON form.
    #[instrument(skip_all, fields(parent_id = %parent_id))]
    pub async fn ingest_update_json(&self, parent_id: &str, json: &str) -> Result<SubmitResult> {
        let decoded = self.decode_wire(json)?;
        let parent = self.parent(parent_id).await?;
        let record = reject_on_err(decoded.into_update(parent, self.seal_policy()))?;
        self.save(record.into()).await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────────

    /// The current head of chain `id`.
    pub async fn get(&self, id: &str) -> Result<Option<Arc<Record>>> {
        Ok(self.store.fetch(id).await?)
    }

    pub async fn get_by_key(&self, key: &Sha256Hash) -> Result<Option<Arc<Record>>> {
        Ok(self.store.fetch_by_key(key).await?)
    }

    /// Record keys in chain `id`, oldest first.
    pub async fn history(&self, id: &str) -> Result<Vec<Sha256Hash>> {
        Ok(self.store.history(id).await?)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Internals
    // ─────────────────────────────────────────────────────────────────────────

    fn seal_policy(&self) -> SealPolicy {
        if self.config.verify_seal_hash {
            SealPolicy::Verify
        } else {
            SealPolicy::Ignore
        }
    }

    fn check_size(&self, len: usize) -> Result<()> {
        if len > self.config.max_data_len {
            warn!(len, max = self.config.max_data_len, "rejected oversized record");
            return Err(LedgerError::DataTooLarge {
                len,
                max: self.config.max_data_len,
            });
        }
        Ok(())
    }

    fn decode_wire(&self, json: &str) -> Result<DecodedRecord> {
        let wire = reject_on_err(WireRecord::from_json(json))?;
        let decoded = reject_on_err(wire.decode())?;
        self.check_size(decoded.data.len())?;
        Ok(decoded)
    }

    async fn parent(&self, parent_id: &str) -> Result<Arc<Record>> {
        match self.store.fetch(parent_id).await? {
            Some(parent) => Ok(parent),
            None => {
                warn!(parent_id, "update names an unknown chain");
                Err(LedgerError::ParentNotFound(parent_id.to_string()))
            }
        }
    }

    async fn save(&self, record: Record) -> Result<SubmitResult> {
        let key = record.key();
        match self.store.save(&record).await? {
            SaveResult::Inserted => {
                debug!(
                    id = record.chain_id(),
                    hash = %record.hash(),
                    %key,
                    kind = record.kind().as_str(),
                    signer_index = record.signer_index(),
                    "accepted record"
                );
                Ok(SubmitResult::Accepted(key))
            }
            SaveResult::AlreadyExists if self.config.allow_duplicates => {
                debug!(%key, "record already stored");
                Ok(SubmitResult::Duplicate(key))
            }
            SaveResult::AlreadyExists => Err(LedgerError::AlreadyStored(key)),
        }
    }
}

fn reject_on_err<T>(result: meshchain_core::Result<T>) -> Result<T> {
    result.map_err(|e| {
        warn!(error = %e, "rejected record");
        LedgerError::from(e)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use meshchain_store::MemoryStore;
    use meshchain_testkit::{root_metadata, signature_base64};

    #[test]
    fn test_default_config() {
        let config = LedgerConfig::default();
        assert!(config.verify_seal_hash);
        assert!(config.allow_duplicates);
        assert_eq!(config.max_data_len, 1 << 20);
    }

    #[test]
    fn test_submit_result_accessors() {
        let h = Sha256Hash::hash(b"x");
        assert!(SubmitResult::Accepted(h).is_accepted());
        assert!(!SubmitResult::Duplicate(h).is_accepted());
        assert_eq!(SubmitResult::Duplicate(h).key(), h);
    }

    #[tokio::test]
    async fn test_size_checked_before_signature() {
        let ledger = Ledger::new(
            MemoryStore::new(),
            LedgerConfig {
                max_data_len: 4,
                ..LedgerConfig::default()
            },
        );
        let result = ledger
            .submit_root(root_metadata("", &[0]), &b"too long"[..], "%%%")
            .await;
        assert!(matches!(
            result,
            Err(LedgerError::DataTooLarge { len: 8, max: 4 })
        ));
    }

    #[tokio::test]
    async fn test_duplicates_rejected_when_configured() {
        let ledger = Ledger::new(
            MemoryStore::new(),
            LedgerConfig {
                allow_duplicates: false,
                ..LedgerConfig::default()
            },
        );
        let metadata = root_metadata("dup", &[0]);
        let sig = signature_base64(&metadata, b"data", 0);

        ledger
            .submit_root(metadata.clone(), &b"data"[..], &sig)
            .await
            .unwrap();
        let again = ledger.submit_root(metadata, &b"data"[..], &sig).await;
        assert!(matches!(again, Err(LedgerError::AlreadyStored(_))));
    }
}
