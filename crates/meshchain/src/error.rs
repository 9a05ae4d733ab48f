//! Error types for the Ledger.

use meshchain_core::{RecordError, Sha256Hash};
use meshchain_store::StoreError;
use thiserror::Error;

/// Errors that can occur during Ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The record failed validation or verification.
    #[error("record rejected: {0}")]
    Record(#[from] RecordError),

    /// Storage error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// No stored chain has this ID.
    #[error("parent record not found: {0}")]
    ParentNotFound(String),

    /// Data exceeds the configured limit.
    #[error("data is {len} bytes, limit is {max}")]
    DataTooLarge { len: usize, max: usize },

    /// The record is already stored and duplicates are not allowed.
    #[error("record already stored: {0}")]
    AlreadyStored(Sha256Hash),
}

impl LedgerError {
    /// Whether the record was rejected because of its signature.
    pub fn is_authorization_failure(&self) -> bool {
        matches!(self, LedgerError::Record(e) if e.is_authorization_failure())
    }
}

/// Result type for Ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;
