//! Error types for Meshchain Core.

use thiserror::Error;

/// Errors that can occur while building, sealing, or parsing a record.
///
/// Every constructor in this crate either returns a fully valid record or
/// one of these. The `Display` strings of the metadata variants are stable:
/// callers match on them when translating rejections for their peers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("metadata must contain at least one publicKey")]
    MissingPublicKey,

    #[error("metadata must contain an ID")]
    MissingId,

    #[error("metadata.ID does not match publicKeys + localName")]
    IdMismatch,

    #[error("PublicKey at index '{index}' is invalid: {reason}")]
    KeyDecoding { index: usize, reason: String },

    #[error("failed to base64 decode signature: {0}")]
    SignatureEncoding(String),

    #[error("failed to sign record: {0}")]
    Signing(String),

    #[error("None of the PublicKeys matches the signature")]
    NoMatchingKey,

    #[error("a valid parent record is required")]
    MissingParent,

    #[error("malformed wire record: {0}")]
    MalformedWire(String),

    #[error("seal hash mismatch: expected {expected}, got {actual}")]
    SealHashMismatch { expected: String, actual: String },
}

impl RecordError {
    /// Whether the failure came from the signature rather than the record's
    /// own structure.
    pub fn is_authorization_failure(&self) -> bool {
        matches!(
            self,
            RecordError::NoMatchingKey | RecordError::SignatureEncoding(_)
        )
    }
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, RecordError>;
