//! Unsigned records: validated content awaiting a seal.
//!
//! An unsigned record exposes the hash that must be signed and can produce
//! a signature from a private key. It never checks that the key belongs to
//! an authorized set; that happens when the signed record is constructed.

use std::sync::Arc;

use bytes::Bytes;
use rsa::RsaPrivateKey;

use crate::canonical::payload_hash;
use crate::crypto::{Sha256Hash, Signature};
use crate::error::{RecordError, Result};
use crate::metadata::Metadata;
use crate::record::{Record, RootRecord, UpdateRecord};

/// A root record without a signature.
///
/// Construction requires valid metadata: at least one public key and an ID
/// derived from the local ID and those keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsignedRootRecord {
    metadata: Metadata,
    data: Bytes,
}

impl UnsignedRootRecord {
    pub fn new(metadata: Metadata, data: impl Into<Bytes>) -> Result<Self> {
        metadata.validate()?;
        Ok(Self {
            metadata,
            data: data.into(),
        })
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// SHA-256 of the canonical payload. Covers metadata and data only.
    pub fn hash(&self) -> Result<Sha256Hash> {
        payload_hash(&self.metadata, &self.data)
    }

    /// Sign this record's hash with RSA-PSS/SHA-256.
    pub fn generate_signature(&self, private_key: &RsaPrivateKey) -> Result<Signature> {
        Signature::sign_digest(private_key, &self.hash()?)
    }

    /// Sign and verify in one step.
    ///
    /// Fails with `NoMatchingKey` if `private_key` does not belong to one of
    /// the record's own public keys.
    pub fn seal(self, private_key: &RsaPrivateKey) -> Result<RootRecord> {
        let signature = self.generate_signature(private_key)?;
        RootRecord::with_signature(self.metadata, self.data, signature)
    }
}

/// An update record without a signature.
///
/// The record's own metadata is not validated: its keys describe the next
/// generation of authority. The current signature must come from a key of
/// the parent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsignedUpdateRecord {
    parent: Arc<Record>,
    metadata: Metadata,
    data: Bytes,
}

impl UnsignedUpdateRecord {
    pub fn new(
        parent: Option<Arc<Record>>,
        metadata: Metadata,
        data: impl Into<Bytes>,
    ) -> Result<Self> {
        let parent = parent.ok_or(RecordError::MissingParent)?;
        Ok(Self {
            parent,
            metadata,
            data: data.into(),
        })
    }

    pub fn parent(&self) -> &Arc<Record> {
        &self.parent
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// SHA-256 of this update's own canonical payload (not the parent's).
    pub fn hash(&self) -> Result<Sha256Hash> {
        payload_hash(&self.metadata, &self.data)
    }

    pub fn generate_signature(&self, private_key: &RsaPrivateKey) -> Result<Signature> {
        Signature::sign_digest(private_key, &self.hash()?)
    }

    /// Sign and verify against the parent's keys in one step.
    pub fn seal(self, private_key: &RsaPrivateKey) -> Result<UpdateRecord> {
        let signature = self.generate_signature(private_key)?;
        UpdateRecord::with_signature(Some(self.parent), self.metadata, self.data, signature)
    }
}
