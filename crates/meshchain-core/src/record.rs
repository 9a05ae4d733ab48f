//! Signed records.
//!
//! A signed record is verified when it is constructed and immutable after.
//! There is no way to observe a record whose signature has not been checked,
//! and no way to re-sign one: a new signature means a new record.
//!
//! - [`RootRecord`]: authorized by one of its own public keys.
//! - [`UpdateRecord`]: authorized by one of its parent's public keys. Its own
//!   keys authorize the generation after it.
//! - [`Record`]: either of the above, behind one set of accessors.

use std::sync::Arc;

use bytes::Bytes;

use crate::canonical::payload_hash;
use crate::crypto::{Sha256Hash, Signature};
use crate::error::{RecordError, Result};
use crate::metadata::Metadata;
use crate::unsigned::UnsignedRootRecord;
use crate::verify::verify_signature;

/// Fields shared by every signed record.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Sealed {
    metadata: Metadata,
    data: Bytes,
    signature: Signature,
    /// Cached at construction; a function of metadata and data only.
    hash: Sha256Hash,
    /// Index of the authorizing key that verified the signature.
    signer_index: usize,
}

/// A record authorized by its own public keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootRecord {
    sealed: Sealed,
}

impl RootRecord {
    /// Construct and verify a root record from a base64 signature.
    ///
    /// Checks, in order: the metadata invariants, the signature encoding,
    /// and that the signature verifies against one of `metadata.public_keys`.
    pub fn new(metadata: Metadata, data: impl Into<Bytes>, signature_base64: &str) -> Result<Self> {
        let unsigned = UnsignedRootRecord::new(metadata, data)?;
        let signature = Signature::from_base64(signature_base64)?;
        Self::seal_unsigned(unsigned, signature)
    }

    /// Construct and verify a root record from raw signature bytes.
    pub fn with_signature(
        metadata: Metadata,
        data: impl Into<Bytes>,
        signature: Signature,
    ) -> Result<Self> {
        Self::seal_unsigned(UnsignedRootRecord::new(metadata, data)?, signature)
    }

    fn seal_unsigned(unsigned: UnsignedRootRecord, signature: Signature) -> Result<Self> {
        let hash = unsigned.hash()?;
        let signer_index = verify_signature(&hash, &signature, &unsigned.metadata().public_keys)?;
        Ok(Self {
            sealed: Sealed {
                metadata: unsigned.metadata().clone(),
                data: unsigned.data().clone(),
                signature,
                hash,
                signer_index,
            },
        })
    }

    pub fn metadata(&self) -> &Metadata {
        &self.sealed.metadata
    }

    pub fn data(&self) -> &Bytes {
        &self.sealed.data
    }

    pub fn signature(&self) -> &Signature {
        &self.sealed.signature
    }

    /// Hash of metadata and data. The signature never contributes.
    pub fn hash(&self) -> Sha256Hash {
        self.sealed.hash
    }

    /// Position in `metadata.public_keys` of the key that signed.
    pub fn signer_index(&self) -> usize {
        self.sealed.signer_index
    }
}

/// A record authorized by one of its parent's public keys.
///
/// Holds a shared, read-only handle to the parent. The parent's lifetime is
/// managed by whoever else holds it (usually a store).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateRecord {
    parent: Arc<Record>,
    sealed: Sealed,
    /// Cached lineage key; see [`Record::key`].
    key: Sha256Hash,
}

impl UpdateRecord {
    /// Construct and verify an update from a base64 signature.
    ///
    /// The signature is checked against `parent`'s keys, never against
    /// `metadata.public_keys`.
    pub fn new(
        parent: Option<Arc<Record>>,
        metadata: Metadata,
        data: impl Into<Bytes>,
        signature_base64: &str,
    ) -> Result<Self> {
        let parent = parent.ok_or(RecordError::MissingParent)?;
        let signature = Signature::from_base64(signature_base64)?;
        Self::with_signature(Some(parent), metadata, data, signature)
    }

    /// Construct and verify an update from raw signature bytes.
    pub fn with_signature(
        parent: Option<Arc<Record>>,
        metadata: Metadata,
        data: impl Into<Bytes>,
        signature: Signature,
    ) -> Result<Self> {
        let parent = parent.ok_or(RecordError::MissingParent)?;
        let data = data.into();
        let hash = payload_hash(&metadata, &data)?;
        let signer_index = verify_signature(&hash, &signature, parent.public_keys())?;
        let key = lineage_key(&hash, &parent.key());
        Ok(Self {
            parent,
            sealed: Sealed {
                metadata,
                data,
                signature,
                hash,
                signer_index,
            },
            key,
        })
    }

    pub fn parent(&self) -> &Arc<Record> {
        &self.parent
    }

    pub fn metadata(&self) -> &Metadata {
        &self.sealed.metadata
    }

    pub fn data(&self) -> &Bytes {
        &self.sealed.data
    }

    pub fn signature(&self) -> &Signature {
        &self.sealed.signature
    }

    /// Hash of this update's own metadata and data.
    pub fn hash(&self) -> Sha256Hash {
        self.sealed.hash
    }

    /// This update's hash bound to its parent's key.
    pub fn key(&self) -> Sha256Hash {
        self.key
    }

    /// Position in the parent's public keys of the key that signed.
    pub fn signer_index(&self) -> usize {
        self.sealed.signer_index
    }
}

/// Which key set authorizes a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Root,
    Update,
}

impl RecordKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RecordKind::Root => "root",
            RecordKind::Update => "update",
        }
    }
}

/// A validated record of either kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    Root(RootRecord),
    Update(UpdateRecord),
}

impl Record {
    fn sealed(&self) -> &Sealed {
        match self {
            Record::Root(r) => &r.sealed,
            Record::Update(u) => &u.sealed,
        }
    }

    pub fn kind(&self) -> RecordKind {
        match self {
            Record::Root(_) => RecordKind::Root,
            Record::Update(_) => RecordKind::Update,
        }
    }

    pub fn metadata(&self) -> &Metadata {
        &self.sealed().metadata
    }

    pub fn id(&self) -> &str {
        &self.sealed().metadata.id
    }

    pub fn data(&self) -> &Bytes {
        &self.sealed().data
    }

    pub fn signature(&self) -> &Signature {
        &self.sealed().signature
    }

    pub fn hash(&self) -> Sha256Hash {
        self.sealed().hash
    }

    /// Identity of this record within its lineage.
    ///
    /// The content hash leaves out the parent, so two updates with equal
    /// metadata and data under different parents share a hash. The key
    /// tells them apart: a root's key is its hash, and an update's key is
    /// SHA-256 over its hash followed by its parent's key.
    pub fn key(&self) -> Sha256Hash {
        match self {
            Record::Root(r) => r.hash(),
            Record::Update(u) => u.key,
        }
    }

    /// The record's own keys: holders of the matching private keys may
    /// authorize the next version of this record.
    pub fn public_keys(&self) -> &[String] {
        &self.sealed().metadata.public_keys
    }

    /// The keys this record's signature was checked against.
    pub fn authorizing_keys(&self) -> &[String] {
        match self {
            Record::Root(r) => &r.sealed.metadata.public_keys,
            Record::Update(u) => u.parent.public_keys(),
        }
    }

    pub fn signer_index(&self) -> usize {
        self.sealed().signer_index
    }

    pub fn parent(&self) -> Option<&Arc<Record>> {
        match self {
            Record::Root(_) => None,
            Record::Update(u) => Some(&u.parent),
        }
    }

    /// Number of ancestors between this record and its root.
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut current = self;
        while let Some(parent) = current.parent() {
            depth += 1;
            current = parent;
        }
        depth
    }

    /// The root this record descends from (itself for a root).
    pub fn root(&self) -> &Record {
        let mut current = self;
        while let Some(parent) = current.parent() {
            current = parent;
        }
        current
    }

    /// The ID of the chain this record belongs to: its root's ID.
    ///
    /// An update's own metadata ID is not validated and never names a chain.
    pub fn chain_id(&self) -> &str {
        self.root().id()
    }
}

fn lineage_key(hash: &Sha256Hash, parent_key: &Sha256Hash) -> Sha256Hash {
    let mut bytes = [0u8; 64];
    bytes[..32].copy_from_slice(hash.as_bytes());
    bytes[32..].copy_from_slice(parent_key.as_bytes());
    Sha256Hash::hash(&bytes)
}

impl From<RootRecord> for Record {
    fn from(record: RootRecord) -> Self {
        Record::Root(record)
    }
}

impl From<UpdateRecord> for Record {
    fn from(record: UpdateRecord) -> Self {
        Record::Update(record)
    }
}
