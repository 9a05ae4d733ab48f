//! # Meshchain Core
//!
//! Pure primitives for Meshchain: record IDs, canonical payloads, and
//! RSA-PSS seals over self-certifying records.
//!
//! This crate contains no I/O, no storage, no logging. Every signed record is
//! verified when it is constructed; holding a [`Record`] means its signature
//! was checked against the right key set.
//!
//! ## Key Types
//!
//! - [`Metadata`] - ID, local ID and the public keys that govern a record
//! - [`UnsignedRootRecord`] / [`UnsignedUpdateRecord`] - content awaiting a seal
//! - [`RootRecord`] - authorized by one of its own keys
//! - [`UpdateRecord`] - authorized by one of its parent's keys
//! - [`Record`] - either kind, behind one set of accessors
//!
//! ## Authorization
//!
//! ```text
//! root (keys K0)  <-  update 1 (keys K1, signed by K0)  <-  update 2 (signed by K1)
//! ```
//!
//! A root proves its ID is derived from its keys and that one of those keys
//! signed it. An update is signed by a key of its parent and names the keys
//! allowed to sign the next update.
//!
//! ## Canonicalization
//!
//! Record hashes cover a deterministic CBOR payload of metadata and data.
//! See the [`canonical`] module.

pub mod canonical;
pub mod crypto;
pub mod error;
pub mod id;
pub mod metadata;
pub mod record;
pub mod unsigned;
pub mod verify;
pub mod wire;

#[cfg(test)]
mod testing;

pub use canonical::{canonical_payload, payload_hash};
pub use crypto::{decode_public_key, public_key_pem, Sha256Hash, Signature};
pub use error::{RecordError, Result};
pub use id::generate_id;
pub use metadata::Metadata;
pub use record::{Record, RecordKind, RootRecord, UpdateRecord};
pub use unsigned::{UnsignedRootRecord, UnsignedUpdateRecord};
pub use verify::verify_signature;
pub use wire::{DecodedRecord, SealPolicy, WireMetadata, WireRecord, WireSeal};

/// Re-exported so callers can hold keys without depending on `rsa` directly.
pub use rsa::{RsaPrivateKey, RsaPublicKey};
