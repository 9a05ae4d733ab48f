//! Record metadata: the declared identity of a record.

use serde::{Deserialize, Serialize};

use crate::crypto::{decode_public_keys, public_key_der};
use crate::error::{RecordError, Result};
use crate::id::generate_id;

/// The metadata of a record.
///
/// A record's ID is bound to its local name and its ordered public keys
/// through [`generate_id`]. Root records must carry metadata that passes
/// [`Metadata::validate`]; update records carry the next generation's keys
/// and are not held to it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    /// Derived record identifier.
    pub id: String,

    /// Optional caller-chosen name, empty when unused.
    #[serde(default)]
    pub local_id: String,

    /// PEM-encoded SPKI RSA public keys, in declaration order.
    pub public_keys: Vec<String>,
}

impl Metadata {
    /// Build metadata whose ID is derived from `local_id` and `public_keys`.
    pub fn derive(local_id: impl Into<String>, public_keys: Vec<String>) -> Self {
        let local_id = local_id.into();
        let id = generate_id(&local_id, &public_keys);
        Self {
            id,
            local_id,
            public_keys,
        }
    }

    /// The ID these keys and local name would produce.
    pub fn generate_id(&self) -> String {
        generate_id(&self.local_id, &self.public_keys)
    }

    /// Check the structural invariants, in order: at least one key, a
    /// non-empty ID, and an ID matching the derivation.
    pub fn validate(&self) -> Result<()> {
        if self.public_keys.is_empty() {
            return Err(RecordError::MissingPublicKey);
        }
        if self.id.is_empty() {
            return Err(RecordError::MissingId);
        }
        if self.id != self.generate_id() {
            return Err(RecordError::IdMismatch);
        }
        Ok(())
    }

    /// DER encodings of the public keys, in order.
    pub fn public_keys_der(&self) -> Result<Vec<Vec<u8>>> {
        decode_public_keys(&self.public_keys)?
            .iter()
            .enumerate()
            .map(|(i, key)| public_key_der(i, key))
            .collect()
    }
}
