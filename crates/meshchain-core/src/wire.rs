//! JSON wire form of a signed record.
//!
//! ```json
//! { "metadata": { "id": "...", "localId": "...", "publicKeys": ["<base64 DER>"] },
//!   "data": "<base64>",
//!   "seal": { "hash": "<base64>", "signature": "<base64>" } }
//! ```
//!
//! Public keys travel as base64 DER and are rendered back to LF PEM on
//! parse, which is the form IDs are derived from. Parsing always re-runs
//! full validation; the wire form is never trusted.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::crypto::{pem_from_der, Sha256Hash, Signature};
use crate::error::{RecordError, Result};
use crate::metadata::Metadata;
use crate::record::{Record, RootRecord, UpdateRecord};

/// Metadata as it appears on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireMetadata {
    pub id: String,
    #[serde(default)]
    pub local_id: String,
    /// Base64 (standard) DER SPKI keys.
    #[serde(default)]
    pub public_keys: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireSeal {
    pub hash: String,
    pub signature: String,
}

/// A record ready for JSON transport or storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireRecord {
    pub metadata: WireMetadata,
    #[serde(default)]
    pub data: String,
    pub seal: WireSeal,
}

/// What to do with the declared `seal.hash` when parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SealPolicy {
    /// Reject the record unless `seal.hash` equals the recomputed hash.
    #[default]
    Verify,
    /// Recompute the hash and disregard the declared one.
    Ignore,
}

impl WireRecord {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| RecordError::MalformedWire(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| RecordError::MalformedWire(e.to_string()))
    }

    /// Rebuild PEM metadata from the wire form.
    pub fn decode_metadata(&self) -> Result<Metadata> {
        let public_keys = self
            .metadata
            .public_keys
            .iter()
            .enumerate()
            .map(|(i, b64)| {
                let der = STANDARD.decode(b64).map_err(|e| RecordError::KeyDecoding {
                    index: i,
                    reason: e.to_string(),
                })?;
                pem_from_der(i, &der)
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Metadata {
            id: self.metadata.id.clone(),
            local_id: self.metadata.local_id.clone(),
            public_keys,
        })
    }

    pub fn decode_data(&self) -> Result<Bytes> {
        STANDARD
            .decode(&self.data)
            .map(Bytes::from)
            .map_err(|e| RecordError::MalformedWire(format!("data: {}", e)))
    }

    /// The hash the sender declared in the seal.
    pub fn declared_hash(&self) -> Result<Sha256Hash> {
        Sha256Hash::from_base64(&self.seal.hash)
    }

    /// Decode the base64 fields without verifying anything.
    ///
    /// Data is decoded before keys, so a caller can bound its size before
    /// any key parsing or signature work.
    pub fn decode(self) -> Result<DecodedRecord> {
        let data = self.decode_data()?;
        let metadata = self.decode_metadata()?;
        Ok(DecodedRecord {
            metadata,
            data,
            seal: self.seal,
        })
    }

    /// Parse and verify as a root record.
    pub fn into_root(self, policy: SealPolicy) -> Result<RootRecord> {
        self.decode()?.into_root(policy)
    }

    /// Parse and verify as an update of `parent`.
    pub fn into_update(
        self,
        parent: Option<Arc<Record>>,
        policy: SealPolicy,
    ) -> Result<UpdateRecord> {
        let parent = parent.ok_or(RecordError::MissingParent)?;
        self.decode()?.into_update(parent, policy)
    }

    /// Parse as a root when `parent` is `None`, otherwise as an update.
    pub fn into_record(self, parent: Option<Arc<Record>>, policy: SealPolicy) -> Result<Record> {
        match parent {
            None => self.into_root(policy).map(Record::Root),
            Some(parent) => self.into_update(Some(parent), policy).map(Record::Update),
        }
    }
}

/// A wire record whose keys and data are decoded but not yet verified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedRecord {
    pub metadata: Metadata,
    pub data: Bytes,
    seal: WireSeal,
}

impl DecodedRecord {
    pub fn into_root(self, policy: SealPolicy) -> Result<RootRecord> {
        let record = RootRecord::new(self.metadata, self.data, &self.seal.signature)?;
        check_seal(&self.seal, record.hash(), policy)?;
        Ok(record)
    }

    pub fn into_update(self, parent: Arc<Record>, policy: SealPolicy) -> Result<UpdateRecord> {
        let record = UpdateRecord::new(
            Some(parent),
            self.metadata,
            self.data,
            &self.seal.signature,
        )?;
        check_seal(&self.seal, record.hash(), policy)?;
        Ok(record)
    }
}

fn check_seal(seal: &WireSeal, actual: Sha256Hash, policy: SealPolicy) -> Result<()> {
    if policy == SealPolicy::Ignore {
        return Ok(());
    }
    let declared = Sha256Hash::from_base64(&seal.hash)?;
    if declared != actual {
        return Err(RecordError::SealHashMismatch {
            expected: declared.to_hex(),
            actual: actual.to_hex(),
        });
    }
    Ok(())
}

impl Record {
    /// Wire form: DER keys, base64 data, and a seal of hash + signature.
    pub fn to_wire(&self) -> Result<WireRecord> {
        let metadata = self.metadata();
        let public_keys = metadata
            .public_keys_der()?
            .into_iter()
            .map(|der| STANDARD.encode(der))
            .collect();

        Ok(WireRecord {
            metadata: WireMetadata {
                id: metadata.id.clone(),
                local_id: metadata.local_id.clone(),
                public_keys,
            },
            data: STANDARD.encode(self.data()),
            seal: WireSeal {
                hash: self.hash().to_base64(),
                signature: self.signature().to_base64(),
            },
        })
    }

    pub fn to_json(&self) -> Result<String> {
        self.to_wire()?.to_json()
    }
}

impl RootRecord {
    pub fn to_json(&self) -> Result<String> {
        Record::Root(self.clone()).to_json()
    }

    /// Parse a root record from its JSON wire form, verifying the seal hash.
    pub fn from_json(json: &str) -> Result<Self> {
        WireRecord::from_json(json)?.into_root(SealPolicy::Verify)
    }
}

impl UpdateRecord {
    pub fn to_json(&self) -> Result<String> {
        Record::Update(self.clone()).to_json()
    }

    /// Parse an update of `parent` from its JSON wire form.
    pub fn from_json(parent: Option<Arc<Record>>, json: &str) -> Result<Self> {
        WireRecord::from_json(json)?.into_update(parent, SealPolicy::Verify)
    }
}

impl WireSeal {
    /// Fails with `SignatureEncoding`, not `MalformedWire`.
    pub fn decode_signature(&self) -> Result<Signature> {
        Signature::from_base64(&self.signature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::keypair;
    use crate::unsigned::{UnsignedRootRecord, UnsignedUpdateRecord};

    fn root(n: usize, data: &'static [u8]) -> RootRecord {
        let (pem, private_key) = keypair(n);
        UnsignedRootRecord::new(Metadata::derive("local", vec![pem]), data)
            .unwrap()
            .seal(&private_key)
            .unwrap()
    }

    #[test]
    fn test_wire_shape() {
        let record = root(0, b"random data");
        let json: serde_json::Value = serde_json::from_str(&record.to_json().unwrap()).unwrap();

        assert_eq!(json["metadata"]["id"], record.metadata().id.as_str());
        assert_eq!(json["metadata"]["localId"], "local");
        assert_eq!(json["metadata"]["publicKeys"].as_array().unwrap().len(), 1);
        assert_eq!(json["data"], STANDARD.encode(b"random data"));
        assert_eq!(json["seal"]["hash"], record.hash().to_base64());
        assert_eq!(json["seal"]["signature"], record.signature().to_base64());
    }

    #[test]
    fn test_root_roundtrip() {
        let record = root(0, b"random data");
        let parsed = RootRecord::from_json(&record.to_json().unwrap()).unwrap();

        assert_eq!(parsed.hash(), record.hash());
        assert_eq!(parsed.metadata().public_keys, record.metadata().public_keys);
        assert_eq!(parsed, record);
    }

    #[test]
    fn test_update_roundtrip() {
        let parent: Arc<Record> = Arc::new(root(0, b"v1").into());
        let (_, k0) = keypair(0);
        let update = UnsignedUpdateRecord::new(
            Some(parent.clone()),
            Metadata::derive("", vec![keypair(1).0, keypair(2).0]),
            &b"v2"[..],
        )
        .unwrap()
        .seal(&k0)
        .unwrap();

        let parsed = UpdateRecord::from_json(Some(parent), &update.to_json().unwrap()).unwrap();
        assert_eq!(parsed.hash(), update.hash());
        assert_eq!(parsed.metadata().public_keys, update.metadata().public_keys);
    }

    #[test]
    fn test_update_needs_the_right_parent() {
        let parent: Arc<Record> = Arc::new(root(0, b"v1").into());
        let stranger: Arc<Record> = Arc::new(root(1, b"other").into());
        let (_, k0) = keypair(0);
        let update = UnsignedUpdateRecord::new(Some(parent), Metadata::default(), &b"v2"[..])
            .unwrap()
            .seal(&k0)
            .unwrap();

        let json = update.to_json().unwrap();
        assert_eq!(
            UpdateRecord::from_json(Some(stranger), &json).unwrap_err(),
            RecordError::NoMatchingKey
        );
        assert_eq!(
            UpdateRecord::from_json(None, &json).unwrap_err(),
            RecordError::MissingParent
        );
    }

    #[test]
    fn test_missing_parent_reported_before_decoding() {
        let record = root(0, b"v1");
        let mut wire = Record::Root(record).to_wire().unwrap();
        wire.metadata.public_keys[0] = STANDARD.encode(b"not der");
        wire.data = "***".into();

        assert_eq!(
            wire.into_update(None, SealPolicy::Verify).unwrap_err(),
            RecordError::MissingParent
        );
    }

    #[test]
    fn test_decode_exposes_data() {
        let record = root(0, b"random data");
        let decoded = Record::Root(record.clone()).to_wire().unwrap().decode().unwrap();
        assert_eq!(&decoded.data[..], b"random data");
        assert_eq!(decoded.metadata, *record.metadata());
        assert_eq!(decoded.into_root(SealPolicy::Verify).unwrap(), record);
    }

    #[test]
    fn test_seal_hash_mismatch() {
        let record = root(0, b"random data");
        let mut wire = Record::Root(record).to_wire().unwrap();
        wire.seal.hash = Sha256Hash::hash(b"something else").to_base64();

        let err = wire.clone().into_root(SealPolicy::Verify).unwrap_err();
        assert!(matches!(err, RecordError::SealHashMismatch { .. }));
        assert!(wire.into_root(SealPolicy::Ignore).is_ok());
    }

    #[test]
    fn test_tampered_data_rejected() {
        let record = root(0, b"random data");
        let mut wire = Record::Root(record).to_wire().unwrap();
        wire.data = STANDARD.encode(b"forged data");

        assert_eq!(
            wire.into_root(SealPolicy::Ignore).unwrap_err(),
            RecordError::NoMatchingKey
        );
    }

    #[test]
    fn test_malformed_fields() {
        let record = root(0, b"random data");
        let wire = Record::Root(record).to_wire().unwrap();

        let mut bad_data = wire.clone();
        bad_data.data = "***".into();
        assert!(matches!(
            bad_data.into_root(SealPolicy::Verify),
            Err(RecordError::MalformedWire(_))
        ));

        let mut bad_sig = wire.clone();
        bad_sig.seal.signature = "***".into();
        assert!(matches!(bad_sig.seal.decode_signature(), Err(RecordError::SignatureEncoding(_))));
        assert!(matches!(
            bad_sig.into_root(SealPolicy::Verify),
            Err(RecordError::SignatureEncoding(_))
        ));

        let mut bad_key = wire;
        bad_key.metadata.public_keys[0] = STANDARD.encode(b"not der");
        assert!(matches!(
            bad_key.into_root(SealPolicy::Verify),
            Err(RecordError::KeyDecoding { index: 0, .. })
        ));
    }

    #[test]
    fn test_not_json() {
        assert!(matches!(
            WireRecord::from_json("{ nope"),
            Err(RecordError::MalformedWire(_))
        ));
    }

    #[test]
    fn test_into_record_dispatch() {
        let record = root(0, b"random data");
        let wire = Record::Root(record.clone()).to_wire().unwrap();
        let parsed = wire.into_record(None, SealPolicy::Verify).unwrap();
        assert_eq!(parsed, Record::Root(record));
    }
}
