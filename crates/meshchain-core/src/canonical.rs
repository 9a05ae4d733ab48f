//! Canonical payload encoding.
//!
//! The payload is the exact byte string that is hashed and signed. It is a
//! deterministic CBOR document (RFC 8949 core deterministic encoding:
//! shortest integer heads, definite lengths, map keys ordered by their
//! encoded bytes):
//!
//! ```text
//! { 0: { 0: id, 1: local_id, 2: [der_key, ...] },
//!   1: data }
//! ```
//!
//! Public keys enter as DER, not PEM, so cosmetic PEM differences do not
//! leak into the hash. There is no signature field: sealing a record never
//! changes what was sealed.

use ciborium::value::Value;

use crate::crypto::Sha256Hash;
use crate::error::Result;
use crate::metadata::Metadata;

/// Integer keys of the payload maps. Keys 0-23 encode as single bytes.
mod keys {
    pub const METADATA: u64 = 0;
    pub const DATA: u64 = 1;

    pub const ID: u64 = 0;
    pub const LOCAL_ID: u64 = 1;
    pub const PUBLIC_KEYS: u64 = 2;
}

/// Encode `(metadata, data)` to canonical bytes.
///
/// Fails with `KeyDecoding` if any public key is not a PEM SPKI RSA key.
pub fn canonical_payload(metadata: &Metadata, data: &[u8]) -> Result<Vec<u8>> {
    let der_keys = metadata.public_keys_der()?;

    let metadata_value = Value::Map(vec![
        (int(keys::ID), Value::Text(metadata.id.clone())),
        (int(keys::LOCAL_ID), Value::Text(metadata.local_id.clone())),
        (
            int(keys::PUBLIC_KEYS),
            Value::Array(der_keys.into_iter().map(Value::Bytes).collect()),
        ),
    ]);

    let payload = Value::Map(vec![
        (int(keys::METADATA), metadata_value),
        (int(keys::DATA), Value::Bytes(data.to_vec())),
    ]);

    let mut buf = Vec::new();
    encode_value(&mut buf, &payload);
    Ok(buf)
}

/// SHA-256 of the canonical payload.
pub fn payload_hash(metadata: &Metadata, data: &[u8]) -> Result<Sha256Hash> {
    Ok(Sha256Hash::hash(&canonical_payload(metadata, data)?))
}

fn int(n: u64) -> Value {
    Value::Integer(n.into())
}

fn encode_value(buf: &mut Vec<u8>, value: &Value) {
    match value {
        Value::Integer(i) => {
            let n: i128 = (*i).into();
            if n >= 0 {
                encode_head(buf, 0, n as u64);
            } else {
                encode_head(buf, 1, (-1 - n) as u64);
            }
        }
        Value::Bytes(b) => {
            encode_head(buf, 2, b.len() as u64);
            buf.extend_from_slice(b);
        }
        Value::Text(s) => {
            encode_head(buf, 3, s.len() as u64);
            buf.extend_from_slice(s.as_bytes());
        }
        Value::Array(items) => {
            encode_head(buf, 4, items.len() as u64);
            for item in items {
                encode_value(buf, item);
            }
        }
        Value::Map(entries) => encode_map(buf, entries),
        other => unreachable!("canonical payload never holds {:?}", other),
    }
}

/// Write a major type and argument using the shortest head.
fn encode_head(buf: &mut Vec<u8>, major: u8, n: u64) {
    let mt = major << 5;
    if n < 24 {
        buf.push(mt | n as u8);
    } else if n <= u8::MAX as u64 {
        buf.push(mt | 24);
        buf.push(n as u8);
    } else if n <= u16::MAX as u64 {
        buf.push(mt | 25);
        buf.extend_from_slice(&(n as u16).to_be_bytes());
    } else if n <= u32::MAX as u64 {
        buf.push(mt | 26);
        buf.extend_from_slice(&(n as u32).to_be_bytes());
    } else {
        buf.push(mt | 27);
        buf.extend_from_slice(&n.to_be_bytes());
    }
}

/// Maps are written with keys sorted by their encoded bytes.
fn encode_map(buf: &mut Vec<u8>, entries: &[(Value, Value)]) {
    let mut encoded: Vec<(Vec<u8>, &Value)> = entries
        .iter()
        .map(|(k, v)| {
            let mut key = Vec::new();
            encode_value(&mut key, k);
            (key, v)
        })
        .collect();
    encoded.sort_by(|a, b| a.0.cmp(&b.0));

    encode_head(buf, 5, encoded.len() as u64);
    for (key, value) in encoded {
        buf.extend_from_slice(&key);
        encode_value(buf, value);
    }
}
