//! Deterministic record identifiers.
//!
//! A record ID is a function of the record's local name and its ordered list
//! of PEM public keys:
//!
//! ```text
//! sha256(local_id || ":" || key_0 || "," || key_1 || ... )
//! ```
//!
//! rendered as five hyphen-separated lowercase hex groups covering the first
//! 16 digest bytes (4-2-2-2-6). The layout looks like a UUID but carries no
//! version or variant bits.
//!
//! Key order matters. `[k1, k2]` and `[k2, k1]` are different identities.

use sha2::{Digest, Sha256};

/// Byte lengths of the rendered digest groups.
const GROUPS: [usize; 5] = [4, 2, 2, 2, 6];

/// Derive the record ID for `local_id` and `public_keys`.
///
/// Never fails: any input, including an empty key list, yields an ID.
pub fn generate_id<S: AsRef<str>>(local_id: &str, public_keys: &[S]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(local_id.as_bytes());
    hasher.update(b":");
    for (i, key) in public_keys.iter().enumerate() {
        if i > 0 {
            hasher.update(b",");
        }
        hasher.update(key.as_ref().as_bytes());
    }
    let digest = hasher.finalize();

    let mut parts = Vec::with_capacity(GROUPS.len());
    let mut offset = 0;
    for len in GROUPS {
        parts.push(hex::encode(&digest[offset..offset + len]));
        offset += len;
    }
    parts.join("-")
}
