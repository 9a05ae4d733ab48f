//! Any-of-N signature verification.

use crate::crypto::{decode_public_keys, Sha256Hash, Signature};
use crate::error::{RecordError, Result};

/// Verify `signature` over `hash` against an ordered list of PEM keys.
///
/// All candidates are decoded first, so a malformed key fails with
/// `KeyDecoding` even when an earlier key would have matched. The scan then
/// stops at the first key that verifies and returns its index. One matching
/// key is sufficient; there is no threshold.
pub fn verify_signature<S: AsRef<str>>(
    hash: &Sha256Hash,
    signature: &Signature,
    candidate_keys: &[S],
) -> Result<usize> {
    decode_public_keys(candidate_keys)?
        .iter()
        .position(|key| signature.verifies(key, hash))
        .ok_or(RecordError::NoMatchingKey)
}
