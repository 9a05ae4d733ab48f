//! Cryptographic primitives for Meshchain.
//!
//! Wraps SHA-256 hashing, PEM/DER handling of RSA public keys, and
//! RSA-PSS(SHA-256) signing over a precomputed digest with strong types.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use rsa::pkcs8::{DecodePublicKey, EncodePublicKey, LineEnding};
use rsa::traits::PublicKeyParts;
use rsa::{Pss, RsaPrivateKey, RsaPublicKey};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

use crate::error::{RecordError, Result};

/// A 32-byte SHA-256 hash.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Sha256Hash(pub [u8; 32]);

impl Sha256Hash {
    /// Compute the SHA-256 hash of data.
    pub fn hash(data: &[u8]) -> Self {
        Self(Sha256::digest(data).into())
    }

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Standard-alphabet base64, as used in the wire seal.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.0)
    }

    /// Parse from a base64 string holding exactly 32 bytes.
    pub fn from_base64(s: &str) -> Result<Self> {
        let bytes = STANDARD
            .decode(s)
            .map_err(|e| RecordError::MalformedWire(format!("seal.hash: {}", e)))?;
        Self::try_from(bytes.as_slice())
    }
}

impl fmt::Debug for Sha256Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SHA256({}...)", &self.to_hex()[..8])
    }
}

impl fmt::Display for Sha256Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl AsRef<[u8]> for Sha256Hash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; 32]> for Sha256Hash {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl TryFrom<&[u8]> for Sha256Hash {
    type Error = RecordError;

    fn try_from(slice: &[u8]) -> Result<Self> {
        let arr: [u8; 32] = slice.try_into().map_err(|_| {
            RecordError::MalformedWire(format!("hash must be 32 bytes, got {}", slice.len()))
        })?;
        Ok(Self(arr))
    }
}

/// Raw RSA-PSS signature bytes.
///
/// A signature names no key; verifiers try each candidate in turn.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Signature(Vec<u8>);

impl Signature {
    /// Wrap raw signature bytes.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Get raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.0)
    }

    /// Decode the textual (standard base64) form.
    pub fn from_base64(s: &str) -> Result<Self> {
        STANDARD
            .decode(s)
            .map(Self)
            .map_err(|e| RecordError::SignatureEncoding(e.to_string()))
    }

    /// Sign a precomputed digest with RSA-PSS over SHA-256.
    ///
    /// Uses the thread-local CSPRNG for the salt, so concurrent signers
    /// never share RNG state.
    pub fn sign_digest(private_key: &RsaPrivateKey, digest: &Sha256Hash) -> Result<Self> {
        let mut rng = rand::thread_rng();
        private_key
            .sign_with_rng(&mut rng, Pss::new::<Sha256>(), digest.as_bytes())
            .map(Self)
            .map_err(|e| RecordError::Signing(e.to_string()))
    }

    /// Check this signature over `digest` against a single key.
    ///
    /// Accepts a salt as long as the digest (what [`sign_digest`](Self::sign_digest)
    /// produces) or the longest salt the key's modulus allows, which is what
    /// signers using an automatic salt length emit.
    pub fn verifies(&self, public_key: &RsaPublicKey, digest: &Sha256Hash) -> bool {
        let verify_with = |salt_len: usize| {
            public_key
                .verify(
                    Pss::new_with_salt::<Sha256>(salt_len),
                    digest.as_bytes(),
                    &self.0,
                )
                .is_ok()
        };

        if verify_with(DIGEST_LEN) {
            return true;
        }
        match max_salt_len(public_key) {
            Some(max) if max != DIGEST_LEN => verify_with(max),
            _ => false,
        }
    }
}

const DIGEST_LEN: usize = 32;

/// Longest PSS salt for SHA-256 under `key`: emLen - hLen - 2, where emLen
/// is the byte length of a (modBits - 1)-bit encoded message.
pub fn max_salt_len(key: &RsaPublicKey) -> Option<usize> {
    let em_len = (key.n().bits() + 6) / 8;
    em_len.checked_sub(DIGEST_LEN + 2)
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex = hex::encode(&self.0);
        write!(f, "Signature({}...)", &hex[..hex.len().min(16)])
    }
}

impl AsRef<[u8]> for Signature {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Decode a PEM SubjectPublicKeyInfo string into an RSA public key.
///
/// `index` is the key's position in its metadata and is reported on failure.
pub fn decode_public_key(index: usize, pem: &str) -> Result<RsaPublicKey> {
    RsaPublicKey::from_public_key_pem(pem).map_err(|e| RecordError::KeyDecoding {
        index,
        reason: e.to_string(),
    })
}

/// Decode every key in order, failing on the first invalid one.
pub fn decode_public_keys<S: AsRef<str>>(pems: &[S]) -> Result<Vec<RsaPublicKey>> {
    pems.iter()
        .enumerate()
        .map(|(i, pem)| decode_public_key(i, pem.as_ref()))
        .collect()
}

/// DER (SPKI) encoding of a public key.
pub fn public_key_der(index: usize, key: &RsaPublicKey) -> Result<Vec<u8>> {
    key.to_public_key_der()
        .map(|doc| doc.as_bytes().to_vec())
        .map_err(|e| RecordError::KeyDecoding {
            index,
            reason: e.to_string(),
        })
}

/// PEM-encode a public key with LF line endings.
///
/// This is the textual form IDs are derived from, so keys that travel as
/// DER come back to the same PEM string only if they were minted in this
/// form (64-column body, LF endings, trailing newline).
pub fn public_key_pem(index: usize, key: &RsaPublicKey) -> Result<String> {
    key.to_public_key_pem(LineEnding::LF)
        .map_err(|e| RecordError::KeyDecoding {
            index,
            reason: e.to_string(),
        })
}

/// Rebuild the PEM form of a DER-encoded SPKI RSA key.
pub fn pem_from_der(index: usize, der: &[u8]) -> Result<String> {
    let key = RsaPublicKey::from_public_key_der(der).map_err(|e| RecordError::KeyDecoding {
        index,
        reason: e.to_string(),
    })?;
    public_key_pem(index, &key)
}
