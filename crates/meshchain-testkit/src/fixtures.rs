//! Test fixtures and helpers.
//!
//! RSA key generation is slow, so fixtures draw from a fixed pool of key
//! pairs generated once per process. Pool slots are addressed by index.

use std::sync::{Arc, OnceLock};

use meshchain_core::{
    payload_hash, public_key_pem, Metadata, Record, RootRecord, RsaPrivateKey, Signature,
    UnsignedRootRecord, UnsignedUpdateRecord, UpdateRecord,
};

/// Number of key pairs in the shared pool.
pub const POOL_SIZE: usize = 6;

/// Modulus size for fixture keys, chosen for fast generation.
pub const TEST_KEY_BITS: usize = 1024;

/// An RSA key pair with its public half rendered as PEM.
#[derive(Clone)]
pub struct TestKey {
    pub public_pem: String,
    pub private_key: RsaPrivateKey,
}

impl TestKey {
    /// Generate a fresh key pair outside the pool.
    pub fn generate() -> Self {
        let private_key = RsaPrivateKey::new(&mut rand::thread_rng(), TEST_KEY_BITS)
            .expect("RSA key generation failed");
        let public_pem =
            public_key_pem(0, &private_key.to_public_key()).expect("PEM encoding failed");
        Self {
            public_pem,
            private_key,
        }
    }
}

impl std::fmt::Debug for TestKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestKey").finish_non_exhaustive()
    }
}

static POOL: OnceLock<Vec<TestKey>> = OnceLock::new();

/// The `n`th pooled key pair. Panics if `n >= POOL_SIZE`.
pub fn test_key(n: usize) -> &'static TestKey {
    let pool = POOL.get_or_init(|| (0..POOL_SIZE).map(|_| TestKey::generate()).collect());
    &pool[n]
}

/// PEM public keys for the given pool slots, in the given order.
pub fn pems(slots: &[usize]) -> Vec<String> {
    slots.iter().map(|&n| test_key(n).public_pem.clone()).collect()
}

/// Valid root metadata owned by the given pool slots.
pub fn root_metadata(local_id: &str, owners: &[usize]) -> Metadata {
    Metadata::derive(local_id, pems(owners))
}

/// Metadata for the next version of `parent`: same ID and local ID, new keys.
pub fn update_metadata(parent: &Record, next_owners: &[usize]) -> Metadata {
    Metadata {
        id: parent.metadata().id.clone(),
        local_id: parent.metadata().local_id.clone(),
        public_keys: pems(next_owners),
    }
}

/// Base64 signature by pool slot `signer` over `(metadata, data)`.
pub fn signature_base64(metadata: &Metadata, data: &[u8], signer: usize) -> String {
    let hash = payload_hash(metadata, data).expect("fixture metadata must encode");
    Signature::sign_digest(&test_key(signer).private_key, &hash)
        .expect("signing failed")
        .to_base64()
}

/// A root owned by `owners`, signed by pool slot `signer`.
pub fn signed_root(local_id: &str, owners: &[usize], signer: usize, data: &[u8]) -> RootRecord {
    UnsignedRootRecord::new(root_metadata(local_id, owners), data.to_vec())
        .expect("fixture metadata must be valid")
        .seal(&test_key(signer).private_key)
        .expect("signer must own the root")
}

/// An update of `parent` handing authority to `next_owners`, signed by `signer`.
pub fn signed_update(
    parent: &Arc<Record>,
    next_owners: &[usize],
    signer: usize,
    data: &[u8],
) -> UpdateRecord {
    signed_update_with(parent, update_metadata(parent, next_owners), signer, data)
}

/// An update of `parent` carrying exactly `metadata`, signed by `signer`.
pub fn signed_update_with(
    parent: &Arc<Record>,
    metadata: Metadata,
    signer: usize,
    data: &[u8],
) -> UpdateRecord {
    UnsignedUpdateRecord::new(Some(parent.clone()), metadata, data.to_vec())
        .expect("parent is present")
        .seal(&test_key(signer).private_key)
        .expect("signer must own the parent")
}

/// A chain of `len` records starting at a root owned by slot 0.
///
/// Record `i` is owned by slot `i % POOL_SIZE` and signed by the previous
/// owner, so each update rotates authority to a new key.
pub fn rotating_chain(local_id: &str, len: usize) -> Vec<Arc<Record>> {
    let mut chain: Vec<Arc<Record>> = Vec::with_capacity(len);
    for i in 0..len {
        let data = format!("version {}", i);
        let record: Record = match chain.last() {
            None => signed_root(local_id, &[0], 0, data.as_bytes()).into(),
            Some(parent) => {
                let owner = i % POOL_SIZE;
                let signer = (i - 1) % POOL_SIZE;
                signed_update(parent, &[owner], signer, data.as_bytes()).into()
            }
        };
        chain.push(Arc::new(record));
    }
    chain
}
