//! Shared helpers for unit tests in this crate.

use std::sync::OnceLock;

use rsa::RsaPrivateKey;

use crate::crypto::public_key_pem;

/// Small enough to generate quickly; production keys should be larger.
const TEST_KEY_BITS: usize = 1024;
const POOL_SIZE: usize = 4;

static POOL: OnceLock<Vec<(String, RsaPrivateKey)>> = OnceLock::new();

/// The `n`th key pair from a lazily generated pool, as (PEM public key, private key).
pub(crate) fn keypair(n: usize) -> (String, RsaPrivateKey) {
    let pool = POOL.get_or_init(|| {
        let mut rng = rand::thread_rng();
        (0..POOL_SIZE)
            .map(|i| {
                let private_key = RsaPrivateKey::new(&mut rng, TEST_KEY_BITS).unwrap();
                let pem = public_key_pem(i, &private_key.to_public_key()).unwrap();
                (pem, private_key)
            })
            .collect()
    });
    pool[n].clone()
}
