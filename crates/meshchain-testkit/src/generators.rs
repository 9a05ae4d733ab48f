//! Proptest generators for property-based testing.
//!
//! Key material comes from the fixture pool; strategies pick pool slots
//! rather than generating RSA keys per case.

use proptest::prelude::*;

use meshchain_core::{Metadata, RootRecord};

use crate::fixtures::{root_metadata, test_key, POOL_SIZE};

/// A local ID, including the empty string and non-ASCII text.
pub fn local_id() -> impl Strategy<Value = String> {
    prop_oneof![Just(String::new()), "[a-z][a-z0-9-]{0,23}", "\\PC{1,12}",]
}

/// Arbitrary key strings. ID derivation never parses keys.
pub fn key_strings(max: usize) -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[A-Za-z0-9+/=]{1,40}", 0..=max)
}

/// Data bytes of at most `max_len`.
pub fn data(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..=max_len)
}

/// A non-empty, ordered selection of distinct pool slots.
pub fn owners(max: usize) -> impl Strategy<Value = Vec<usize>> {
    let max = max.clamp(1, POOL_SIZE);
    prop::sample::subsequence((0..POOL_SIZE).collect::<Vec<_>>(), 1..=max).prop_shuffle()
}

/// Parameters for generating a signed root.
#[derive(Debug, Clone)]
pub struct RootParams {
    pub local_id: String,
    pub owners: Vec<usize>,
    /// Position within `owners` of the signing key.
    pub signer: usize,
    pub data: Vec<u8>,
}

impl RootParams {
    pub fn metadata(&self) -> Metadata {
        root_metadata(&self.local_id, &self.owners)
    }

    pub fn signer_slot(&self) -> usize {
        self.owners[self.signer]
    }
}

impl Arbitrary for RootParams {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (local_id(), owners(3), data(256))
            .prop_flat_map(|(local_id, owners, data)| {
                let len = owners.len();
                (Just(local_id), Just(owners), 0..len, Just(data))
            })
            .prop_map(|(local_id, owners, signer, data)| RootParams {
                local_id,
                owners,
                signer,
                data,
            })
            .boxed()
    }
}

/// Seal a root from generated parameters.
pub fn root_from_params(params: &RootParams) -> RootRecord {
    let key = &test_key(params.signer_slot()).private_key;
    meshchain_core::UnsignedRootRecord::new(params.metadata(), params.data.clone())
        .expect("generated metadata is valid")
        .seal(key)
        .expect("signer is an owner")
}
