//! # Meshchain Testkit
//!
//! Testing utilities for Meshchain.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Fixtures**: a shared pool of RSA key pairs and helpers for signed roots,
//!   updates, and rotating chains
//! - **Generators**: Proptest strategies for property-based testing
//! - **Golden vectors**: Known answers for ID derivation and canonical payloads
//!
//! ## Golden Vectors
//!
//! ```rust
//! use meshchain_testkit::vectors::verify_id_vectors;
//!
//! for (name, passed, actual) in verify_id_vectors() {
//!     assert!(passed, "{}: {}", name, actual);
//! }
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use meshchain_testkit::generators::{root_from_params, RootParams};
//!
//! proptest! {
//!     #[test]
//!     fn root_hash_is_deterministic(params: RootParams) {
//!         let a = root_from_params(&params);
//!         let b = root_from_params(&params);
//!         prop_assert_eq!(a.hash(), b.hash());
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use meshchain_core::Record;
//! use meshchain_testkit::fixtures::{signed_root, signed_update};
//!
//! let root: Arc<Record> = Arc::new(signed_root("doc", &[0], 0, b"v1").into());
//! let update = signed_update(&root, &[1], 0, b"v2");
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{
    pems, root_metadata, rotating_chain, signature_base64, signed_root, signed_update,
    signed_update_with, test_key, update_metadata, TestKey, POOL_SIZE,
};
pub use generators::{root_from_params, RootParams};
pub use vectors::{id_vectors, payload_vectors, verify_id_vectors, verify_payload_vectors};
