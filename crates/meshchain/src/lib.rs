//! # Meshchain
//!
//! Self-certifying records whose authority moves forward through signed
//! updates.
//!
//! ## Overview
//!
//! - **Root records**: carry an ID derived from their own public keys and a
//!   signature by one of them
//! - **Update records**: signed by a key of the record they replace, and name
//!   the keys allowed to sign the next update
//! - **Ledger**: verifies submissions and keeps each chain's history in a
//!   [`RecordStore`](store::RecordStore)
//!
//! ## Usage
//!
//! ```rust,no_run
//! use meshchain::{Ledger, LedgerConfig, Metadata};
//! use meshchain::store::SqliteStore;
//!
//! async fn example(pem: String, signature_base64: &str) {
//!     let store = SqliteStore::open("records.db").unwrap();
//!     let ledger = Ledger::new(store, LedgerConfig::default());
//!
//!     let metadata = Metadata::derive("my-document", vec![pem]);
//!     let id = metadata.id.clone();
//!     ledger
//!         .submit_root(metadata, &b"first version"[..], signature_base64)
//!         .await
//!         .unwrap();
//!
//!     let head = ledger.get(&id).await.unwrap();
//!     assert!(head.is_some());
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `meshchain::core` - Record types, IDs, canonical hashing, and the wire form
//! - `meshchain::store` - Storage abstraction and SQLite

pub mod error;
pub mod ledger;

pub use meshchain_core as core;
pub use meshchain_store as store;

pub use error::{LedgerError, Result};
pub use ledger::{Ledger, LedgerConfig, SubmitResult};

pub use meshchain_core::{
    generate_id, Metadata, Record, RecordError, RecordKind, RootRecord, Sha256Hash, Signature,
    UnsignedRootRecord, UnsignedUpdateRecord, UpdateRecord, WireRecord,
};
