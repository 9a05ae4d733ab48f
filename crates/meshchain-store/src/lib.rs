//! # Meshchain Store
//!
//! Storage abstraction for Meshchain records, with SQLite and in-memory
//! implementations.
//!
//! ## Overview
//!
//! The [`RecordStore`] trait is the `save` / `fetch` collaborator of the
//! record protocol: a ledger saves verified records and fetches the current
//! head of a chain to use as the parent of the next update.
//!
//! ## Key Types
//!
//! - [`RecordStore`] - The async trait for all storage operations
//! - [`SqliteStore`] - SQLite-based persistent storage
//! - [`MemoryStore`] - In-memory storage for tests
//! - [`SaveResult`] - Result of saving a record
//!
//! ## Usage
//!
//! ```rust,no_run
//! use meshchain_store::{RecordStore, SqliteStore};
//!
//! async fn example() {
//!     let store = SqliteStore::open("records.db").unwrap();
//!
//!     // let record: meshchain_core::Record = ...;
//!     // store.save(&record).await.unwrap();
//!
//!     let head = store.fetch("e7ac0786-668e-0ff0-f02b-62bd04f45ff6").await.unwrap();
//!     assert!(head.is_none());
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Idempotent saves**: saving the same record twice returns `AlreadyExists`
//! - **Chains**: a record belongs to the chain named by its root's ID
//! - **Verified loads**: SQLite rows are re-verified from the root on every load

pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{RecordStore, SaveResult};
