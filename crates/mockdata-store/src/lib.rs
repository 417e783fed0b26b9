//! mockdata-store — in-memory JSON document store for mockd.
//!
//! Holds a single JSON document loaded once at startup and serves
//! single-key reads, writes and deletes against it, plus a join of named
//! index entries against the flat record table.
//!
//! # Architecture
//!
//! The document is a `serde_json::Map`. Records live under the `"all_data"`
//! key; any other top-level key may be an index entry of the form
//! `{"cards": [id, ...], "total_count": n, "per_page_count": n}`.
//!
//! The `DataStore` is `Clone` + `Send` + `Sync` (backed by
//! `Arc<RwLock<Document>>`) and can be shared across async tasks. The
//! [`loader`] builds its initial document from a plain or zstd-compressed
//! JSON file.

pub mod error;
pub mod loader;
pub mod store;
pub mod types;

pub use error::{LoadError, StoreError, StoreResult};
pub use loader::{LoadOptions, load, load_from_reader};
pub use store::{DataStore, format_status_time};
pub use types::*;
