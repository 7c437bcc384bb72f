//! Bucketed key-blob storage for tonewiki.
//!
//! The wiki keeps all of its state in named buckets, each a flat mapping from
//! string key to byte blob. There is no schema and no transaction spanning
//! more than one key.
//!
//! # Storage Backends
//!
//! All backends implement the [`BlobStore`] trait:
//!
//! - [`InMemoryBlobStore`] -- `HashMap`-based store for tests and ephemeral servers
//! - [`FsBlobStore`] -- one directory per bucket on the local filesystem
//!
//! # Design Rules
//!
//! 1. A write replaces the whole blob; readers see the old or the new bytes, never a mix.
//! 2. Read-modify-write sequences across calls are not atomic.
//! 3. The store never interprets blob contents.
//! 4. All I/O errors are propagated, never silently ignored.

pub mod error;
pub mod fs;
pub mod memory;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use fs::FsBlobStore;
pub use memory::InMemoryBlobStore;
pub use traits::{validate_name, BlobStore};
