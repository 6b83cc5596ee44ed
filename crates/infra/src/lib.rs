//! Infrastructure layer: persistence seams and reference implementations.
//!
//! The store traits are the boundary the ledger core requires of its backing
//! store (atomic append, snapshot reads, unique name index). Only in-memory
//! implementations ship; a relational adapter would implement the same
//! traits.

pub mod store;

pub use store::{
    CatalogStore, InMemoryCatalog, InMemoryLedger, LedgerSnapshot, LedgerStore, StoreError,
};
