pub mod in_memory;
pub mod traits;

pub use in_memory::{InMemoryCatalog, InMemoryLedger};
pub use traits::{CatalogStore, LedgerSnapshot, LedgerStore, StoreError};
