//! Application layer: transaction validation and the inventory service.
//!
//! Composes the catalog and ledger stores behind the operations the
//! surrounding application exposes. No IO of its own; everything goes
//! through the injected store traits.

pub mod service;
pub mod validator;


pub use service::{InventoryRow, InventoryService, StockLevel, TransactionReceipt, UpdateProduct};
pub use validator::CommitPolicy;
