//! Stock ledger domain module.
//!
//! Transactions, line items, per-line validation rules and the stock
//! projection, implemented purely as deterministic domain logic (no IO, no
//! storage).

pub mod projection;
pub mod transaction;
pub mod validate;

pub use projection::{full_inventory, quantity_on_hand, StockPolicy, StockStatus};
pub use transaction::{
    LineItem, NewLine, Transaction, TransactionDraft, TransactionType, ValidatedTransaction,
};
pub use validate::check_lines;
