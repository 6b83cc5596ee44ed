use std::sync::Arc;

use thiserror::Error;

use stockbook_catalog::Product;
use stockbook_core::{ExpectedVersion, LedgerError, ProductId, TransactionId};
use stockbook_ledger::{Transaction, ValidatedTransaction};

/// Store-layer failure.
///
/// `Concurrency` is the optimistic-concurrency loss the validator retries on;
/// the rest are either caller errors or infrastructure faults.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Version expectation failed: another writer committed in between.
    #[error("concurrency conflict: {0}")]
    Concurrency(String),

    /// The unique (case-insensitive) product name index rejected the write.
    #[error("duplicate product name: {0}")]
    DuplicateName(String),

    /// An append violated a ledger invariant the store re-checks.
    #[error("invalid append: {0}")]
    InvalidAppend(String),

    /// The referenced record does not exist.
    #[error("record not found")]
    NotFound,

    /// A shared lock was poisoned by a panicking writer.
    #[error("store lock poisoned")]
    LockPoisoned,
}

impl From<StoreError> for LedgerError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Concurrency(msg) => LedgerError::Contention(msg),
            StoreError::DuplicateName(name) => LedgerError::DuplicateName(name),
            StoreError::NotFound => LedgerError::NotFound,
            StoreError::InvalidAppend(msg) => LedgerError::Store(msg),
            StoreError::LockPoisoned => LedgerError::Store("lock poisoned".to_string()),
        }
    }
}

/// Authoritative set of products with a unique, case-insensitive name index.
pub trait CatalogStore: Send + Sync {
    /// Insert a new product; fails with [`StoreError::DuplicateName`] when
    /// another product already owns the name (case-insensitively).
    fn insert(&self, product: Product) -> Result<(), StoreError>;

    /// Replace an existing product. A rename is checked against the name
    /// index excluding the product itself.
    fn update(&self, product: Product) -> Result<(), StoreError>;

    fn get(&self, product_id: ProductId) -> Result<Option<Product>, StoreError>;

    /// Active products sorted by display name.
    fn list_active(&self) -> Result<Vec<Product>, StoreError>;

    /// Whether the product exists and is active. Unknown products are not
    /// active.
    fn is_active(&self, product_id: ProductId) -> Result<bool, StoreError>;
}

/// A consistent point-in-time view of the ledger.
///
/// Validation reads and projector queries both run against a snapshot, so
/// the stock-sufficiency check and the version expectation sent to
/// [`LedgerStore::append`] describe the same state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerSnapshot {
    pub version: u64,
    pub transactions: Vec<Transaction>,
}

/// Append-only collection of committed stock transactions.
pub trait LedgerStore: Send + Sync {
    /// Capture a consistent snapshot (version + full history).
    fn snapshot(&self) -> Result<LedgerSnapshot, StoreError>;

    /// Atomically commit a validated transaction: header and all line items
    /// become visible together or not at all.
    ///
    /// The store assigns the transaction and line-item identifiers and a
    /// server-side `created_at` that is monotonically non-decreasing across
    /// insertions. The version expectation rejects appends raced by another
    /// writer ([`StoreError::Concurrency`]); a duplicate product within the
    /// batch is re-checked here as defense in depth.
    fn append(
        &self,
        validated: ValidatedTransaction,
        expected: ExpectedVersion,
    ) -> Result<Transaction, StoreError>;

    fn get(&self, transaction_id: TransactionId) -> Result<Option<Transaction>, StoreError>;

    /// All transactions, most recent first.
    fn list(&self) -> Result<Vec<Transaction>, StoreError>;
}

impl<S> CatalogStore for Arc<S>
where
    S: CatalogStore + ?Sized,
{
    fn insert(&self, product: Product) -> Result<(), StoreError> {
        (**self).insert(product)
    }

    fn update(&self, product: Product) -> Result<(), StoreError> {
        (**self).update(product)
    }

    fn get(&self, product_id: ProductId) -> Result<Option<Product>, StoreError> {
        (**self).get(product_id)
    }

    fn list_active(&self) -> Result<Vec<Product>, StoreError> {
        (**self).list_active()
    }

    fn is_active(&self, product_id: ProductId) -> Result<bool, StoreError> {
        (**self).is_active(product_id)
    }
}

impl<S> LedgerStore for Arc<S>
where
    S: LedgerStore + ?Sized,
{
    fn snapshot(&self) -> Result<LedgerSnapshot, StoreError> {
        (**self).snapshot()
    }

    fn append(
        &self,
        validated: ValidatedTransaction,
        expected: ExpectedVersion,
    ) -> Result<Transaction, StoreError> {
        (**self).append(validated, expected)
    }

    fn get(&self, transaction_id: TransactionId) -> Result<Option<Transaction>, StoreError> {
        (**self).get(transaction_id)
    }

    fn list(&self) -> Result<Vec<Transaction>, StoreError> {
        (**self).list()
    }
}
