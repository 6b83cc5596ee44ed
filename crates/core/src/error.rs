//! Domain error model.
//!
//! Keep this focused on deterministic, business/domain failures (validation,
//! invariants, conflicts). Infrastructure concerns are wrapped, not modelled.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::id::ProductId;

/// Result type used across the ledger core.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Why a single candidate line was rejected during transaction validation.
///
/// These are deterministic: retrying the same input yields the same reason.
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    /// The referenced product is missing from the catalog or deactivated.
    #[error("product {0} is not in the active catalog")]
    InactiveOrUnknownProduct(ProductId),

    /// Quantity must be a positive integer.
    #[error("quantity must be greater than 0 (got {0})")]
    InvalidQuantity(i64),

    /// Unit price, when present, must not be negative.
    #[error("unit price cannot be negative (got {0})")]
    InvalidPrice(Decimal),

    /// The product already appeared on an earlier line of the same batch.
    #[error("product {0} appears more than once in the transaction")]
    DuplicateProductInTransaction(ProductId),

    /// An OUT line asked for more than the pre-transaction baseline holds.
    #[error("insufficient stock for product {product_id}: available {available}, requested {requested}")]
    InsufficientStock {
        product_id: ProductId,
        available: i64,
        requested: i64,
    },
}

/// A rejection tied to the submission-order index of the offending line.
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("line {line}: {reason}")]
pub struct LineRejection {
    pub line: usize,
    pub reason: RejectReason,
}

impl LineRejection {
    pub fn new(line: usize, reason: RejectReason) -> Self {
        Self { line, reason }
    }
}

/// Ledger-core error.
///
/// Every variant except `Contention` is terminal for the given input: the
/// caller must correct the request before retrying. `Contention` signals an
/// optimistic-concurrency loss and is safe to retry as-is.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// A product name failed normalization rules.
    #[error("invalid product name: {0}")]
    InvalidName(String),

    /// A product with the same (case-insensitive) name already exists.
    #[error("a product named '{0}' already exists")]
    DuplicateName(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// The candidate batch contained no lines.
    #[error("transaction must contain at least one line item")]
    EmptyTransaction,

    /// One or more candidate lines failed validation; the whole batch is
    /// rejected and nothing was persisted.
    #[error("transaction rejected ({} line(s))", .0.len())]
    Rejected(Vec<LineRejection>),

    /// Lost the optimistic-concurrency race too many times. Retriable.
    #[error("transient contention: {0}")]
    Contention(String),

    /// A requested resource was not found.
    #[error("not found")]
    NotFound,

    /// Infrastructure fault surfaced from the backing store.
    #[error("store failure: {0}")]
    Store(String),
}

impl LedgerError {
    pub fn invalid_name(msg: impl Into<String>) -> Self {
        Self::InvalidName(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn contention(msg: impl Into<String>) -> Self {
        Self::Contention(msg.into())
    }

    pub fn rejected(rejections: Vec<LineRejection>) -> Self {
        Self::Rejected(rejections)
    }

    /// Whether the caller may retry the same input unchanged.
    pub fn is_retriable(&self) -> bool {
        matches!(self, Self::Contention(_))
    }
}
