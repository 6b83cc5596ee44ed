//! Stock projection: quantity on hand derived from the transaction history.
//!
//! The ledger is the single source of truth; stock on hand is always a fold
//! over line items, signed by the owning transaction's direction. Addition is
//! commutative, so the result is independent of replay order.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use stockbook_core::{LineItemId, ProductId};

use crate::transaction::Transaction;

/// Quantity on hand for one product: the signed sum of its line items.
///
/// `exclude` skips one specific line item during the replay; used when
/// re-validating an existing record so it does not count against itself.
/// Returns 0 for a product with no history.
pub fn quantity_on_hand(
    transactions: &[Transaction],
    product_id: ProductId,
    exclude: Option<LineItemId>,
) -> i64 {
    transactions
        .iter()
        .flat_map(|tx| {
            tx.lines()
                .iter()
                .map(move |line| (tx.tx_type(), line))
        })
        .filter(|(_, line)| line.product_id() == product_id)
        .filter(|(_, line)| Some(line.id_typed()) != exclude)
        .map(|(tx_type, line)| line.signed_quantity(tx_type))
        .sum()
}

/// Quantity on hand for every product that appears in the ledger, computed
/// in a single pass over all line items.
///
/// Products with no line items are absent from the result (their stock is 0
/// by definition). Callers materializing a sequence sort by product name.
pub fn full_inventory(transactions: &[Transaction]) -> HashMap<ProductId, i64> {
    let mut inventory: HashMap<ProductId, i64> = HashMap::new();
    for tx in transactions {
        for line in tx.lines() {
            *inventory.entry(line.product_id()).or_insert(0) += line.signed_quantity(tx.tx_type());
        }
    }
    inventory
}

/// Traffic-light classification of a stock level.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    OutOfStock,
    LowStock,
    Good,
}

/// Stock classification thresholds.
///
/// The low-stock boundary is configuration, not business law; the default
/// matches the common "10 or fewer" convention.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockPolicy {
    pub low_stock_threshold: i64,
}

impl Default for StockPolicy {
    fn default() -> Self {
        Self {
            low_stock_threshold: 10,
        }
    }
}

impl StockPolicy {
    pub fn status(&self, quantity: i64) -> StockStatus {
        if quantity <= 0 {
            StockStatus::OutOfStock
        } else if quantity <= self.low_stock_threshold {
            StockStatus::LowStock
        } else {
            StockStatus::Good
        }
    }
}
