//! Per-line static validation of a candidate batch.
//!
//! Pure decision logic: the caller supplies the active-catalog membership
//! check, this module reports every rejection. Stock sufficiency is a
//! separate stage (it needs a ledger snapshot, see [`crate::projection`]).

use std::collections::HashSet;

use rust_decimal::Decimal;
use stockbook_core::{LineRejection, ProductId, RejectReason};

use crate::transaction::NewLine;

/// Run the static checks over a batch of candidate lines, in submission
/// order, collecting every rejection rather than stopping at the first.
///
/// Checks per line, first failure wins for that line:
/// 1. product must be in the active catalog
/// 2. quantity must be > 0
/// 3. unit price, when present, must be >= 0
/// 4. the product must not have appeared on an earlier line
///
/// An empty batch is the caller's concern (`LedgerError::EmptyTransaction`);
/// this function only judges lines.
pub fn check_lines(
    lines: &[NewLine],
    is_active: impl Fn(ProductId) -> bool,
) -> Vec<LineRejection> {
    let mut rejections = Vec::new();
    let mut seen: HashSet<ProductId> = HashSet::new();

    for (idx, line) in lines.iter().enumerate() {
        let reason = if !is_active(line.product_id) {
            Some(RejectReason::InactiveOrUnknownProduct(line.product_id))
        } else if line.quantity <= 0 {
            Some(RejectReason::InvalidQuantity(line.quantity))
        } else if let Some(price) = line.unit_price.filter(|p| *p < Decimal::ZERO) {
            Some(RejectReason::InvalidPrice(price))
        } else if seen.contains(&line.product_id) {
            Some(RejectReason::DuplicateProductInTransaction(line.product_id))
        } else {
            None
        };

        if let Some(reason) = reason {
            rejections.push(LineRejection::new(idx, reason));
        }

        // Track the product even when the line failed another check, so a
        // later repeat is still reported as a duplicate (first seen wins).
        seen.insert(line.product_id);
    }

    rejections
}
