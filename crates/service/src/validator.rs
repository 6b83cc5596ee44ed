//! Transaction validation pipeline: Draft → Validated → Committed | Rejected.
//!
//! A draft passes three stages against one ledger snapshot:
//!
//! 1. the batch must not be empty
//! 2. static per-line checks (catalog membership, quantity, price,
//!    duplicate product), all rejections collected
//! 3. for OUT movements, stock sufficiency of every line against the
//!    pre-transaction baseline
//!
//! The snapshot's version travels with the validated draft; the store
//! enforces it at append time, which makes validate-then-commit serializable
//! per contended ledger. Losing that race is not a rejection - the caller
//! (see [`crate::service`]) re-snapshots and revalidates, bounded by
//! [`CommitPolicy`].

use std::collections::{HashMap, HashSet};

use stockbook_core::{LedgerError, LineRejection, ProductId, RejectReason};
use stockbook_infra::{CatalogStore, LedgerSnapshot};
use stockbook_ledger::{
    check_lines, quantity_on_hand, TransactionDraft, TransactionType, ValidatedTransaction,
};

/// How many optimistic-concurrency losses to absorb before surfacing
/// [`LedgerError::Contention`] to the caller.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct CommitPolicy {
    pub max_retries: u32,
}

impl Default for CommitPolicy {
    fn default() -> Self {
        Self { max_retries: 5 }
    }
}

/// Validate a draft against the catalog and a ledger snapshot.
///
/// On success the returned [`ValidatedTransaction`] carries the snapshot
/// version for the commit-time expectation. On failure every collected
/// rejection is returned; nothing has been written.
pub fn validate(
    draft: &TransactionDraft,
    catalog: &impl CatalogStore,
    snapshot: &LedgerSnapshot,
) -> Result<ValidatedTransaction, LedgerError> {
    if draft.lines.is_empty() {
        return Err(LedgerError::EmptyTransaction);
    }

    // Resolve catalog membership once per distinct product.
    let mut active: HashMap<ProductId, bool> = HashMap::new();
    for line in &draft.lines {
        if !active.contains_key(&line.product_id) {
            let is_active = catalog.is_active(line.product_id)?;
            active.insert(line.product_id, is_active);
        }
    }

    let rejections = check_lines(&draft.lines, |p| active.get(&p).copied().unwrap_or(false));
    if !rejections.is_empty() {
        return Err(LedgerError::rejected(rejections));
    }

    if draft.tx_type == TransactionType::Out {
        let shortfalls = check_stock(draft, snapshot);
        if !shortfalls.is_empty() {
            return Err(LedgerError::rejected(shortfalls));
        }
    }

    Ok(ValidatedTransaction {
        tx_type: draft.tx_type,
        created_by: draft.created_by.clone(),
        notes: draft.notes.clone(),
        lines: draft.lines.clone(),
        baseline_version: snapshot.version,
    })
}

/// Stock sufficiency for an OUT batch.
///
/// Each line is checked against the pre-transaction baseline independently;
/// lines do not deplete each other. The duplicate-product rule upstream
/// means a product appears at most once per batch, so a batch can never
/// overdraw a single product through repetition.
fn check_stock(draft: &TransactionDraft, snapshot: &LedgerSnapshot) -> Vec<LineRejection> {
    // One replay per distinct product, not per line.
    let products: HashSet<ProductId> = draft.lines.iter().map(|l| l.product_id).collect();
    let baseline: HashMap<ProductId, i64> = products
        .into_iter()
        .map(|p| (p, quantity_on_hand(&snapshot.transactions, p, None)))
        .collect();

    draft
        .lines
        .iter()
        .enumerate()
        .filter_map(|(idx, line)| {
            let available = baseline.get(&line.product_id).copied().unwrap_or(0);
            if available < line.quantity {
                Some(LineRejection::new(
                    idx,
                    RejectReason::InsufficientStock {
                        product_id: line.product_id,
                        available,
                        requested: line.quantity,
                    },
                ))
            } else {
                None
            }
        })
        .collect()
}
