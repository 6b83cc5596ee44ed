use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use chrono::{DateTime, Utc};

use stockbook_catalog::Product;
use stockbook_core::{Entity, ExpectedVersion, LineItemId, ProductId, TransactionId};
use stockbook_ledger::{LineItem, Transaction, ValidatedTransaction};

use super::traits::{CatalogStore, LedgerSnapshot, LedgerStore, StoreError};

#[derive(Debug, Default)]
struct CatalogInner {
    products: HashMap<ProductId, Product>,
    /// Case-insensitive name index: dedup key -> owning product.
    names: HashMap<String, ProductId>,
}

/// In-memory product catalog.
///
/// Intended for tests/dev. Not optimized for performance.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    inner: RwLock<CatalogInner>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CatalogStore for InMemoryCatalog {
    fn insert(&self, product: Product) -> Result<(), StoreError> {
        let mut inner = self.inner.write().map_err(|_| StoreError::LockPoisoned)?;

        let key = product.name().dedup_key();
        if inner.names.contains_key(&key) {
            return Err(StoreError::DuplicateName(product.name().to_string()));
        }

        inner.names.insert(key, product.id_typed());
        inner.products.insert(product.id_typed(), product);
        Ok(())
    }

    fn update(&self, product: Product) -> Result<(), StoreError> {
        let mut inner = self.inner.write().map_err(|_| StoreError::LockPoisoned)?;

        let product_id = product.id_typed();
        let old_key = match inner.products.get(&product_id) {
            Some(existing) => existing.name().dedup_key(),
            None => return Err(StoreError::NotFound),
        };

        let new_key = product.name().dedup_key();
        if let Some(&owner) = inner.names.get(&new_key) {
            if owner != product_id {
                return Err(StoreError::DuplicateName(product.name().to_string()));
            }
        }

        inner.names.remove(&old_key);
        inner.names.insert(new_key, product_id);
        inner.products.insert(product_id, product);
        Ok(())
    }

    fn get(&self, product_id: ProductId) -> Result<Option<Product>, StoreError> {
        let inner = self.inner.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(inner.products.get(&product_id).cloned())
    }

    fn list_active(&self) -> Result<Vec<Product>, StoreError> {
        let inner = self.inner.read().map_err(|_| StoreError::LockPoisoned)?;
        let mut active: Vec<Product> = inner
            .products
            .values()
            .filter(|p| p.is_active())
            .cloned()
            .collect();
        active.sort_by(|a, b| a.name().cmp(b.name()));
        Ok(active)
    }

    fn is_active(&self, product_id: ProductId) -> Result<bool, StoreError> {
        let inner = self.inner.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(inner
            .products
            .get(&product_id)
            .is_some_and(Product::is_active))
    }
}

#[derive(Debug, Default)]
struct LedgerInner {
    version: u64,
    transactions: Vec<Transaction>,
    /// Materialized per-product counters, updated in the same critical
    /// section as the append so they can never drift from the history.
    /// Replay stays the source of truth; see [`InMemoryLedger::cached_stock`].
    stock: HashMap<ProductId, i64>,
    last_created_at: Option<DateTime<Utc>>,
}

/// In-memory append-only ledger store.
///
/// Single writer at a time (write lock); unbounded concurrent readers.
/// Intended for tests/dev. Not optimized for performance.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    inner: RwLock<LedgerInner>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Incrementally-maintained stock counters.
    ///
    /// A pure cache over the history: every append updates the counters
    /// under the same write lock that commits the transaction. Readers may
    /// use this to skip a replay, never to overrule one.
    pub fn cached_stock(&self) -> Result<HashMap<ProductId, i64>, StoreError> {
        let inner = self.inner.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(inner.stock.clone())
    }
}

impl LedgerStore for InMemoryLedger {
    fn snapshot(&self) -> Result<LedgerSnapshot, StoreError> {
        let inner = self.inner.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(LedgerSnapshot {
            version: inner.version,
            transactions: inner.transactions.clone(),
        })
    }

    fn append(
        &self,
        validated: ValidatedTransaction,
        expected: ExpectedVersion,
    ) -> Result<Transaction, StoreError> {
        let mut inner = self.inner.write().map_err(|_| StoreError::LockPoisoned)?;

        if !expected.matches(inner.version) {
            return Err(StoreError::Concurrency(format!(
                "expected {expected:?}, found {}",
                inner.version
            )));
        }

        if validated.lines.is_empty() {
            return Err(StoreError::InvalidAppend(
                "transaction has no line items".to_string(),
            ));
        }

        // (product, transaction) uniqueness, re-checked at the write boundary.
        let mut seen: HashSet<ProductId> = HashSet::new();
        for line in &validated.lines {
            if !seen.insert(line.product_id) {
                return Err(StoreError::InvalidAppend(format!(
                    "product {} appears on more than one line",
                    line.product_id
                )));
            }
        }

        // Server-assigned creation time, clamped so insertion order never
        // sees time move backwards.
        let now = Utc::now();
        let created_at = match inner.last_created_at {
            Some(last) if last > now => last,
            _ => now,
        };

        let lines: Vec<LineItem> = validated
            .lines
            .into_iter()
            .map(|line| {
                LineItem::new(
                    LineItemId::new(),
                    line.product_id,
                    line.quantity,
                    line.unit_price,
                    line.notes,
                )
            })
            .collect();

        let transaction = Transaction::new(
            TransactionId::new(),
            validated.tx_type,
            created_at,
            validated.notes,
            validated.created_by,
            lines,
        );

        for line in transaction.lines() {
            *inner.stock.entry(line.product_id()).or_insert(0) +=
                line.signed_quantity(transaction.tx_type());
        }
        inner.last_created_at = Some(created_at);
        inner.version += 1;
        inner.transactions.push(transaction.clone());

        Ok(transaction)
    }

    fn get(&self, transaction_id: TransactionId) -> Result<Option<Transaction>, StoreError> {
        let inner = self.inner.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(inner
            .transactions
            .iter()
            .find(|tx| *tx.id() == transaction_id)
            .cloned())
    }

    fn list(&self) -> Result<Vec<Transaction>, StoreError> {
        let inner = self.inner.read().map_err(|_| StoreError::LockPoisoned)?;
        // Insertion order is non-decreasing in created_at; reverse it.
        Ok(inner.transactions.iter().rev().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    use stockbook_catalog::ProductName;
    use stockbook_ledger::{full_inventory, NewLine, TransactionType};

    fn product(name: &str, active: bool) -> Product {
        Product::new(
            ProductId::new(),
            ProductName::parse(name).unwrap(),
            String::new(),
            active,
            Utc::now(),
        )
    }

    fn draft(tx_type: TransactionType, lines: Vec<NewLine>) -> ValidatedTransaction {
        ValidatedTransaction {
            tx_type,
            created_by: String::new(),
            notes: String::new(),
            lines,
            baseline_version: 0,
        }
    }

    #[test]
    fn catalog_rejects_case_insensitive_duplicates() {
        let catalog = InMemoryCatalog::new();
        catalog.insert(product("Widget", true)).unwrap();

        let err = catalog.insert(product("WIDGET", true)).unwrap_err();
        assert!(matches!(err, StoreError::DuplicateName(_)));
    }

    #[test]
    fn catalog_update_excludes_self_from_duplicate_check() {
        let catalog = InMemoryCatalog::new();
        let original = product("Widget", true);
        catalog.insert(original.clone()).unwrap();
        catalog.insert(product("Gadget", true)).unwrap();

        // Re-saving under its own name is fine.
        catalog.update(original.clone()).unwrap();

        // Renaming onto another product's name is not.
        let mut renamed = original;
        renamed.apply(
            stockbook_catalog::ProductPatch {
                name: Some(ProductName::parse("gadget").unwrap()),
                ..Default::default()
            },
            Utc::now(),
        );
        let err = catalog.update(renamed).unwrap_err();
        assert!(matches!(err, StoreError::DuplicateName(_)));
    }

    #[test]
    fn catalog_lists_active_sorted_by_name() {
        let catalog = InMemoryCatalog::new();
        catalog.insert(product("Zinc Plate", true)).unwrap();
        catalog.insert(product("Anvil", true)).unwrap();
        catalog.insert(product("Mallet", false)).unwrap();

        let names: Vec<String> = catalog
            .list_active()
            .unwrap()
            .iter()
            .map(|p| p.name().to_string())
            .collect();
        assert_eq!(names, vec!["Anvil", "Zinc Plate"]);
    }

    #[test]
    fn unknown_products_are_not_active() {
        let catalog = InMemoryCatalog::new();
        assert!(!catalog.is_active(ProductId::new()).unwrap());
    }

    #[test]
    fn append_assigns_monotonic_created_at() {
        let ledger = InMemoryLedger::new();
        let p = ProductId::new();
        for _ in 0..5 {
            ledger
                .append(
                    draft(TransactionType::In, vec![NewLine::of(p, 1)]),
                    ExpectedVersion::Any,
                )
                .unwrap();
        }

        let snapshot = ledger.snapshot().unwrap();
        let stamps: Vec<_> = snapshot.transactions.iter().map(|t| t.created_at()).collect();
        assert!(stamps.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn append_enforces_expected_version() {
        let ledger = InMemoryLedger::new();
        let p = ProductId::new();

        ledger
            .append(
                draft(TransactionType::In, vec![NewLine::of(p, 5)]),
                ExpectedVersion::Exact(0),
            )
            .unwrap();

        let err = ledger
            .append(
                draft(TransactionType::In, vec![NewLine::of(p, 5)]),
                ExpectedVersion::Exact(0),
            )
            .unwrap_err();
        assert!(matches!(err, StoreError::Concurrency(_)));

        // Nothing beyond the first commit is visible.
        assert_eq!(ledger.snapshot().unwrap().transactions.len(), 1);
    }

    #[test]
    fn append_rechecks_duplicate_products() {
        let ledger = InMemoryLedger::new();
        let p = ProductId::new();
        let err = ledger
            .append(
                draft(
                    TransactionType::In,
                    vec![NewLine::of(p, 3), NewLine::of(p, 2)],
                ),
                ExpectedVersion::Any,
            )
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidAppend(_)));
        assert!(ledger.snapshot().unwrap().transactions.is_empty());
    }

    #[test]
    fn list_is_most_recent_first() {
        let ledger = InMemoryLedger::new();
        let p = ProductId::new();
        let first = ledger
            .append(
                draft(TransactionType::In, vec![NewLine::of(p, 1)]),
                ExpectedVersion::Any,
            )
            .unwrap();
        let second = ledger
            .append(
                draft(TransactionType::In, vec![NewLine::of(p, 2)]),
                ExpectedVersion::Any,
            )
            .unwrap();

        let listed = ledger.list().unwrap();
        assert_eq!(listed[0].id_typed(), second.id_typed());
        assert_eq!(listed[1].id_typed(), first.id_typed());
    }

    #[test]
    fn cached_stock_never_drifts_from_replay() {
        let ledger = InMemoryLedger::new();
        let a = ProductId::new();
        let b = ProductId::new();

        ledger
            .append(
                draft(
                    TransactionType::In,
                    vec![
                        NewLine::priced(a, 12, dec!(4.25)),
                        NewLine::of(b, 3),
                    ],
                ),
                ExpectedVersion::Any,
            )
            .unwrap();
        ledger
            .append(
                draft(TransactionType::Out, vec![NewLine::of(a, 5)]),
                ExpectedVersion::Any,
            )
            .unwrap();

        let snapshot = ledger.snapshot().unwrap();
        assert_eq!(
            ledger.cached_stock().unwrap(),
            full_inventory(&snapshot.transactions)
        );
    }
}
