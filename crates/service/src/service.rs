use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use stockbook_catalog::{NewProduct, Product, ProductName, ProductPatch};
use stockbook_core::{
    ExpectedVersion, LedgerError, LedgerResult, ProductId, TransactionId,
};
use stockbook_infra::{CatalogStore, LedgerStore, StoreError};
use stockbook_ledger::{
    full_inventory, quantity_on_hand, StockPolicy, StockStatus, Transaction, TransactionDraft,
};

use crate::validator::{self, CommitPolicy};

/// Summary returned after a successful commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionReceipt {
    pub transaction_id: TransactionId,
    pub line_count: usize,
    pub total_quantity: i64,
}

/// Stock level plus its traffic-light classification.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockLevel {
    pub quantity: i64,
    pub status: StockStatus,
}

/// One row of the inventory report, sorted by product name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryRow {
    pub product: Product,
    pub quantity: i64,
    pub status: StockStatus,
}

/// Partial product update; `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateProduct {
    pub name: Option<String>,
    pub description: Option<String>,
    pub active: Option<bool>,
}

/// The ledger core's application surface.
///
/// Generic over the store seams so tests run against the in-memory
/// implementations and a relational adapter can slot in unchanged.
#[derive(Debug)]
pub struct InventoryService<C, L> {
    catalog: C,
    ledger: L,
    stock_policy: StockPolicy,
    commit_policy: CommitPolicy,
}

impl<C, L> InventoryService<C, L> {
    pub fn new(catalog: C, ledger: L) -> Self {
        Self {
            catalog,
            ledger,
            stock_policy: StockPolicy::default(),
            commit_policy: CommitPolicy::default(),
        }
    }

    pub fn with_policies(
        catalog: C,
        ledger: L,
        stock_policy: StockPolicy,
        commit_policy: CommitPolicy,
    ) -> Self {
        Self {
            catalog,
            ledger,
            stock_policy,
            commit_policy,
        }
    }

    pub fn stock_policy(&self) -> StockPolicy {
        self.stock_policy
    }
}

impl<C, L> InventoryService<C, L>
where
    C: CatalogStore,
    L: LedgerStore,
{
    /// Create a product with a normalized, case-insensitively unique name.
    pub fn create_product(&self, input: NewProduct) -> LedgerResult<Product> {
        let name = ProductName::parse(&input.name)?;
        let product = Product::new(
            ProductId::new(),
            name,
            input.description,
            input.active,
            Utc::now(),
        );
        self.catalog.insert(product.clone())?;
        info!(product_id = %product.id_typed(), name = %product.name(), "product created");
        Ok(product)
    }

    /// Update a product. A rename is re-normalized and checked against the
    /// catalog excluding the product itself. Deactivation keeps history.
    pub fn update_product(&self, product_id: ProductId, input: UpdateProduct) -> LedgerResult<Product> {
        let mut product = self.catalog.get(product_id)?.ok_or(LedgerError::NotFound)?;

        let name = input.name.as_deref().map(ProductName::parse).transpose()?;
        product.apply(
            ProductPatch {
                name,
                description: input.description,
                active: input.active,
            },
            Utc::now(),
        );

        self.catalog.update(product.clone())?;
        info!(product_id = %product.id_typed(), name = %product.name(), "product updated");
        Ok(product)
    }

    /// Active products sorted by display name.
    pub fn list_active_products(&self) -> LedgerResult<Vec<Product>> {
        Ok(self.catalog.list_active()?)
    }

    /// Validate and atomically commit a stock movement.
    ///
    /// Validation runs against a ledger snapshot; the commit carries that
    /// snapshot's version so a concurrent writer forces a revalidation
    /// instead of a silent overdraw. After `CommitPolicy::max_retries`
    /// losses the retriable [`LedgerError::Contention`] is surfaced.
    pub fn create_transaction(&self, draft: TransactionDraft) -> LedgerResult<TransactionReceipt> {
        let mut attempts = 0u32;
        loop {
            let snapshot = self.ledger.snapshot()?;
            let validated = match validator::validate(&draft, &self.catalog, &snapshot) {
                Ok(validated) => validated,
                Err(err) => {
                    warn!(tx_type = %draft.tx_type, error = %err, "transaction rejected");
                    return Err(err);
                }
            };

            let expected = ExpectedVersion::Exact(validated.baseline_version);
            match self.ledger.append(validated, expected) {
                Ok(transaction) => {
                    info!(
                        transaction_id = %transaction.id_typed(),
                        tx_type = %transaction.tx_type(),
                        lines = transaction.line_count(),
                        total_quantity = transaction.total_quantity(),
                        "transaction committed"
                    );
                    return Ok(TransactionReceipt {
                        transaction_id: transaction.id_typed(),
                        line_count: transaction.line_count(),
                        total_quantity: transaction.total_quantity(),
                    });
                }
                Err(StoreError::Concurrency(msg)) => {
                    attempts += 1;
                    if attempts > self.commit_policy.max_retries {
                        return Err(LedgerError::contention(format!(
                            "gave up after {attempts} attempts: {msg}"
                        )));
                    }
                    debug!(attempt = attempts, "commit raced, revalidating");
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// Fetch one committed transaction with its lines.
    pub fn transaction(&self, transaction_id: TransactionId) -> LedgerResult<Transaction> {
        self.ledger.get(transaction_id)?.ok_or(LedgerError::NotFound)
    }

    /// All transactions, most recent first.
    pub fn list_transactions(&self) -> LedgerResult<Vec<Transaction>> {
        Ok(self.ledger.list()?)
    }

    /// Current stock per product with status, sorted by product name.
    ///
    /// One pass over the ledger; products that never appeared on a line are
    /// omitted (their stock is 0 by definition).
    pub fn inventory(&self) -> LedgerResult<Vec<InventoryRow>> {
        let snapshot = self.ledger.snapshot()?;
        let quantities = full_inventory(&snapshot.transactions);

        let mut rows = Vec::with_capacity(quantities.len());
        for (product_id, quantity) in quantities {
            // Every ledgered product exists in the catalog; skip anything a
            // less careful store might hand back.
            if let Some(product) = self.catalog.get(product_id)? {
                rows.push(InventoryRow {
                    product,
                    quantity,
                    status: self.stock_policy.status(quantity),
                });
            }
        }
        rows.sort_by(|a, b| a.product.name().cmp(b.product.name()));
        Ok(rows)
    }

    /// Stock level for one product; `NotFound` only when the product is
    /// absent from the catalog (inactive products still report stock).
    pub fn product_stock(&self, product_id: ProductId) -> LedgerResult<StockLevel> {
        if self.catalog.get(product_id)?.is_none() {
            return Err(LedgerError::NotFound);
        }
        let snapshot = self.ledger.snapshot()?;
        let quantity = quantity_on_hand(&snapshot.transactions, product_id, None);
        Ok(StockLevel {
            quantity,
            status: self.stock_policy.status(quantity),
        })
    }
}
