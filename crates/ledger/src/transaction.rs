use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use stockbook_core::{Entity, LineItemId, ProductId, TransactionId};

/// Direction of a stock movement.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionType {
    /// Stock in: line quantities add to stock on hand.
    In,
    /// Stock out: line quantities subtract from stock on hand.
    Out,
}

impl TransactionType {
    /// Sign applied to line quantities when deriving stock on hand.
    pub fn sign(self) -> i64 {
        match self {
            TransactionType::In => 1,
            TransactionType::Out => -1,
        }
    }
}

impl core::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            TransactionType::In => f.write_str("IN"),
            TransactionType::Out => f.write_str("OUT"),
        }
    }
}

/// A committed product-quantity entry within a transaction.
///
/// Invariants (enforced before commit, immutable after): `quantity > 0`,
/// `unit_price`, when present, is non-negative, and the owning transaction
/// holds at most one line per product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    id: LineItemId,
    product_id: ProductId,
    quantity: i64,
    unit_price: Option<Decimal>,
    notes: String,
}

impl LineItem {
    pub fn new(
        id: LineItemId,
        product_id: ProductId,
        quantity: i64,
        unit_price: Option<Decimal>,
        notes: String,
    ) -> Self {
        Self {
            id,
            product_id,
            quantity,
            unit_price,
            notes,
        }
    }

    pub fn id_typed(&self) -> LineItemId {
        self.id
    }

    pub fn product_id(&self) -> ProductId {
        self.product_id
    }

    pub fn quantity(&self) -> i64 {
        self.quantity
    }

    pub fn unit_price(&self) -> Option<Decimal> {
        self.unit_price
    }

    pub fn notes(&self) -> &str {
        &self.notes
    }

    /// `quantity × unit_price`, when a price was recorded.
    pub fn total_value(&self) -> Option<Decimal> {
        self.unit_price
            .map(|price| price * Decimal::from(self.quantity))
    }

    /// Quantity signed by the owning transaction's direction.
    pub fn signed_quantity(&self, tx_type: TransactionType) -> i64 {
        tx_type.sign() * self.quantity
    }
}

impl Entity for LineItem {
    type Id = LineItemId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// A committed stock movement: header plus its owned line items.
///
/// Immutable once committed; the ledger offers no update path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    id: TransactionId,
    tx_type: TransactionType,
    created_at: DateTime<Utc>,
    notes: String,
    created_by: String,
    lines: Vec<LineItem>,
}

impl Transaction {
    pub fn new(
        id: TransactionId,
        tx_type: TransactionType,
        created_at: DateTime<Utc>,
        notes: String,
        created_by: String,
        lines: Vec<LineItem>,
    ) -> Self {
        Self {
            id,
            tx_type,
            created_at,
            notes,
            created_by,
            lines,
        }
    }

    pub fn id_typed(&self) -> TransactionId {
        self.id
    }

    pub fn tx_type(&self) -> TransactionType {
        self.tx_type
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn notes(&self) -> &str {
        &self.notes
    }

    pub fn created_by(&self) -> &str {
        &self.created_by
    }

    pub fn lines(&self) -> &[LineItem] {
        &self.lines
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn total_quantity(&self) -> i64 {
        self.lines.iter().map(LineItem::quantity).sum()
    }
}

impl Entity for Transaction {
    type Id = TransactionId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// A candidate line as submitted, not yet validated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLine {
    pub product_id: ProductId,
    pub quantity: i64,
    pub unit_price: Option<Decimal>,
    pub notes: String,
}

impl NewLine {
    pub fn of(product_id: ProductId, quantity: i64) -> Self {
        Self {
            product_id,
            quantity,
            unit_price: None,
            notes: String::new(),
        }
    }

    pub fn priced(product_id: ProductId, quantity: i64, unit_price: Decimal) -> Self {
        Self {
            product_id,
            quantity,
            unit_price: Some(unit_price),
            notes: String::new(),
        }
    }
}

/// A candidate transaction as submitted (validator input).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionDraft {
    pub tx_type: TransactionType,
    pub created_by: String,
    pub notes: String,
    pub lines: Vec<NewLine>,
}

impl TransactionDraft {
    pub fn new(tx_type: TransactionType, lines: Vec<NewLine>) -> Self {
        Self {
            tx_type,
            created_by: String::new(),
            notes: String::new(),
            lines,
        }
    }
}

/// A draft that passed every validation stage against a ledger snapshot.
///
/// Carries the snapshot version the stock checks were made against; the store
/// enforces it at append time so the checks stay serializable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedTransaction {
    pub tx_type: TransactionType,
    pub created_by: String,
    pub notes: String,
    pub lines: Vec<NewLine>,
    pub baseline_version: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn test_time() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-01-15T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn line(quantity: i64, unit_price: Option<Decimal>) -> LineItem {
        LineItem::new(
            LineItemId::new(),
            ProductId::new(),
            quantity,
            unit_price,
            String::new(),
        )
    }

    #[test]
    fn signed_quantity_follows_direction() {
        let item = line(4, None);
        assert_eq!(item.signed_quantity(TransactionType::In), 4);
        assert_eq!(item.signed_quantity(TransactionType::Out), -4);
    }

    #[test]
    fn total_value_requires_a_price() {
        assert_eq!(line(3, None).total_value(), None);
        assert_eq!(line(3, Some(dec!(2.50))).total_value(), Some(dec!(7.50)));
    }

    #[test]
    fn transaction_summaries() {
        let tx = Transaction::new(
            TransactionId::new(),
            TransactionType::In,
            test_time(),
            String::new(),
            "warehouse".to_string(),
            vec![line(3, None), line(5, Some(dec!(1.00)))],
        );
        assert_eq!(tx.line_count(), 2);
        assert_eq!(tx.total_quantity(), 8);
    }

    #[test]
    fn transaction_type_serializes_uppercase() {
        assert_eq!(
            serde_json::to_string(&TransactionType::In).unwrap(),
            "\"IN\""
        );
        assert_eq!(
            serde_json::to_string(&TransactionType::Out).unwrap(),
            "\"OUT\""
        );
    }
}
