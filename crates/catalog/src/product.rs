use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockbook_core::{Entity, LedgerError, LedgerResult, ProductId, ValueObject};

/// Normalized product display name.
///
/// Normalization: trim surrounding whitespace, then title-case (the first
/// letter of each alphabetic run is uppercased, the rest lowered). Names
/// shorter than two characters after trimming are rejected. Uniqueness is
/// case-insensitive; [`ProductName::dedup_key`] is the comparison key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductName(String);

impl ProductName {
    pub fn parse(raw: &str) -> LedgerResult<Self> {
        let trimmed = raw.trim();
        if trimmed.chars().count() < 2 {
            return Err(LedgerError::invalid_name(
                "product name must be at least 2 characters long",
            ));
        }
        Ok(Self(title_case(trimmed)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-insensitive key used to enforce name uniqueness.
    pub fn dedup_key(&self) -> String {
        self.0.to_lowercase()
    }
}

impl ValueObject for ProductName {}

impl core::fmt::Display for ProductName {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Uppercase the first letter of each alphabetic run, lowercase the rest.
/// Non-alphabetic characters pass through and restart a run.
fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_word = false;
    for ch in s.chars() {
        if ch.is_alphabetic() {
            if in_word {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(ch);
            in_word = false;
        }
    }
    out
}

/// Entity: catalog product.
///
/// Deactivation flips `active` off; it never deletes the product or its
/// transaction history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    id: ProductId,
    name: ProductName,
    description: String,
    active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Product {
    pub fn new(
        id: ProductId,
        name: ProductName,
        description: String,
        active: bool,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name,
            description,
            active,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn id_typed(&self) -> ProductId {
        self.id
    }

    pub fn name(&self) -> &ProductName {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Apply a patch, bumping `updated_at`. Uniqueness of a renamed product
    /// against the rest of the catalog is the store's responsibility.
    pub fn apply(&mut self, patch: ProductPatch, now: DateTime<Utc>) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(active) = patch.active {
            self.active = active;
        }
        self.updated_at = now;
    }
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Input for product creation (name still raw; parsed by the caller).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub active: bool,
}

impl NewProduct {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            active: true,
        }
    }
}

/// Partial update for an existing product. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductPatch {
    pub name: Option<ProductName>,
    pub description: Option<String>,
    pub active: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_time() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-01-15T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn parse_trims_and_title_cases() {
        let name = ProductName::parse("  widget ").unwrap();
        assert_eq!(name.as_str(), "Widget");
    }

    #[test]
    fn parse_title_cases_each_word() {
        let name = ProductName::parse("blue STEEL bolt").unwrap();
        assert_eq!(name.as_str(), "Blue Steel Bolt");
    }

    #[test]
    fn parse_restarts_words_at_non_alphabetics() {
        let name = ProductName::parse("m8-hex nut").unwrap();
        assert_eq!(name.as_str(), "M8-Hex Nut");
    }

    #[test]
    fn parse_rejects_short_names() {
        assert!(matches!(
            ProductName::parse(" x "),
            Err(LedgerError::InvalidName(_))
        ));
        assert!(matches!(
            ProductName::parse(""),
            Err(LedgerError::InvalidName(_))
        ));
    }

    #[test]
    fn dedup_key_is_case_insensitive() {
        let a = ProductName::parse("Widget").unwrap();
        let b = ProductName::parse("WIDGET").unwrap();
        assert_eq!(a.dedup_key(), b.dedup_key());
    }

    #[test]
    fn patch_bumps_updated_at_only() {
        let id = ProductId::new();
        let name = ProductName::parse("Widget").unwrap();
        let mut product = Product::new(id, name, String::new(), true, test_time());

        let later = test_time() + chrono::Duration::minutes(5);
        product.apply(
            ProductPatch {
                active: Some(false),
                ..ProductPatch::default()
            },
            later,
        );

        assert!(!product.is_active());
        assert_eq!(product.created_at(), test_time());
        assert_eq!(product.updated_at(), later);
        assert_eq!(product.name().as_str(), "Widget");
    }

    #[cfg(test)]
    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: normalization is idempotent (parsing an already
            /// normalized name yields the same name).
            #[test]
            fn normalization_is_idempotent(raw in "[A-Za-z0-9 _-]{2,40}") {
                if let Ok(name) = ProductName::parse(&raw) {
                    let again = ProductName::parse(name.as_str()).unwrap();
                    prop_assert_eq!(name, again);
                }
            }

            /// Property: case variants of the same name share a dedup key.
            #[test]
            fn dedup_key_ignores_case(raw in "[A-Za-z]{2}[A-Za-z ]{0,28}") {
                let lower = ProductName::parse(&raw.to_lowercase()).unwrap();
                let upper = ProductName::parse(&raw.to_uppercase()).unwrap();
                prop_assert_eq!(lower.dedup_key(), upper.dedup_key());
            }
        }
    }
}
