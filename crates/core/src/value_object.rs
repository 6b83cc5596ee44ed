//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects are **immutable** and **compared by value** - two instances
/// with the same attributes are equal. `ProductName` is a value object; a
/// `Product` (which has an id) is an entity.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
