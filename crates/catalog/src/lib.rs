//! Product catalog domain module.
//!
//! This crate contains the business rules for products, implemented purely as
//! deterministic domain logic (no IO, no HTTP, no storage).

pub mod product;

pub use product::{NewProduct, Product, ProductName, ProductPatch};
