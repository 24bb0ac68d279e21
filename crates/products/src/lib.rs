//! Products domain module.
//!
//! Catalog entries and the validation rules applied when they are registered,
//! implemented purely as deterministic domain logic (no IO, no HTTP, no storage).

pub mod fixtures;
pub mod product;

pub use fixtures::seed_fixtures;
pub use product::{NewProduct, Product};
