//! Fixed catalog used by the seed maintenance binary.

use rust_decimal::Decimal;

use crate::product::NewProduct;

/// The products the seed operation repopulates the catalog with.
pub fn seed_fixtures() -> Vec<NewProduct> {
    vec![
        NewProduct::new("Echo Dot", "Electronics", Decimal::new(4999, 2), 100),
        NewProduct::new("Organic Shampoo", "Beauty", Decimal::new(1249, 2), 50),
        NewProduct::new("Gaming Mouse", "Electronics", Decimal::new(2999, 2), 80),
    ]
}
