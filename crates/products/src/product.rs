use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use shopledger_core::{DomainError, DomainResult, ProductId};

/// Prices are stored as `NUMERIC(12, 2)`.
const PRICE_SCALE: u32 = 2;
// 10^10
const MAX_PRICE_EXCLUSIVE: Decimal = Decimal::from_parts(1_410_065_408, 2, 0, false, 0);

/// A registered catalog product.
///
/// `stock` is the catalog's denormalized counter: it is set at registration and
/// decremented by sale recording. It is independent of the inventory ledger's
/// snapshot, which is the authority for stock availability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub category: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub stock: i64,
}

/// Registration payload for a product that has not been assigned an id yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub category: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub stock: i64,
}

impl NewProduct {
    pub fn new(
        name: impl Into<String>,
        category: impl Into<String>,
        price: Decimal,
        stock: i64,
    ) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
            price,
            stock,
        }
    }

    /// Check registration rules. Names are stored as given (no trimming).
    pub fn validate(&self) -> DomainResult<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        if self.category.trim().is_empty() {
            return Err(DomainError::validation("category cannot be empty"));
        }
        if self.price < Decimal::ZERO {
            return Err(DomainError::validation("price cannot be negative"));
        }
        if self.price >= MAX_PRICE_EXCLUSIVE {
            return Err(DomainError::validation("price must be below 10000000000"));
        }
        if self.price.normalize().scale() > PRICE_SCALE {
            return Err(DomainError::validation("price cannot have more than 2 decimal places"));
        }
        if self.stock < 0 {
            return Err(DomainError::validation("stock cannot be negative"));
        }
        Ok(())
    }

    /// Attach the store-assigned identifier.
    pub fn into_product(self, id: ProductId) -> Product {
        Product {
            id,
            name: self.name,
            category: self.category,
            price: self.price,
            stock: self.stock,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn valid() -> NewProduct {
        NewProduct::new("Echo Dot", "Electronics", Decimal::new(4999, 2), 100)
    }

    #[test]
    fn valid_product_passes() {
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn zero_price_is_allowed() {
        let p = NewProduct {
            price: Decimal::ZERO,
            ..valid()
        };
        assert!(p.validate().is_ok());
    }

    #[test]
    fn rejects_blank_name_and_category() {
        let blank_name = NewProduct {
            name: "   ".to_string(),
            ..valid()
        };
        assert!(matches!(blank_name.validate(), Err(DomainError::Validation(_))));

        let blank_category = NewProduct {
            category: String::new(),
            ..valid()
        };
        assert!(matches!(blank_category.validate(), Err(DomainError::Validation(_))));
    }

    #[test]
    fn rejects_negative_price_and_stock() {
        let negative_price = NewProduct {
            price: Decimal::new(-1, 2),
            ..valid()
        };
        assert!(matches!(negative_price.validate(), Err(DomainError::Validation(_))));

        let negative_stock = NewProduct {
            stock: -1,
            ..valid()
        };
        assert!(matches!(negative_stock.validate(), Err(DomainError::Validation(_))));
    }

    #[test]
    fn price_must_fit_two_decimal_places_and_ten_integer_digits() {
        let largest = NewProduct {
            price: Decimal::new(999_999_999_999, 2),
            ..valid()
        };
        assert!(largest.validate().is_ok());

        let too_large = NewProduct {
            price: Decimal::new(10_000_000_000, 0),
            ..valid()
        };
        assert!(matches!(too_large.validate(), Err(DomainError::Validation(_))));

        let too_precise = NewProduct {
            price: Decimal::new(12_345, 3),
            ..valid()
        };
        assert!(matches!(too_precise.validate(), Err(DomainError::Validation(_))));

        // Trailing zeros do not count as precision.
        let padded = NewProduct {
            price: Decimal::new(12_500, 3),
            ..valid()
        };
        assert!(padded.validate().is_ok());
    }

    #[test]
    fn into_product_keeps_fields() {
        let product = valid().into_product(ProductId::new(3));
        assert_eq!(product.id, ProductId::new(3));
        assert_eq!(product.name, "Echo Dot");
        assert_eq!(product.price, Decimal::new(4999, 2));
        assert_eq!(product.stock, 100);
    }

    #[test]
    fn price_serializes_as_json_number() {
        let product = valid().into_product(ProductId::new(1));
        let json = serde_json::to_value(&product).unwrap();
        assert_eq!(json["price"].as_f64(), Some(49.99));
        assert_eq!(json["id"], 1);
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: any non-negative price and stock with non-blank text validates.
            #[test]
            fn non_negative_values_validate(
                name in "[A-Za-z][A-Za-z0-9 ]{0,40}",
                category in "[A-Za-z]{1,20}",
                cents in 0i64..10_000_000,
                stock in 0i64..1_000_000,
            ) {
                let p = NewProduct::new(name, category, Decimal::new(cents, 2), stock);
                prop_assert!(p.validate().is_ok());
            }

            /// Property: a negative stock is always rejected.
            #[test]
            fn negative_stock_rejected(stock in i64::MIN..0) {
                let p = NewProduct::new("Widget", "Tools", Decimal::ONE, stock);
                prop_assert!(p.validate().is_err());
            }
        }
    }
}
