use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use shopledger_core::{DomainError, DomainResult, ProductId};

use crate::revenue::SaleItem;

/// Optional, conjunctive selection over the sales/product join.
///
/// Each present field contributes exactly one predicate; an empty filter
/// selects everything. Date bounds are inclusive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesFilter {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub product_id: Option<ProductId>,
    pub category: Option<String>,
}

/// One condition contributed by a present filter field.
///
/// Stores translate these into bound query parameters; values are never
/// rendered into query text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SalesPredicate<'a> {
    /// `sale_date >= value`
    SaleDateFrom(NaiveDate),
    /// `sale_date <= value`
    SaleDateTo(NaiveDate),
    /// `product.id = value`
    Product(ProductId),
    /// `product.category = value`
    Category(&'a str),
}

impl SalesFilter {
    /// Filter on an inclusive date range plus the optional product/category scope.
    pub fn for_range(
        start_date: NaiveDate,
        end_date: NaiveDate,
        product_id: Option<ProductId>,
        category: Option<String>,
    ) -> Self {
        Self {
            start_date: Some(start_date),
            end_date: Some(end_date),
            product_id,
            category,
        }
    }

    pub fn validate(&self) -> DomainResult<()> {
        if let Some(id) = self.product_id {
            if id.get() <= 0 {
                return Err(DomainError::invalid_id("product_id filter must be positive"));
            }
        }
        Ok(())
    }

    /// Predicates for the present fields, in a stable order.
    ///
    /// An empty `category` string counts as absent.
    pub fn predicates(&self) -> Vec<SalesPredicate<'_>> {
        let mut out = Vec::with_capacity(4);
        if let Some(d) = self.start_date {
            out.push(SalesPredicate::SaleDateFrom(d));
        }
        if let Some(d) = self.end_date {
            out.push(SalesPredicate::SaleDateTo(d));
        }
        if let Some(id) = self.product_id {
            out.push(SalesPredicate::Product(id));
        }
        if let Some(c) = self.category.as_deref().filter(|c| !c.is_empty()) {
            out.push(SalesPredicate::Category(c));
        }
        out
    }

    /// Evaluate the filter against one joined sale row.
    pub fn matches(&self, item: &SaleItem) -> bool {
        self.predicates().iter().all(|p| p.matches(item))
    }
}

impl SalesPredicate<'_> {
    pub fn matches(&self, item: &SaleItem) -> bool {
        match self {
            SalesPredicate::SaleDateFrom(d) => item.sale_date >= *d,
            SalesPredicate::SaleDateTo(d) => item.sale_date <= *d,
            SalesPredicate::Product(id) => item.product_id == *id,
            SalesPredicate::Category(c) => item.category == *c,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use shopledger_core::SaleId;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn item(product: i64, category: &str, sale_date: NaiveDate) -> SaleItem {
        SaleItem {
            sale_id: SaleId::new(1),
            product_id: ProductId::new(product),
            product_name: "Widget".to_string(),
            category: category.to_string(),
            quantity: 1,
            sale_date,
            price_per_unit: Decimal::ONE,
            total_price: Decimal::ONE,
        }
    }

    #[test]
    fn empty_filter_has_no_predicates_and_matches_everything() {
        let f = SalesFilter::default();
        assert!(f.predicates().is_empty());
        assert!(f.matches(&item(1, "Beauty", date(2020, 1, 1))));
    }

    #[test]
    fn each_present_field_adds_one_predicate() {
        let f = SalesFilter {
            start_date: Some(date(2025, 1, 1)),
            end_date: None,
            product_id: Some(ProductId::new(4)),
            category: Some("Electronics".to_string()),
        };
        assert_eq!(
            f.predicates(),
            vec![
                SalesPredicate::SaleDateFrom(date(2025, 1, 1)),
                SalesPredicate::Product(ProductId::new(4)),
                SalesPredicate::Category("Electronics"),
            ]
        );
    }

    #[test]
    fn empty_category_is_ignored() {
        let f = SalesFilter {
            category: Some(String::new()),
            ..SalesFilter::default()
        };
        assert!(f.predicates().is_empty());
    }

    #[test]
    fn date_bounds_are_inclusive_and_conjunctive() {
        let f = SalesFilter::for_range(date(2025, 5, 1), date(2025, 5, 31), None, Some("Beauty".into()));
        assert!(f.matches(&item(1, "Beauty", date(2025, 5, 1))));
        assert!(f.matches(&item(1, "Beauty", date(2025, 5, 31))));
        assert!(!f.matches(&item(1, "Beauty", date(2025, 6, 1))));
        assert!(!f.matches(&item(1, "Electronics", date(2025, 5, 10))));
    }

    #[test]
    fn validate_rejects_non_positive_product() {
        let f = SalesFilter {
            product_id: Some(ProductId::new(-1)),
            ..SalesFilter::default()
        };
        assert!(matches!(f.validate(), Err(DomainError::InvalidId(_))));
    }
}
