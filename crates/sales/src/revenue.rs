use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use shopledger_core::{DomainError, DomainResult, ProductId, SaleId};
use shopledger_products::Product;

use crate::filter::SalesFilter;
use crate::period::Period;
use crate::sale::Sale;

/// Upper bound on rows returned by a sales listing.
pub const MAX_SALE_ITEMS: usize = 100;

/// One row of the sales/product join.
///
/// Prices come from the product's *current* price; historical price changes
/// are not tracked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleItem {
    pub sale_id: SaleId,
    pub product_id: ProductId,
    pub product_name: String,
    pub category: String,
    pub quantity: i64,
    pub sale_date: NaiveDate,
    #[serde(with = "rust_decimal::serde::float")]
    pub price_per_unit: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_price: Decimal,
}

fn out_of_range() -> DomainError {
    DomainError::validation("revenue out of range")
}

impl SaleItem {
    /// Price one sale at the product's current price.
    ///
    /// Fails when `quantity * price` does not fit a `Decimal`.
    pub fn join(sale: &Sale, product: &Product) -> DomainResult<Self> {
        let total_price = Decimal::from(sale.quantity)
            .checked_mul(product.price)
            .ok_or_else(out_of_range)?;
        Ok(Self {
            sale_id: sale.id,
            product_id: product.id,
            product_name: product.name.clone(),
            category: product.category.clone(),
            quantity: sale.quantity,
            sale_date: sale.sale_date,
            price_per_unit: product.price,
            total_price,
        })
    }
}

/// Revenue for one period bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevenueSummaryItem {
    pub period: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub revenue: Decimal,
}

/// Two inclusive date ranges to compare, with an optional shared scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevenueComparisonRequest {
    pub period1_start: NaiveDate,
    pub period1_end: NaiveDate,
    pub period2_start: NaiveDate,
    pub period2_end: NaiveDate,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub product_id: Option<ProductId>,
}

impl RevenueComparisonRequest {
    pub fn first_filter(&self) -> SalesFilter {
        SalesFilter::for_range(
            self.period1_start,
            self.period1_end,
            self.product_id,
            self.category.clone(),
        )
    }

    pub fn second_filter(&self) -> SalesFilter {
        SalesFilter::for_range(
            self.period2_start,
            self.period2_end,
            self.product_id,
            self.category.clone(),
        )
    }

    pub fn validate(&self) -> DomainResult<()> {
        self.first_filter().validate()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevenueComparisonPeriod {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(with = "rust_decimal::serde::float")]
    pub revenue: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevenueComparisonResponse {
    pub period1: RevenueComparisonPeriod,
    pub period2: RevenueComparisonPeriod,
}

/// Sum `total_price` per bucket, buckets ascending.
pub fn bucket_revenue<'a>(
    items: impl IntoIterator<Item = &'a SaleItem>,
    period: Period,
) -> DomainResult<Vec<RevenueSummaryItem>> {
    let mut buckets: BTreeMap<String, Decimal> = BTreeMap::new();
    for item in items {
        let sum = buckets.entry(period.bucket_key(item.sale_date)).or_default();
        *sum = sum.checked_add(item.total_price).ok_or_else(out_of_range)?;
    }
    Ok(buckets
        .into_iter()
        .map(|(period, revenue)| RevenueSummaryItem { period, revenue })
        .collect())
}

/// Unbucketed revenue; zero when nothing matched.
pub fn total_revenue<'a>(items: impl IntoIterator<Item = &'a SaleItem>) -> DomainResult<Decimal> {
    items.into_iter().try_fold(Decimal::ZERO, |acc, i| {
        acc.checked_add(i.total_price).ok_or_else(out_of_range)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn product(id: i64, cents: i64) -> Product {
        Product {
            id: ProductId::new(id),
            name: format!("Product {id}"),
            category: "Electronics".to_string(),
            price: Decimal::new(cents, 2),
            stock: 10,
        }
    }

    fn sale(id: i64, product_id: i64, quantity: i64, sale_date: NaiveDate) -> Sale {
        Sale {
            id: SaleId::new(id),
            product_id: ProductId::new(product_id),
            quantity,
            sale_date,
        }
    }

    #[test]
    fn join_prices_quantity_times_current_price() {
        let item = SaleItem::join(&sale(1, 1, 3, date(2025, 5, 1)), &product(1, 1000)).unwrap();
        assert_eq!(item.price_per_unit, Decimal::new(1000, 2));
        assert_eq!(item.total_price, Decimal::new(3000, 2));

        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["total_price"].as_f64(), Some(30.0));
        assert_eq!(json["price_per_unit"].as_f64(), Some(10.0));
    }

    #[test]
    fn monthly_buckets_are_summed_and_ascending() {
        let p = product(1, 250);
        let items = vec![
            SaleItem::join(&sale(1, 1, 2, date(2025, 6, 2)), &p).unwrap(),
            SaleItem::join(&sale(2, 1, 1, date(2025, 5, 20)), &p).unwrap(),
            SaleItem::join(&sale(3, 1, 4, date(2025, 5, 1)), &p).unwrap(),
        ];

        let buckets = bucket_revenue(&items, Period::Monthly).unwrap();
        assert_eq!(
            buckets,
            vec![
                RevenueSummaryItem {
                    period: "2025-05".to_string(),
                    revenue: Decimal::new(1250, 2),
                },
                RevenueSummaryItem {
                    period: "2025-06".to_string(),
                    revenue: Decimal::new(500, 2),
                },
            ]
        );
    }

    #[test]
    fn no_items_means_zero_total_and_no_buckets() {
        let items: Vec<SaleItem> = Vec::new();
        assert_eq!(total_revenue(&items).unwrap(), Decimal::ZERO);
        assert!(bucket_revenue(&items, Period::Daily).unwrap().is_empty());
    }

    #[test]
    fn oversized_line_total_is_rejected() {
        let mut p = product(1, 0);
        p.price = Decimal::new(9_999_999_999_99, 2);
        let err = SaleItem::join(&sale(1, 1, i64::MAX, date(2025, 1, 1)), &p).unwrap_err();
        assert_eq!(err, DomainError::validation("revenue out of range"));
    }

    #[test]
    fn overflowing_sums_are_rejected() {
        let mut big = SaleItem::join(&sale(1, 1, 1, date(2025, 1, 1)), &product(1, 100)).unwrap();
        big.total_price = Decimal::MAX;
        let items = vec![big.clone(), SaleItem { sale_id: SaleId::new(2), ..big }];

        assert!(matches!(total_revenue(&items), Err(DomainError::Validation(_))));
        assert!(matches!(
            bucket_revenue(&items, Period::Annual),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn comparison_filters_share_scope() {
        let req = RevenueComparisonRequest {
            period1_start: date(2025, 1, 1),
            period1_end: date(2025, 1, 31),
            period2_start: date(2025, 2, 1),
            period2_end: date(2025, 2, 28),
            category: Some("Beauty".to_string()),
            product_id: None,
        };
        let f1 = req.first_filter();
        let f2 = req.second_filter();
        assert_eq!(f1.category, f2.category);
        assert_eq!(f1.start_date, Some(date(2025, 1, 1)));
        assert_eq!(f2.end_date, Some(date(2025, 2, 28)));
        assert!(req.validate().is_ok());
    }

    #[test]
    fn comparison_request_accepts_missing_optional_fields() {
        let req: RevenueComparisonRequest = serde_json::from_value(serde_json::json!({
            "period1_start": "2025-01-01",
            "period1_end": "2025-01-31",
            "period2_start": "2025-02-01",
            "period2_end": "2025-02-28"
        }))
        .unwrap();
        assert_eq!(req.category, None);
        assert_eq!(req.product_id, None);
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        fn any_sale() -> impl Strategy<Value = (i64, i64, u32)> {
            // (quantity, price cents, day offset within ~3 years)
            (1i64..50, 1i64..100_000, 0u32..1100)
        }

        proptest! {
            /// Property: for every period, bucket sums add up to the unbucketed total.
            #[test]
            fn bucket_sums_equal_total(sales in proptest::collection::vec(any_sale(), 0..80)) {
                let base = date(2023, 1, 1);
                let items: Vec<SaleItem> = sales
                    .iter()
                    .enumerate()
                    .map(|(i, (qty, cents, offset))| {
                        let d = base + chrono::Days::new(u64::from(*offset));
                        SaleItem::join(&sale(i as i64 + 1, 1, *qty, d), &product(1, *cents)).unwrap()
                    })
                    .collect();

                let total = total_revenue(&items).unwrap();
                for period in [Period::Daily, Period::Weekly, Period::Monthly, Period::Annual] {
                    let buckets = bucket_revenue(&items, period).unwrap();
                    let summed: Decimal = buckets.iter().map(|b| b.revenue).sum();
                    prop_assert_eq!(summed, total);

                    let keys: Vec<&String> = buckets.iter().map(|b| &b.period).collect();
                    let mut sorted = keys.clone();
                    sorted.sort();
                    prop_assert_eq!(keys, sorted);
                }
            }
        }
    }
}
