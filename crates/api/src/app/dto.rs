use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use shopledger_core::{DomainResult, ProductId};
use shopledger_inventory::InventoryChange;
use shopledger_products::NewProduct;
use shopledger_sales::{NewSale, Period, SalesFilter};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct RegisterProductRequest {
    pub name: String,
    pub category: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(default)]
    pub stock: i64,
}

impl From<RegisterProductRequest> for NewProduct {
    fn from(body: RegisterProductRequest) -> Self {
        NewProduct::new(body.name, body.category, body.price, body.stock)
    }
}

/// `change_type` stays a string here so an unknown value gets the same
/// `invalid_input` error body as every other rejection.
#[derive(Debug, Deserialize)]
pub struct InventoryUpdateRequest {
    pub product_id: i64,
    pub change_type: String,
    pub quantity: i64,
    #[serde(default)]
    pub reference: Option<String>,
}

impl InventoryUpdateRequest {
    pub fn into_change(self) -> DomainResult<InventoryChange> {
        InventoryChange::parse(self.product_id, &self.change_type, self.quantity, self.reference)
    }
}

#[derive(Debug, Deserialize)]
pub struct RecordSaleRequest {
    pub product_id: i64,
    pub quantity: i64,
    pub sale_date: NaiveDate,
}

impl RecordSaleRequest {
    pub fn into_sale(self) -> DomainResult<NewSale> {
        Ok(NewSale {
            product_id: ProductId::try_new(self.product_id)?,
            quantity: self.quantity,
            sale_date: self.sale_date,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct LowStockQuery {
    pub threshold: Option<i64>,
}

/// Shared query string of the sales listing and revenue endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct SalesQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub product_id: Option<i64>,
    pub category: Option<String>,
    pub period: Option<String>,
}

impl SalesQuery {
    pub fn filter(&self) -> SalesFilter {
        SalesFilter {
            start_date: self.start_date,
            end_date: self.end_date,
            product_id: self.product_id.map(ProductId::new),
            category: self.category.clone(),
        }
    }

    pub fn period(&self) -> Period {
        Period::parse_lenient(self.period.as_deref())
    }
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct CreatedResponse {
    pub message: &'static str,
    pub id: i64,
}

#[derive(Debug, Serialize)]
pub struct InventoryUpdateResponse {
    pub message: &'static str,
    pub new_stock: i64,
}

#[derive(Debug, Serialize)]
pub struct RevenueResponse {
    #[serde(with = "rust_decimal::serde::float")]
    pub revenue: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use shopledger_core::DomainError;

    #[test]
    fn unknown_change_type_is_a_validation_error() {
        let req: InventoryUpdateRequest = serde_json::from_value(serde_json::json!({
            "product_id": 1,
            "change_type": "TRANSFER",
            "quantity": 3
        }))
        .unwrap();
        assert!(matches!(req.into_change(), Err(DomainError::Validation(_))));
    }

    #[test]
    fn sales_query_maps_to_filter_and_lenient_period() {
        let q = SalesQuery {
            product_id: Some(3),
            category: Some("Beauty".into()),
            period: Some("Fortnightly".into()),
            ..SalesQuery::default()
        };
        let f = q.filter();
        assert_eq!(f.product_id, Some(ProductId::new(3)));
        assert_eq!(f.category.as_deref(), Some("Beauty"));
        assert_eq!(q.period(), Period::Daily);
    }

    #[test]
    fn revenue_serializes_as_number() {
        let body = serde_json::to_value(RevenueResponse {
            revenue: Decimal::new(7494, 2),
        })
        .unwrap();
        assert_eq!(body["revenue"].as_f64(), Some(74.94));
    }
}
