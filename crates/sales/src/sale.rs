use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use shopledger_core::{DomainError, DomainResult, ProductId, SaleId};

/// A recorded sale. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sale {
    pub id: SaleId,
    pub product_id: ProductId,
    pub quantity: i64,
    pub sale_date: NaiveDate,
}

/// A sale to be recorded (not yet assigned an id).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSale {
    pub product_id: ProductId,
    pub quantity: i64,
    pub sale_date: NaiveDate,
}

impl NewSale {
    pub fn validate(&self) -> DomainResult<()> {
        if self.product_id.get() <= 0 {
            return Err(DomainError::invalid_id("product_id must be positive"));
        }
        if self.quantity <= 0 {
            return Err(DomainError::validation("quantity must be greater than 0"));
        }
        Ok(())
    }

    pub fn into_sale(self, id: SaleId) -> Sale {
        Sale {
            id,
            product_id: self.product_id,
            quantity: self.quantity,
            sale_date: self.sale_date,
        }
    }
}
