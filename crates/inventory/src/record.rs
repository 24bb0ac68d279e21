use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use shopledger_core::{DomainError, DomainResult, MovementId, ProductId};

/// Threshold used by the low-stock query when the caller supplies none.
pub const DEFAULT_LOW_STOCK_THRESHOLD: i64 = 5;

/// Kind of inventory movement.
///
/// Wire/store spelling is upper case (`IN`, `OUT`, `ADJUSTMENT`). Adjustments add
/// to stock exactly like `IN`; they exist to tag corrections in the history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChangeType {
    #[serde(rename = "IN")]
    In,
    #[serde(rename = "OUT")]
    Out,
    #[serde(rename = "ADJUSTMENT")]
    Adjustment,
}

impl ChangeType {
    pub const ALL: [ChangeType; 3] = [ChangeType::In, ChangeType::Out, ChangeType::Adjustment];

    pub fn as_str(self) -> &'static str {
        match self {
            ChangeType::In => "IN",
            ChangeType::Out => "OUT",
            ChangeType::Adjustment => "ADJUSTMENT",
        }
    }
}

impl core::fmt::Display for ChangeType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChangeType {
    type Err = DomainError;

    /// Strict: only the exact upper-case spellings are accepted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "IN" => Ok(ChangeType::In),
            "OUT" => Ok(ChangeType::Out),
            "ADJUSTMENT" => Ok(ChangeType::Adjustment),
            other => Err(DomainError::validation(format!(
                "change_type must be one of IN, OUT, ADJUSTMENT (got '{other}')"
            ))),
        }
    }
}

/// A request to move stock for one product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryChange {
    pub product_id: ProductId,
    pub change_type: ChangeType,
    pub quantity: i64,
    pub reference: Option<String>,
}

impl InventoryChange {
    /// Build a change, rejecting non-positive quantities.
    pub fn new(
        product_id: ProductId,
        change_type: ChangeType,
        quantity: i64,
        reference: Option<String>,
    ) -> DomainResult<Self> {
        let change = Self {
            product_id,
            change_type,
            quantity,
            reference,
        };
        change.validate()?;
        Ok(change)
    }

    /// Build a change from loosely typed boundary input.
    pub fn parse(
        product_id: i64,
        change_type: &str,
        quantity: i64,
        reference: Option<String>,
    ) -> DomainResult<Self> {
        let product_id = ProductId::try_new(product_id)?;
        let change_type = change_type.parse()?;
        Self::new(product_id, change_type, quantity, reference)
    }

    pub fn validate(&self) -> DomainResult<()> {
        if self.quantity <= 0 {
            return Err(DomainError::validation("quantity must be greater than 0"));
        }
        Ok(())
    }
}

/// One row of the ledger table.
///
/// `change_type == None` marks the product's snapshot row; every other row is an
/// immutable movement whose `stock` is the resulting level at `change_date`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryRecord {
    pub id: MovementId,
    pub product_id: ProductId,
    pub change_type: Option<ChangeType>,
    pub quantity: i64,
    pub stock: i64,
    pub change_date: DateTime<Utc>,
    pub reference: Option<String>,
}

impl InventoryRecord {
    pub fn is_snapshot(&self) -> bool {
        self.change_type.is_none()
    }

    /// Current-stock view of a snapshot row.
    pub fn to_status(&self) -> InventoryStatus {
        InventoryStatus {
            product_id: self.product_id,
            stock: self.stock,
            last_updated: self.change_date,
        }
    }
}

/// Current stock of one product as seen through its snapshot row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryStatus {
    pub product_id: ProductId,
    pub stock: i64,
    pub last_updated: DateTime<Utc>,
}
