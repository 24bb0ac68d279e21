//! Inventory ledger engine.
//!
//! ```text
//! handler
//!   ↓
//! InventoryLedger (input checks, deadline)
//!   ↓
//! LedgerStore::apply_change (one transaction, serialized per product)
//!   ↓
//! new stock level | InsufficientStock | InvalidInput
//! ```

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, instrument};

use shopledger_core::ProductId;
use shopledger_inventory::{InventoryChange, InventoryRecord, InventoryStatus};
use shopledger_products::Product;

use crate::error::{bounded, ServiceError, ServiceResult};
use crate::store::LedgerStore;

#[derive(Clone)]
pub struct InventoryLedger {
    store: Arc<dyn LedgerStore>,
    timeout: Duration,
}

impl InventoryLedger {
    pub fn new(store: Arc<dyn LedgerStore>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    #[instrument(skip(self), err)]
    pub async fn list_all_products(&self) -> ServiceResult<Vec<Product>> {
        bounded(self.timeout, "list_all_products", self.store.list_products()).await
    }

    #[instrument(skip(self), fields(product_id = %product_id), err)]
    pub async fn get_status(&self, product_id: ProductId) -> ServiceResult<InventoryStatus> {
        bounded(self.timeout, "get_status", self.store.snapshot(product_id))
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("inventory status for product {product_id} not found")))
    }

    /// Snapshots with stock strictly below `threshold`.
    #[instrument(skip(self), err)]
    pub async fn list_low_stock(&self, threshold: i64) -> ServiceResult<Vec<InventoryStatus>> {
        if threshold <= 0 {
            return Err(ServiceError::InvalidInput(format!(
                "threshold must be greater than 0 (got {threshold})"
            )));
        }
        bounded(self.timeout, "list_low_stock", self.store.low_stock(threshold)).await
    }

    /// Apply one movement and return the resulting stock level.
    ///
    /// An `OUT` larger than the current level fails with `InsufficientStock`
    /// and leaves both the snapshot and the movement log untouched.
    #[instrument(
        skip(self, change),
        fields(
            product_id = %change.product_id,
            change_type = %change.change_type,
            quantity = change.quantity
        ),
        err
    )]
    pub async fn apply_change(&self, change: InventoryChange) -> ServiceResult<i64> {
        change.validate()?;
        let new_stock = bounded(self.timeout, "apply_change", self.store.apply_change(change)).await?;
        debug!(new_stock, "inventory change applied");
        Ok(new_stock)
    }

    /// Movement history for one product, oldest first.
    #[instrument(skip(self), fields(product_id = %product_id), err)]
    pub async fn list_movements(&self, product_id: ProductId) -> ServiceResult<Vec<InventoryRecord>> {
        bounded(self.timeout, "list_movements", self.store.movements(product_id)).await
    }
}

impl std::fmt::Debug for InventoryLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InventoryLedger")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
