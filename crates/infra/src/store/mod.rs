//! Storage boundary.
//!
//! Engines talk to storage only through these traits, so the in-memory store
//! (dev/test) and the Postgres store are interchangeable behind an `Arc<dyn _>`.
//! Every write that touches more than one row is atomic in both
//! implementations.

use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;

use shopledger_core::{DomainError, ProductId, SaleId};
use shopledger_inventory::{InventoryChange, InventoryRecord, InventoryStatus};
use shopledger_products::{NewProduct, Product};
use shopledger_sales::{NewSale, Period, RevenueSummaryItem, SaleItem, SalesFilter};

pub mod in_memory;
pub mod postgres;

pub use in_memory::InMemoryStore;
pub use postgres::PostgresStore;

pub type StoreResult<T> = Result<T, StoreError>;

/// Store operation error.
///
/// `Domain` carries business rejections detected inside a store transaction
/// (the transaction is rolled back before it is returned).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Connection could not be obtained or was lost.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The store answered with an unexpected failure.
    #[error("store query failed: {0}")]
    Query(String),
}

/// Products and sales writes.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn insert_product(&self, product: NewProduct) -> StoreResult<ProductId>;

    /// Insert the sale and decrement `products.stock` in one transaction.
    ///
    /// Unknown product: `DomainError::NotFound`, nothing written.
    async fn record_sale(&self, sale: NewSale) -> StoreResult<SaleId>;

    /// Remove every product (and its sales) and insert `products`, atomically.
    async fn replace_products(&self, products: Vec<NewProduct>) -> StoreResult<Vec<ProductId>>;
}

/// Inventory ledger reads and the serialized change path.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Every product, ordered by id.
    async fn list_products(&self) -> StoreResult<Vec<Product>>;

    async fn snapshot(&self, product_id: ProductId) -> StoreResult<Option<InventoryStatus>>;

    /// Snapshots with `stock < threshold`, ordered by product id.
    async fn low_stock(&self, threshold: i64) -> StoreResult<Vec<InventoryStatus>>;

    /// Read snapshot, apply `shopledger_inventory::next_stock`, append the
    /// movement, upsert the snapshot. Serialized per product; returns the new
    /// stock level.
    async fn apply_change(&self, change: InventoryChange) -> StoreResult<i64>;

    /// Movement rows for one product in append order.
    async fn movements(&self, product_id: ProductId) -> StoreResult<Vec<InventoryRecord>>;
}

/// Queries over the sales/product join.
#[async_trait]
pub trait SalesStore: Send + Sync {
    /// Newest first (`sale_date` DESC, then sale id DESC), at most `limit` rows.
    async fn list_sales(&self, filter: &SalesFilter, limit: usize) -> StoreResult<Vec<SaleItem>>;

    async fn revenue_by_period(
        &self,
        filter: &SalesFilter,
        period: Period,
    ) -> StoreResult<Vec<RevenueSummaryItem>>;

    async fn total_revenue(&self, filter: &SalesFilter) -> StoreResult<Decimal>;
}
