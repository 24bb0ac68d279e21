use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;

use shopledger_core::{DomainError, MovementId, ProductId, SaleId};
use shopledger_inventory::{next_stock, InventoryChange, InventoryRecord, InventoryStatus};
use shopledger_products::{NewProduct, Product};
use shopledger_sales::{
    bucket_revenue, total_revenue, NewSale, Period, RevenueSummaryItem, Sale, SaleItem, SalesFilter,
};

use super::{CatalogStore, LedgerStore, SalesStore, StoreError, StoreResult};
use crate::locks::KeyedLocks;

#[derive(Debug, Default)]
struct State {
    products: BTreeMap<ProductId, Product>,
    sales: Vec<Sale>,
    /// Movement rows in append order.
    movements: Vec<InventoryRecord>,
    /// At most one snapshot row per product.
    snapshots: BTreeMap<ProductId, InventoryRecord>,
    last_product_id: i64,
    last_sale_id: i64,
    last_row_id: i64,
}

impl State {
    fn next_product_id(&mut self) -> ProductId {
        self.last_product_id += 1;
        ProductId::new(self.last_product_id)
    }

    fn next_sale_id(&mut self) -> SaleId {
        self.last_sale_id += 1;
        SaleId::new(self.last_sale_id)
    }

    fn next_row_id(&mut self) -> MovementId {
        self.last_row_id += 1;
        MovementId::new(self.last_row_id)
    }

    fn joined_sales(&self, filter: &SalesFilter) -> StoreResult<Vec<SaleItem>> {
        let mut items = Vec::new();
        for sale in &self.sales {
            let Some(product) = self.products.get(&sale.product_id) else {
                continue;
            };
            let item = SaleItem::join(sale, product)?;
            if filter.matches(&item) {
                items.push(item);
            }
        }
        Ok(items)
    }
}

/// In-memory store implementing every store trait.
///
/// Intended for tests/dev. Ids are assigned from per-table counters starting at
/// 1, mirroring `BIGSERIAL`.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: RwLock<State>,
    ledger_locks: KeyedLocks<ProductId>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, State>> {
        self.state
            .read()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, State>> {
        self.state
            .write()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))
    }
}

#[async_trait]
impl CatalogStore for InMemoryStore {
    async fn insert_product(&self, product: NewProduct) -> StoreResult<ProductId> {
        let mut state = self.write()?;
        let id = state.next_product_id();
        state.products.insert(id, product.into_product(id));
        Ok(id)
    }

    async fn record_sale(&self, sale: NewSale) -> StoreResult<SaleId> {
        let mut state = self.write()?;
        let Some(product) = state.products.get_mut(&sale.product_id) else {
            return Err(DomainError::not_found(format!("product {} not found", sale.product_id)).into());
        };
        // Overflow leaves the counter unchanged.
        product.stock = product
            .stock
            .checked_sub(sale.quantity)
            .ok_or_else(|| DomainError::validation("stock counter out of range"))?;

        let id = state.next_sale_id();
        state.sales.push(sale.into_sale(id));
        Ok(id)
    }

    async fn replace_products(&self, products: Vec<NewProduct>) -> StoreResult<Vec<ProductId>> {
        let mut state = self.write()?;
        state.products.clear();
        state.sales.clear();

        let mut ids = Vec::with_capacity(products.len());
        for product in products {
            let id = state.next_product_id();
            state.products.insert(id, product.into_product(id));
            ids.push(id);
        }
        Ok(ids)
    }
}

#[async_trait]
impl LedgerStore for InMemoryStore {
    async fn list_products(&self) -> StoreResult<Vec<Product>> {
        Ok(self.read()?.products.values().cloned().collect())
    }

    async fn snapshot(&self, product_id: ProductId) -> StoreResult<Option<InventoryStatus>> {
        Ok(self
            .read()?
            .snapshots
            .get(&product_id)
            .map(InventoryRecord::to_status))
    }

    async fn low_stock(&self, threshold: i64) -> StoreResult<Vec<InventoryStatus>> {
        Ok(self
            .read()?
            .snapshots
            .values()
            .filter(|s| s.stock < threshold)
            .map(InventoryRecord::to_status)
            .collect())
    }

    async fn apply_change(&self, change: InventoryChange) -> StoreResult<i64> {
        // Held from the snapshot read until both rows are written.
        let _serial = self.ledger_locks.lock(change.product_id).await;

        let current = self
            .read()?
            .snapshots
            .get(&change.product_id)
            .map(|s| s.stock)
            .unwrap_or(0);
        let new_stock = next_stock(current, &change)?;

        let mut state = self.write()?;
        let now = Utc::now();
        let movement_id = state.next_row_id();
        let product_id = change.product_id;
        state.movements.push(InventoryRecord {
            id: movement_id,
            product_id,
            change_type: Some(change.change_type),
            quantity: change.quantity,
            stock: new_stock,
            change_date: now,
            reference: change.reference,
        });

        if let Some(snapshot) = state.snapshots.get_mut(&product_id) {
            snapshot.stock = new_stock;
            snapshot.change_date = now;
        } else {
            let snapshot_id = state.next_row_id();
            state.snapshots.insert(
                product_id,
                InventoryRecord {
                    id: snapshot_id,
                    product_id,
                    change_type: None,
                    quantity: 0,
                    stock: new_stock,
                    change_date: now,
                    reference: None,
                },
            );
        }

        Ok(new_stock)
    }

    async fn movements(&self, product_id: ProductId) -> StoreResult<Vec<InventoryRecord>> {
        Ok(self
            .read()?
            .movements
            .iter()
            .filter(|m| m.product_id == product_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl SalesStore for InMemoryStore {
    async fn list_sales(&self, filter: &SalesFilter, limit: usize) -> StoreResult<Vec<SaleItem>> {
        let state = self.read()?;
        let mut items = state.joined_sales(filter)?;
        items.sort_by(|a, b| {
            b.sale_date
                .cmp(&a.sale_date)
                .then_with(|| b.sale_id.cmp(&a.sale_id))
        });
        items.truncate(limit);
        Ok(items)
    }

    async fn revenue_by_period(
        &self,
        filter: &SalesFilter,
        period: Period,
    ) -> StoreResult<Vec<RevenueSummaryItem>> {
        let state = self.read()?;
        let items = state.joined_sales(filter)?;
        Ok(bucket_revenue(&items, period)?)
    }

    async fn total_revenue(&self, filter: &SalesFilter) -> StoreResult<Decimal> {
        let state = self.read()?;
        let items = state.joined_sales(filter)?;
        Ok(total_revenue(&items)?)
    }
}
