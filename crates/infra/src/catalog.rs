use std::sync::Arc;
use std::time::Duration;

use tracing::{info, instrument};

use shopledger_core::{ProductId, SaleId};
use shopledger_products::NewProduct;
use shopledger_sales::NewSale;

use crate::error::{bounded, ServiceResult};
use crate::store::CatalogStore;

/// Product registration and sale recording.
#[derive(Clone)]
pub struct ProductCatalog {
    store: Arc<dyn CatalogStore>,
    timeout: Duration,
}

impl ProductCatalog {
    pub fn new(store: Arc<dyn CatalogStore>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    #[instrument(skip(self, product), fields(name = %product.name, category = %product.category), err)]
    pub async fn register_product(&self, product: NewProduct) -> ServiceResult<ProductId> {
        product.validate()?;
        bounded(self.timeout, "register_product", self.store.insert_product(product)).await
    }

    /// Record a sale and decrement the catalog stock counter, atomically.
    #[instrument(skip(self, sale), fields(product_id = %sale.product_id, quantity = sale.quantity), err)]
    pub async fn record_sale(&self, sale: NewSale) -> ServiceResult<SaleId> {
        sale.validate()?;
        bounded(self.timeout, "record_sale", self.store.record_sale(sale)).await
    }

    /// Replace the whole catalog (seeding only).
    #[instrument(skip(self, products), fields(count = products.len()), err)]
    pub async fn replace_products(&self, products: Vec<NewProduct>) -> ServiceResult<Vec<ProductId>> {
        for product in &products {
            product.validate()?;
        }
        let ids = bounded(
            self.timeout,
            "replace_products",
            self.store.replace_products(products),
        )
        .await?;
        info!(count = ids.len(), "catalog replaced");
        Ok(ids)
    }
}

impl std::fmt::Debug for ProductCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProductCatalog")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
