use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;

use shopledger_infra::store::{InMemoryStore, PostgresStore};
use shopledger_infra::{db, AppConfig, InventoryLedger, ProductCatalog, RevenueReports};

/// Engines shared by every handler (injected via `Extension`).
#[derive(Debug, Clone)]
pub struct AppServices {
    pub ledger: InventoryLedger,
    pub revenue: RevenueReports,
    pub catalog: ProductCatalog,
}

impl AppServices {
    /// In-memory wiring (dev/test).
    pub fn in_memory(store_timeout: Duration) -> Self {
        let store = Arc::new(InMemoryStore::new());
        Self {
            ledger: InventoryLedger::new(store.clone(), store_timeout),
            revenue: RevenueReports::new(store.clone(), store_timeout),
            catalog: ProductCatalog::new(store, store_timeout),
        }
    }

    /// Postgres wiring over an already created pool.
    pub fn postgres(store: PostgresStore, store_timeout: Duration) -> Self {
        let store = Arc::new(store);
        Self {
            ledger: InventoryLedger::new(store.clone(), store_timeout),
            revenue: RevenueReports::new(store.clone(), store_timeout),
            catalog: ProductCatalog::new(store, store_timeout),
        }
    }
}

pub async fn build_services(config: &AppConfig) -> anyhow::Result<AppServices> {
    let Some(database) = &config.database else {
        tracing::info!("USE_PERSISTENT_STORES not set; using in-memory store");
        return Ok(AppServices::in_memory(config.store_timeout));
    };

    let pool = db::create_pool(database)
        .await
        .context("failed to connect to Postgres")?;
    db::ensure_schema(&pool)
        .await
        .context("failed to bootstrap schema")?;

    Ok(AppServices::postgres(
        PostgresStore::new(pool),
        config.store_timeout,
    ))
}
