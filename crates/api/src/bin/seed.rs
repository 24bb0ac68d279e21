//! Replace the Postgres catalog with the built-in sample products.
//!
//! Existing products are deleted first; their sales go with them.

use std::sync::Arc;

use anyhow::Context;

use shopledger_infra::store::PostgresStore;
use shopledger_infra::{db, AppConfig, ProductCatalog};
use shopledger_products::seed_fixtures;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    shopledger_observability::init();

    let config = AppConfig::from_env().context("invalid configuration")?;
    let database = config
        .database
        .as_ref()
        .context("seeding needs USE_PERSISTENT_STORES=true and DATABASE_URL")?;

    let pool = db::create_pool(database)
        .await
        .context("failed to connect to Postgres")?;
    db::ensure_schema(&pool)
        .await
        .context("failed to bootstrap schema")?;

    let catalog = ProductCatalog::new(Arc::new(PostgresStore::new(pool)), config.store_timeout);
    let ids = catalog
        .replace_products(seed_fixtures())
        .await
        .context("failed to seed products")?;

    tracing::info!(count = ids.len(), "seeded product catalog");
    Ok(())
}
