//! Postgres pool creation and schema bootstrap.

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::info;

use crate::config::DatabaseConfig;
use crate::store::postgres::map_sqlx_error;
use crate::store::StoreResult;

/// Reference DDL, shipped with the crate.
pub const SCHEMA_SQL: &str = include_str!("../sql/schema.sql");

/// Create the process-wide pool and verify one round trip.
pub async fn create_pool(config: &DatabaseConfig) -> StoreResult<PgPool> {
    info!(
        max_connections = config.max_connections,
        min_connections = config.min_connections,
        "connecting to database"
    );

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(config.acquire_timeout)
        .connect(&config.url)
        .await
        .map_err(|e| map_sqlx_error("connect", e))?;

    sqlx::query("SELECT 1")
        .execute(&pool)
        .await
        .map_err(|e| map_sqlx_error("verify_connection", e))?;

    info!("database connection pool ready");
    Ok(pool)
}

/// Create missing tables and indexes. Existing objects are left alone.
pub async fn ensure_schema(pool: &PgPool) -> StoreResult<()> {
    sqlx::raw_sql(SCHEMA_SQL)
        .execute(pool)
        .await
        .map_err(|e| map_sqlx_error("ensure_schema", e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn schema_declares_single_snapshot_per_product() {
        assert!(SCHEMA_SQL.contains("CREATE UNIQUE INDEX IF NOT EXISTS inventory_snapshot_uniq"));
        assert!(SCHEMA_SQL.contains("WHERE change_type IS NULL"));
    }

    #[tokio::test]
    #[ignore] // Only run with database available (DATABASE_URL)
    async fn connects_and_bootstraps_schema() {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL");
        let config = DatabaseConfig {
            url,
            max_connections: 2,
            min_connections: 1,
            acquire_timeout: Duration::from_secs(3),
        };

        let pool = create_pool(&config).await.unwrap();
        ensure_schema(&pool).await.unwrap();
        ensure_schema(&pool).await.unwrap();
    }
}
