//! Infrastructure layer: stores, engines, config, and pool wiring.
//!
//! - `store`: storage boundary (`CatalogStore`, `LedgerStore`, `SalesStore`)
//!   with an in-memory and a Postgres implementation
//! - `ledger`, `revenue`, `catalog`: the engines HTTP handlers call into
//! - `config`, `db`: environment configuration and connection pool creation

pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod ledger;
pub mod locks;
pub mod revenue;
pub mod store;


pub use catalog::ProductCatalog;
pub use config::{AppConfig, ConfigError, DatabaseConfig, ServerConfig};
pub use error::{ServiceError, ServiceResult};
pub use ledger::InventoryLedger;
pub use revenue::RevenueReports;
pub use store::{InMemoryStore, PostgresStore, StoreError, StoreResult};
