//! Inventory ledger domain module.
//!
//! The ledger is append-only: every change produces an immutable movement
//! record, and a single snapshot record per product carries the live stock.
//! This crate holds the types and the stock rule, implemented purely as
//! deterministic domain logic (no IO, no HTTP, no storage).

pub mod ledger;
pub mod record;

pub use ledger::{next_stock, StockLedger};
pub use record::{ChangeType, InventoryChange, InventoryRecord, InventoryStatus, DEFAULT_LOW_STOCK_THRESHOLD};
