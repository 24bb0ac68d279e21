//! Sales domain module.
//!
//! Recorded sales, the filters used to select them, and the revenue
//! aggregation rules (period buckets, totals, comparisons). Pure domain logic:
//! the stores evaluate the same filters and buckets in SQL or in memory.

pub mod filter;
pub mod period;
pub mod revenue;
pub mod sale;

pub use filter::{SalesFilter, SalesPredicate};
pub use period::Period;
pub use revenue::{
    bucket_revenue, total_revenue, RevenueComparisonPeriod, RevenueComparisonRequest,
    RevenueComparisonResponse, RevenueSummaryItem, SaleItem, MAX_SALE_ITEMS,
};
pub use sale::{NewSale, Sale};
