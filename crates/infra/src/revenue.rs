//! Revenue aggregation engine over the sales/product join.

use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use tracing::instrument;

use shopledger_sales::{
    Period, RevenueComparisonPeriod, RevenueComparisonRequest, RevenueComparisonResponse,
    RevenueSummaryItem, SaleItem, SalesFilter, MAX_SALE_ITEMS,
};

use crate::error::{bounded, ServiceResult};
use crate::store::SalesStore;

#[derive(Clone)]
pub struct RevenueReports {
    store: Arc<dyn SalesStore>,
    timeout: Duration,
}

impl RevenueReports {
    pub fn new(store: Arc<dyn SalesStore>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    /// Newest sales first, capped at `MAX_SALE_ITEMS`.
    #[instrument(skip(self), err)]
    pub async fn list_sales(&self, filter: &SalesFilter) -> ServiceResult<Vec<SaleItem>> {
        filter.validate()?;
        bounded(
            self.timeout,
            "list_sales",
            self.store.list_sales(filter, MAX_SALE_ITEMS),
        )
        .await
    }

    /// Revenue per bucket, buckets ascending.
    #[instrument(skip(self), fields(period = period.as_str()), err)]
    pub async fn revenue_by_period(
        &self,
        filter: &SalesFilter,
        period: Period,
    ) -> ServiceResult<Vec<RevenueSummaryItem>> {
        filter.validate()?;
        bounded(
            self.timeout,
            "revenue_by_period",
            self.store.revenue_by_period(filter, period),
        )
        .await
    }

    /// Unbucketed revenue; zero when nothing matches.
    #[instrument(skip(self), err)]
    pub async fn total_revenue(&self, filter: &SalesFilter) -> ServiceResult<Decimal> {
        filter.validate()?;
        bounded(self.timeout, "total_revenue", self.store.total_revenue(filter)).await
    }

    /// Revenue of two date ranges under the same optional product/category scope.
    ///
    /// Ranges are not checked for order; an inverted range simply matches no
    /// sales and reports zero.
    #[instrument(skip(self, request), err)]
    pub async fn compare_revenue(
        &self,
        request: &RevenueComparisonRequest,
    ) -> ServiceResult<RevenueComparisonResponse> {
        request.validate()?;

        let first = self.total_revenue(&request.first_filter()).await?;
        let second = self.total_revenue(&request.second_filter()).await?;

        Ok(RevenueComparisonResponse {
            period1: RevenueComparisonPeriod {
                start_date: request.period1_start,
                end_date: request.period1_end,
                revenue: first,
            },
            period2: RevenueComparisonPeriod {
                start_date: request.period2_start,
                end_date: request.period2_end,
                revenue: second,
            },
        })
    }
}

impl std::fmt::Debug for RevenueReports {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RevenueReports")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
