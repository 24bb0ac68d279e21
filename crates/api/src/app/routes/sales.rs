use std::sync::Arc;

use axum::{
    extract::{Extension, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use shopledger_infra::ServiceError;
use shopledger_sales::RevenueComparisonRequest;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", post(record_sale))
        .route("/sales", get(list_sales))
        .route("/revenue", get(revenue_by_period))
        .route("/revenue/total", get(total_revenue))
        .route("/revenue/compare", post(compare_revenue))
}

pub async fn record_sale(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::RecordSaleRequest>,
) -> axum::response::Response {
    let sale = match body.into_sale() {
        Ok(s) => s,
        Err(e) => return errors::service_error_to_response(ServiceError::from(e)),
    };

    match services.catalog.record_sale(sale).await {
        Ok(id) => (
            StatusCode::CREATED,
            Json(dto::CreatedResponse {
                message: "Sale recorded successfully",
                id: id.get(),
            }),
        )
            .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn list_sales(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::SalesQuery>,
) -> axum::response::Response {
    match services.revenue.list_sales(&query.filter()).await {
        Ok(items) => (StatusCode::OK, Json(items)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn revenue_by_period(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::SalesQuery>,
) -> axum::response::Response {
    match services
        .revenue
        .revenue_by_period(&query.filter(), query.period())
        .await
    {
        Ok(buckets) => (StatusCode::OK, Json(buckets)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn total_revenue(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::SalesQuery>,
) -> axum::response::Response {
    match services.revenue.total_revenue(&query.filter()).await {
        Ok(revenue) => (StatusCode::OK, Json(dto::RevenueResponse { revenue })).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn compare_revenue(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<RevenueComparisonRequest>,
) -> axum::response::Response {
    match services.revenue.compare_revenue(&body).await {
        Ok(resp) => (StatusCode::OK, Json(resp)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
