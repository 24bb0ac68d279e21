use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use shopledger_core::ProductId;
use shopledger_infra::ServiceError;
use shopledger_inventory::DEFAULT_LOW_STOCK_THRESHOLD;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_inventory))
        .route("/status/:product_id", get(get_status))
        .route("/low-stock", get(low_stock))
        .route("/movements/:product_id", get(list_movements))
        .route("/update", post(update_inventory))
}

fn parse_product_id(raw: &str) -> Result<ProductId, axum::response::Response> {
    raw.parse()
        .map_err(|_| errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid product id"))
}

pub async fn list_inventory(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.ledger.list_all_products().await {
        Ok(products) => (StatusCode::OK, Json(products)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_status(
    Extension(services): Extension<Arc<AppServices>>,
    Path(product_id): Path<String>,
) -> axum::response::Response {
    let product_id = match parse_product_id(&product_id) {
        Ok(id) => id,
        Err(res) => return res,
    };

    match services.ledger.get_status(product_id).await {
        Ok(status) => (StatusCode::OK, Json(status)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn low_stock(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::LowStockQuery>,
) -> axum::response::Response {
    let threshold = query.threshold.unwrap_or(DEFAULT_LOW_STOCK_THRESHOLD);
    match services.ledger.list_low_stock(threshold).await {
        Ok(rows) => (StatusCode::OK, Json(rows)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn list_movements(
    Extension(services): Extension<Arc<AppServices>>,
    Path(product_id): Path<String>,
) -> axum::response::Response {
    let product_id = match parse_product_id(&product_id) {
        Ok(id) => id,
        Err(res) => return res,
    };

    match services.ledger.list_movements(product_id).await {
        Ok(rows) => (StatusCode::OK, Json(rows)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn update_inventory(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::InventoryUpdateRequest>,
) -> axum::response::Response {
    let change = match body.into_change() {
        Ok(c) => c,
        Err(e) => return errors::service_error_to_response(ServiceError::from(e)),
    };

    match services.ledger.apply_change(change).await {
        Ok(new_stock) => (
            StatusCode::CREATED,
            Json(dto::InventoryUpdateResponse {
                message: "Inventory updated successfully",
                new_stock,
            }),
        )
            .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
