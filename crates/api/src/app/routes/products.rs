use std::sync::Arc;

use axum::{
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Json, Router,
};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new().route("/", post(register_product))
}

pub async fn register_product(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::RegisterProductRequest>,
) -> axum::response::Response {
    match services.catalog.register_product(body.into()).await {
        Ok(id) => (
            StatusCode::CREATED,
            Json(dto::CreatedResponse {
                message: "Product registered successfully",
                id: id.get(),
            }),
        )
            .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
