use axum::{
    routing::{get, post},
    Router,
};

pub mod inventory;
pub mod products;
pub mod sales;
pub mod system;

/// Router for every domain endpoint.
///
/// Collection roots answer with and without a trailing slash.
pub fn router() -> Router {
    Router::new()
        .nest("/inventory", inventory::router())
        .nest("/products", products::router())
        .nest("/sales", sales::router())
        .route("/inventory/", get(inventory::list_inventory))
        .route("/products/", post(products::register_product))
        .route("/sales/", post(sales::record_sale))
}
