use axum::{
    http::{HeaderName, HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use tracing::Instrument;
use uuid::Uuid;

pub static REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// Wrap each request in a span carrying a fresh UUIDv7 `request_id`, and echo
/// the id back in `x-request-id`.
pub async fn request_id_middleware(req: Request<axum::body::Body>, next: Next) -> Response {
    let request_id = Uuid::now_v7();
    let span = tracing::info_span!(
        "http_request",
        request_id = %request_id,
        method = %req.method(),
        path = %req.uri().path(),
    );

    let mut res = async move {
        let res = next.run(req).await;
        tracing::info!(status = res.status().as_u16(), "request completed");
        res
    }
    .instrument(span)
    .await;

    if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
        res.headers_mut().insert(REQUEST_ID_HEADER.clone(), value);
    }
    res
}
