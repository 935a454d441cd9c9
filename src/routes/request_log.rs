//! One log line per request, leveled by response status.

use axum::{
    extract::Request,
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use uuid::Uuid;

const SKIP_PATHS: [&str; 1] = ["/api/healthcheck"];

const REQUEST_ID: &str = "request-id";

/// Log method, path, status and latency. Reuses the caller's `request-id`
/// header or mints a UUID, and echoes it on the response.
pub async fn log_requests(request: Request, next: Next) -> Response {
    let path = request.uri().path().to_owned();
    if SKIP_PATHS.iter().any(|p| path.starts_with(p)) {
        return next.run(request).await;
    }

    let method = request.method().clone();
    let query = request.uri().query().unwrap_or_default().to_owned();
    let request_id = request
        .headers()
        .get(REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let start = Instant::now();
    let mut response = next.run(request).await;
    let duration_ms = start.elapsed().as_millis() as u64;
    let status = response.status().as_u16();

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response
            .headers_mut()
            .insert(HeaderName::from_static(REQUEST_ID), value);
    }

    if response.status().is_server_error() {
        tracing::error!(%method, %path, %query, status, duration_ms, %request_id, "request");
    } else if response.status().is_client_error() {
        tracing::warn!(%method, %path, %query, status, duration_ms, %request_id, "request");
    } else {
        tracing::info!(%method, %path, %query, status, duration_ms, %request_id, "request");
    }

    response
}
