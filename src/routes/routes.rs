//! Defines routes for all bucket and fruit operations.
//!
//! ## Structure
//! - `GET    /api/healthcheck`  database liveness
//!
//! - **Bucket endpoints**
//!   - `POST   /api/v1/buckets`  create bucket
//!   - `GET    /api/v1/buckets`  list buckets with occupancy (`page`, `page_size`)
//!   - `DELETE /api/v1/buckets/{bucket_id}`  retire an empty bucket
//!
//! - **Fruit endpoints**
//!   - `POST   /api/v1/fruits`  create fruit, optionally inside a bucket
//!   - `GET    /api/v1/fruits/{fruit_id}`  fetch fruit
//!   - `DELETE /api/v1/fruits/{fruit_id}`  soft-delete fruit
//!   - `POST   /api/v1/fruits/{fruit_id}/buckets/{bucket_id}`  move into bucket
//!   - `DELETE /api/v1/fruits/{fruit_id}/buckets`  take out of its bucket

use crate::{
    handlers::{
        bucket_handlers::{create_bucket, delete_bucket, list_buckets},
        health_handlers::healthcheck,
        item_handlers::{assign_item, create_item, delete_item, get_item, unassign_item},
    },
    routes::request_log::log_requests,
    state::AppState,
};
use axum::{
    Router, middleware,
    routing::{delete, get, post},
};

/// Build the router for the whole API.
///
/// The router carries shared state (`AppState`) to all handlers and logs
/// every request except health checks.
pub fn routes() -> Router<AppState> {
    let v1 = Router::new()
        .route("/buckets", post(create_bucket).get(list_buckets))
        .route("/buckets/{bucket_id}", delete(delete_bucket))
        .route("/fruits", post(create_item))
        .route("/fruits/{fruit_id}", get(get_item).delete(delete_item))
        .route("/fruits/{fruit_id}/buckets", delete(unassign_item))
        .route("/fruits/{fruit_id}/buckets/{bucket_id}", post(assign_item));

    Router::new()
        .route("/api/healthcheck", get(healthcheck))
        .nest("/api/v1", v1)
        .layer(middleware::from_fn(log_requests))
}
