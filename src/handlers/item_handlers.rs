//! HTTP handlers for item ("fruit") operations.

use crate::{
    errors::AppError,
    models::item::{Item, NewItem},
    state::AppState,
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Duration;
use rust_decimal::Decimal;
use serde::Deserialize;

/// Body for `POST /api/v1/fruits`.
#[derive(Debug, Deserialize)]
pub struct CreateItemReq {
    #[serde(default)]
    pub name: String,
    pub price: Option<Decimal>,
    /// Time to live in seconds, counted from creation.
    pub expires_in_secs: Option<i64>,
    pub bucket_id: Option<i64>,
}

/// `POST /api/v1/fruits`: create an item, optionally inside a bucket.
pub async fn create_item(
    State(state): State<AppState>,
    Json(req): Json<CreateItemReq>,
) -> Result<(StatusCode, Json<Item>), AppError> {
    let item = state
        .items
        .create(NewItem {
            name: req.name,
            price: req.price,
            ttl: req.expires_in_secs.map(ttl_from_secs),
            bucket_id: req.bucket_id,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(item)))
}

/// Seconds beyond what `Duration` holds saturate, so validation reports them
/// as out of range (or non-positive) instead of missing.
fn ttl_from_secs(secs: i64) -> Duration {
    Duration::try_seconds(secs).unwrap_or(if secs < 0 {
        Duration::MIN
    } else {
        Duration::MAX
    })
}

/// `GET /api/v1/fruits/{fruit_id}`
pub async fn get_item(
    State(state): State<AppState>,
    Path(item_id): Path<i64>,
) -> Result<Json<Item>, AppError> {
    Ok(Json(state.items.get(item_id).await?))
}

/// `DELETE /api/v1/fruits/{fruit_id}`: soft-delete; repeat calls succeed.
pub async fn delete_item(
    State(state): State<AppState>,
    Path(item_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    state.items.delete(item_id).await?;
    Ok(StatusCode::OK)
}

/// `POST /api/v1/fruits/{fruit_id}/buckets/{bucket_id}`: move into a bucket.
pub async fn assign_item(
    State(state): State<AppState>,
    Path((item_id, bucket_id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, AppError> {
    state.items.assign_to_bucket(item_id, bucket_id).await?;
    Ok(StatusCode::OK)
}

/// `DELETE /api/v1/fruits/{fruit_id}/buckets`: take out of its bucket.
pub async fn unassign_item(
    State(state): State<AppState>,
    Path(item_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    state.items.unassign_from_bucket(item_id).await?;
    Ok(StatusCode::OK)
}
