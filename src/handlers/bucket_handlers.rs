//! HTTP handlers for bucket operations.

use crate::{
    errors::AppError,
    models::bucket::{Bucket, BucketSummary, NewBucket},
    services::bucket_service::{DEFAULT_PAGE, DEFAULT_PAGE_SIZE, PageRequest},
    state::AppState,
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};

/// Body for `POST /api/v1/buckets`. Missing fields fall through to
/// validation so every problem is reported together.
#[derive(Debug, Deserialize)]
pub struct CreateBucketReq {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub capacity: i64,
}

/// Query params for `GET /api/v1/buckets`.
#[derive(Debug, Deserialize)]
pub struct ListBucketsQuery {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct ListBucketsRes {
    pub data: Vec<BucketSummary>,
}

/// `POST /api/v1/buckets`: create a bucket.
pub async fn create_bucket(
    State(state): State<AppState>,
    Json(req): Json<CreateBucketReq>,
) -> Result<(StatusCode, Json<Bucket>), AppError> {
    let bucket = state
        .buckets
        .create(NewBucket {
            name: req.name,
            capacity: req.capacity,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(bucket)))
}

/// `GET /api/v1/buckets?page=&page_size=`: list buckets, fullest first.
pub async fn list_buckets(
    State(state): State<AppState>,
    Query(q): Query<ListBucketsQuery>,
) -> Result<Json<ListBucketsRes>, AppError> {
    let page = PageRequest::normalized(
        q.page.unwrap_or(DEFAULT_PAGE),
        q.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
    );
    let data = state.buckets.list(page).await?;

    Ok(Json(ListBucketsRes { data }))
}

/// `DELETE /api/v1/buckets/{bucket_id}`: retire an empty bucket.
pub async fn delete_bucket(
    State(state): State<AppState>,
    Path(bucket_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    state.buckets.delete(bucket_id).await?;
    Ok(StatusCode::OK)
}
