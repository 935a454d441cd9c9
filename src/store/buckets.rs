//! Queries against the `buckets` table.

use crate::models::bucket::Bucket;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqliteConnection};

const BUCKET_COLUMNS: &str = "id, name, capacity, created_at, deleted_at";

/// Per-bucket counts for one page of the listing. Prices are summed
/// separately because they are stored as decimal text.
#[derive(Debug, Clone, FromRow)]
pub struct BucketCountRow {
    pub id: i64,
    pub name: String,
    pub capacity: i64,
    pub created_at: DateTime<Utc>,
    pub total_items: i64,
}

pub async fn insert_bucket(
    conn: &mut SqliteConnection,
    name: &str,
    capacity: i64,
    created_at: DateTime<Utc>,
) -> Result<Bucket, sqlx::Error> {
    sqlx::query_as::<_, Bucket>(&format!(
        "INSERT INTO buckets (name, capacity, created_at) VALUES (?, ?, ?)
         RETURNING {BUCKET_COLUMNS}"
    ))
    .bind(name)
    .bind(capacity)
    .bind(created_at)
    .fetch_one(conn)
    .await
}

/// Fetch a non-retired bucket.
pub async fn find_bucket(
    conn: &mut SqliteConnection,
    id: i64,
) -> Result<Option<Bucket>, sqlx::Error> {
    sqlx::query_as::<_, Bucket>(&format!(
        "SELECT {BUCKET_COLUMNS} FROM buckets WHERE id = ? AND deleted_at IS NULL"
    ))
    .bind(id)
    .fetch_optional(conn)
    .await
}

/// Locking read of a non-retired bucket.
///
/// SQLite has no row locks, so this issues a no-op `UPDATE ... RETURNING`:
/// it takes the database write lock for the rest of the enclosing transaction
/// and hands back the row in the same statement. Concurrent callers queue on
/// the busy timeout and, once they get in, read counts committed by the
/// previous holder. Must be the first statement of the transaction.
pub async fn lock_bucket(
    conn: &mut SqliteConnection,
    id: i64,
) -> Result<Option<Bucket>, sqlx::Error> {
    sqlx::query_as::<_, Bucket>(&format!(
        "UPDATE buckets SET capacity = capacity
         WHERE id = ? AND deleted_at IS NULL
         RETURNING {BUCKET_COLUMNS}"
    ))
    .bind(id)
    .fetch_optional(conn)
    .await
}

/// Soft-delete a bucket. Returns the number of rows touched.
pub async fn retire_bucket(
    conn: &mut SqliteConnection,
    id: i64,
    at: DateTime<Utc>,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("UPDATE buckets SET deleted_at = ? WHERE id = ? AND deleted_at IS NULL")
        .bind(at)
        .bind(id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected())
}

/// One page of non-retired buckets with their occupancy at `now`.
///
/// Ordered by fill ratio (highest first), then oldest first.
pub async fn list_bucket_counts(
    conn: &mut SqliteConnection,
    now: DateTime<Utc>,
    limit: i64,
    offset: i64,
) -> Result<Vec<BucketCountRow>, sqlx::Error> {
    sqlx::query_as::<_, BucketCountRow>(
        r#"
        SELECT b.id, b.name, b.capacity, b.created_at, COUNT(i.id) AS total_items
        FROM buckets b
        LEFT JOIN items i
               ON i.bucket_id = b.id
              AND i.deleted_at IS NULL
              AND i.expires_at > ?
        WHERE b.deleted_at IS NULL
        GROUP BY b.id, b.name, b.capacity, b.created_at
        ORDER BY CAST(COUNT(i.id) AS REAL) * 100.0 / b.capacity DESC,
                 b.created_at ASC,
                 b.id ASC
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(now)
    .bind(limit)
    .bind(offset)
    .fetch_all(conn)
    .await
}
