//! Occupancy evaluation and admission control.
//!
//! Both functions must run on the caller's transaction, and the caller must
//! do its write on that same transaction before committing. The bucket is
//! read with [`buckets::lock_bucket`], so two admissions to the same bucket
//! cannot both see the last free slot.

use super::{ServiceError, ServiceResult};
use crate::store::{buckets, items};
use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;
use tracing::debug;

/// A bucket's load at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Occupancy {
    pub occupancy: i64,
    pub capacity: i64,
}

impl Occupancy {
    pub fn has_room(&self) -> bool {
        self.occupancy < self.capacity
    }
}

/// Lock the bucket row and count the items occupying it at `now`.
///
/// Fails with `BucketNotFound` if the bucket is missing or retired.
pub async fn evaluate(
    conn: &mut SqliteConnection,
    bucket_id: i64,
    now: DateTime<Utc>,
) -> ServiceResult<Occupancy> {
    let bucket = buckets::lock_bucket(&mut *conn, bucket_id)
        .await?
        .ok_or(ServiceError::BucketNotFound(bucket_id))?;
    let occupancy = items::count_active_items(conn, bucket.id, now).await?;

    Ok(Occupancy {
        occupancy,
        capacity: bucket.capacity,
    })
}

/// Decide whether one more item may enter `bucket_id`.
pub async fn admit(
    conn: &mut SqliteConnection,
    bucket_id: i64,
    now: DateTime<Utc>,
) -> ServiceResult<()> {
    let load = evaluate(conn, bucket_id, now).await?;
    if !load.has_room() {
        return Err(ServiceError::BucketFull(bucket_id));
    }

    debug!(
        bucket_id,
        occupancy = load.occupancy,
        capacity = load.capacity,
        "admission granted"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{self, items::ItemInsert};
    use chrono::{Duration, TimeZone};
    use rust_decimal_macros::dec;
    use sqlx::SqlitePool;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
    }

    async fn seed_item(pool: &SqlitePool, bucket_id: i64, expires_at: DateTime<Utc>) -> i64 {
        let mut conn = pool.acquire().await.unwrap();
        items::insert_item(
            &mut conn,
            &ItemInsert {
                name: "Pear",
                price: dec!(2.50),
                created_at: t0(),
                expires_at,
                bucket_id: Some(bucket_id),
            },
        )
        .await
        .unwrap()
        .id
    }

    #[tokio::test]
    async fn counts_only_live_unexpired_items() {
        let pool = store::connect_in_memory().await.unwrap();
        let mut conn = pool.acquire().await.unwrap();
        let bucket = buckets::insert_bucket(&mut conn, "B", 5, t0()).await.unwrap();
        drop(conn);

        seed_item(&pool, bucket.id, t0() + Duration::hours(1)).await;
        // expires exactly at evaluation time: not counted
        seed_item(&pool, bucket.id, t0() + Duration::minutes(10)).await;
        let deleted = seed_item(&pool, bucket.id, t0() + Duration::hours(1)).await;

        let mut conn = pool.acquire().await.unwrap();
        items::retire_item(&mut conn, deleted, t0()).await.unwrap();
        drop(conn);

        let mut tx = pool.begin().await.unwrap();
        let load = evaluate(&mut tx, bucket.id, t0() + Duration::minutes(10))
            .await
            .unwrap();
        tx.commit().await.unwrap();

        assert_eq!(
            load,
            Occupancy {
                occupancy: 1,
                capacity: 5
            }
        );
    }

    #[tokio::test]
    async fn missing_or_retired_bucket_is_not_found() {
        let pool = store::connect_in_memory().await.unwrap();
        let mut conn = pool.acquire().await.unwrap();
        let bucket = buckets::insert_bucket(&mut conn, "B", 1, t0()).await.unwrap();
        buckets::retire_bucket(&mut conn, bucket.id, t0()).await.unwrap();
        drop(conn);

        let mut tx = pool.begin().await.unwrap();
        let retired = admit(&mut tx, bucket.id, t0()).await.unwrap_err();
        let missing = admit(&mut tx, 999, t0()).await.unwrap_err();
        tx.rollback().await.unwrap();

        assert!(matches!(retired, ServiceError::BucketNotFound(id) if id == bucket.id));
        assert!(matches!(missing, ServiceError::BucketNotFound(999)));
    }

    #[tokio::test]
    async fn full_bucket_rejects_admission() {
        let pool = store::connect_in_memory().await.unwrap();
        let mut conn = pool.acquire().await.unwrap();
        let bucket = buckets::insert_bucket(&mut conn, "B", 1, t0()).await.unwrap();
        drop(conn);
        seed_item(&pool, bucket.id, t0() + Duration::hours(1)).await;

        let mut tx = pool.begin().await.unwrap();
        let err = admit(&mut tx, bucket.id, t0()).await.unwrap_err();
        tx.rollback().await.unwrap();
        assert!(matches!(err, ServiceError::BucketFull(_)));

        // once the only item expires there is room again
        let mut tx = pool.begin().await.unwrap();
        admit(&mut tx, bucket.id, t0() + Duration::hours(1))
            .await
            .unwrap();
        tx.rollback().await.unwrap();
    }
}
