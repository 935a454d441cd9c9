//! BucketService: create, list with occupancy aggregates, and retire-if-empty.

use super::{ServiceError, ServiceResult, validation};
use crate::{
    clock::Clock,
    models::bucket::{Bucket, BucketSummary, NewBucket, format_percent},
    store::{buckets, items},
};
use rust_decimal::Decimal;
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::debug;

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;

/// 1-indexed page selector for [`BucketService::list`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub page_size: i64,
}

impl PageRequest {
    /// Replace non-positive or unusable values with the defaults and cap the
    /// page size.
    pub fn normalized(page: i64, page_size: i64) -> Self {
        let page_size = if page_size <= 0 {
            DEFAULT_PAGE_SIZE
        } else {
            page_size.min(MAX_PAGE_SIZE)
        };
        let page = if page <= 0 || (page - 1).checked_mul(page_size).is_none() {
            DEFAULT_PAGE
        } else {
            page
        };
        Self { page, page_size }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.page_size
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

#[derive(Clone)]
pub struct BucketService {
    /// Shared SQLite connection pool.
    pub db: Arc<SqlitePool>,
    clock: Arc<dyn Clock>,
}

impl BucketService {
    pub fn new(db: Arc<SqlitePool>, clock: Arc<dyn Clock>) -> Self {
        Self { db, clock }
    }

    /// Validate and insert a new bucket.
    pub async fn create(&self, input: NewBucket) -> ServiceResult<Bucket> {
        self.create_inner(input).await.inspect_err(ServiceError::log)
    }

    async fn create_inner(&self, input: NewBucket) -> ServiceResult<Bucket> {
        validation::validate_new_bucket(&input)?;

        let mut conn = self.db.acquire().await?;
        let bucket =
            buckets::insert_bucket(&mut conn, &input.name, input.capacity, self.clock.now())
                .await?;

        debug!(bucket_id = bucket.id, capacity = bucket.capacity, "bucket created");
        Ok(bucket)
    }

    /// Fetch a non-retired bucket.
    pub async fn get(&self, bucket_id: i64) -> ServiceResult<Bucket> {
        self.get_inner(bucket_id).await.inspect_err(ServiceError::log)
    }

    async fn get_inner(&self, bucket_id: i64) -> ServiceResult<Bucket> {
        let mut conn = self.db.acquire().await?;
        buckets::find_bucket(&mut conn, bucket_id)
            .await?
            .ok_or(ServiceError::BucketNotFound(bucket_id))
    }

    /// List non-retired buckets, fullest first, with occupancy and total value
    /// evaluated now.
    pub async fn list(&self, page: PageRequest) -> ServiceResult<Vec<BucketSummary>> {
        self.list_inner(page).await.inspect_err(ServiceError::log)
    }

    async fn list_inner(&self, page: PageRequest) -> ServiceResult<Vec<BucketSummary>> {
        let page = PageRequest::normalized(page.page, page.page_size);
        let now = self.clock.now();

        // one read transaction so counts and sums see the same snapshot
        let mut tx = self.db.begin().await?;
        let rows = buckets::list_bucket_counts(&mut tx, now, page.page_size, page.offset()).await?;
        let ids: Vec<i64> = rows.iter().map(|row| row.id).collect();
        let totals = items::sum_active_prices(&mut tx, &ids, now).await?;
        tx.commit().await?;

        Ok(rows
            .into_iter()
            .map(|row| BucketSummary {
                total_value: totals.get(&row.id).copied().unwrap_or(Decimal::ZERO),
                percent: format_percent(row.total_items, row.capacity),
                id: row.id,
                name: row.name,
                capacity: row.capacity,
                total_items: row.total_items,
            })
            .collect())
    }

    /// Retire a bucket, but only while nothing occupies it.
    ///
    /// Fails with `BucketNotEmpty` if any live, unexpired item points at it.
    /// A missing or already retired bucket is a no-op.
    pub async fn delete(&self, bucket_id: i64) -> ServiceResult<()> {
        self.delete_inner(bucket_id).await.inspect_err(ServiceError::log)
    }

    async fn delete_inner(&self, bucket_id: i64) -> ServiceResult<()> {
        let now = self.clock.now();
        let mut tx = self.db.begin().await?;

        if buckets::lock_bucket(&mut tx, bucket_id).await?.is_none() {
            tx.commit().await?;
            debug!(bucket_id, "bucket already gone, nothing to delete");
            return Ok(());
        }

        let occupancy = items::count_active_items(&mut tx, bucket_id, now).await?;
        if occupancy > 0 {
            return Err(ServiceError::BucketNotEmpty(bucket_id));
        }

        buckets::retire_bucket(&mut tx, bucket_id, now).await?;
        tx.commit().await?;

        debug!(bucket_id, "bucket retired");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        clock::FixedClock,
        models::item::NewItem,
        services::item_service::ItemService,
        store,
    };
    use chrono::{Duration, TimeZone, Utc};
    use rust_decimal_macros::dec;

    async fn setup() -> (BucketService, ItemService, FixedClock) {
        let pool = Arc::new(store::connect_in_memory().await.unwrap());
        let clock = FixedClock::new(Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap());
        (
            BucketService::new(pool.clone(), Arc::new(clock.clone())),
            ItemService::new(pool, Arc::new(clock.clone())),
            clock,
        )
    }

    fn new_bucket(name: &str, capacity: i64) -> NewBucket {
        NewBucket {
            name: name.into(),
            capacity,
        }
    }

    fn new_item(price: Decimal, ttl: Duration, bucket_id: i64) -> NewItem {
        NewItem {
            name: "Orange".into(),
            price: Some(price),
            ttl: Some(ttl),
            bucket_id: Some(bucket_id),
        }
    }

    #[test]
    fn page_request_falls_back_to_defaults() {
        assert_eq!(PageRequest::normalized(0, 0), PageRequest::default());
        assert_eq!(PageRequest::normalized(-3, -1), PageRequest::default());
        assert_eq!(
            PageRequest::normalized(3, 500),
            PageRequest {
                page: 3,
                page_size: MAX_PAGE_SIZE
            }
        );
        assert_eq!(PageRequest::normalized(i64::MAX, 50).page, DEFAULT_PAGE);
        assert_eq!(PageRequest::normalized(3, 20).offset(), 40);
    }

    #[tokio::test]
    async fn create_stamps_now_and_keeps_fields() {
        let (buckets, _, clock) = setup().await;

        let bucket = buckets.create(new_bucket("Medium fruits", 2)).await.unwrap();

        assert!(bucket.id > 0);
        assert_eq!(bucket.name, "Medium fruits");
        assert_eq!(bucket.capacity, 2);
        assert_eq!(bucket.created_at, clock.now());
        assert_eq!(bucket.deleted_at, None);
        assert_eq!(buckets.get(bucket.id).await.unwrap(), bucket);
    }

    #[tokio::test]
    async fn create_lists_every_invalid_field() {
        let (buckets, _, _) = setup().await;

        let err = buckets.create(new_bucket("", 0)).await.unwrap_err();

        match err {
            ServiceError::Validation(violations) => {
                let fields: Vec<_> = violations.iter().map(|v| v.field).collect();
                assert_eq!(fields, vec!["name", "capacity"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn list_orders_by_fill_then_age_and_sums_values() {
        let (buckets, items, clock) = setup().await;

        let half = buckets.create(new_bucket("half", 2)).await.unwrap();
        clock.advance(Duration::seconds(1));
        let empty = buckets.create(new_bucket("empty", 3)).await.unwrap();
        clock.advance(Duration::seconds(1));
        let third = buckets.create(new_bucket("third", 3)).await.unwrap();
        clock.advance(Duration::seconds(1));
        let also_half = buckets.create(new_bucket("also half", 4)).await.unwrap();

        items
            .create(new_item(dec!(1.99), Duration::hours(1), half.id))
            .await
            .unwrap();
        items
            .create(new_item(dec!(3.50), Duration::hours(1), third.id))
            .await
            .unwrap();
        items
            .create(new_item(dec!(1.25), Duration::hours(1), also_half.id))
            .await
            .unwrap();
        items
            .create(new_item(dec!(0.75), Duration::hours(1), also_half.id))
            .await
            .unwrap();
        // expired before listing; contributes nothing
        items
            .create(new_item(dec!(100), Duration::seconds(5), empty.id))
            .await
            .unwrap();
        clock.advance(Duration::seconds(5));

        let listing = buckets.list(PageRequest::default()).await.unwrap();

        let order: Vec<_> = listing.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(order, vec!["half", "also half", "third", "empty"]);

        assert_eq!(listing[0].percent, "50.00%");
        assert_eq!(listing[0].total_value, dec!(1.99));
        assert_eq!(listing[1].total_items, 2);
        assert_eq!(listing[1].total_value, dec!(2.00));
        assert_eq!(listing[2].percent, "33.33%");
        assert_eq!(listing[3].total_items, 0);
        assert_eq!(listing[3].total_value, Decimal::ZERO);
        assert_eq!(listing[3].percent, "0.00%");
    }

    #[tokio::test]
    async fn list_paginates_and_hides_retired() {
        let (buckets, _, clock) = setup().await;
        let mut ids = Vec::new();
        for n in 0..5 {
            ids.push(buckets.create(new_bucket(&format!("b{n}"), 1)).await.unwrap().id);
            clock.advance(Duration::seconds(1));
        }
        buckets.delete(ids[0]).await.unwrap();

        let first = buckets
            .list(PageRequest {
                page: 1,
                page_size: 2,
            })
            .await
            .unwrap();
        let last = buckets
            .list(PageRequest {
                page: 2,
                page_size: 3,
            })
            .await
            .unwrap();

        assert_eq!(
            first.iter().map(|b| b.id).collect::<Vec<_>>(),
            vec![ids[1], ids[2]]
        );
        assert_eq!(last.iter().map(|b| b.id).collect::<Vec<_>>(), vec![ids[4]]);
    }

    #[tokio::test]
    async fn delete_requires_an_empty_bucket() {
        let (buckets, items, clock) = setup().await;
        let bucket = buckets.create(new_bucket("B", 2)).await.unwrap();
        items
            .create(new_item(dec!(1), Duration::seconds(1), bucket.id))
            .await
            .unwrap();

        let err = buckets.delete(bucket.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::BucketNotEmpty(id) if id == bucket.id));
        assert!(buckets.get(bucket.id).await.is_ok());

        clock.advance(Duration::seconds(1));
        buckets.delete(bucket.id).await.unwrap();

        assert!(matches!(
            buckets.get(bucket.id).await,
            Err(ServiceError::BucketNotFound(_))
        ));
    }

    #[tokio::test]
    async fn delete_is_a_no_op_for_unknown_or_retired_buckets() {
        let (buckets, _, _) = setup().await;
        let bucket = buckets.create(new_bucket("B", 1)).await.unwrap();

        buckets.delete(bucket.id).await.unwrap();
        buckets.delete(bucket.id).await.unwrap();
        buckets.delete(12345).await.unwrap();
    }
}
