//! ItemService: create, move between buckets, detach, and soft-delete items.
//!
//! Anything that adds load to a bucket (create-in-bucket, assign) runs
//! [`capacity::admit`] and its write inside one transaction. Operations that
//! only lower load skip the check.

use super::{ServiceError, ServiceResult, capacity, validation};
use crate::{
    clock::Clock,
    models::item::{Item, NewItem},
    store::items::{self, ItemInsert},
};
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::debug;

#[derive(Clone)]
pub struct ItemService {
    /// Shared SQLite connection pool.
    pub db: Arc<SqlitePool>,
    clock: Arc<dyn Clock>,
}

impl ItemService {
    pub fn new(db: Arc<SqlitePool>, clock: Arc<dyn Clock>) -> Self {
        Self { db, clock }
    }

    /// Validate and insert an item, admitting it to its bucket if one is
    /// given.
    ///
    /// Validation happens before any database work, so an invalid request
    /// never reports `BucketNotFound` or `BucketFull`.
    pub async fn create(&self, input: NewItem) -> ServiceResult<Item> {
        self.create_inner(input).await.inspect_err(ServiceError::log)
    }

    async fn create_inner(&self, input: NewItem) -> ServiceResult<Item> {
        let now = self.clock.now();
        let checked = validation::validate_new_item(&input, now)?;

        let row = ItemInsert {
            name: &input.name,
            price: checked.price,
            created_at: now,
            expires_at: checked.expires_at,
            bucket_id: input.bucket_id,
        };

        let item = match input.bucket_id {
            None => {
                let mut conn = self.db.acquire().await?;
                items::insert_item(&mut conn, &row).await?
            }
            Some(bucket_id) => {
                let mut tx = self.db.begin().await?;
                capacity::admit(&mut tx, bucket_id, now).await?;
                let item = items::insert_item(&mut tx, &row).await?;
                tx.commit().await?;
                item
            }
        };

        debug!(item_id = item.id, bucket_id = ?item.bucket_id, "item created");
        Ok(item)
    }

    /// Fetch a non-deleted item, expired or not.
    pub async fn get(&self, item_id: i64) -> ServiceResult<Item> {
        self.get_inner(item_id).await.inspect_err(ServiceError::log)
    }

    async fn get_inner(&self, item_id: i64) -> ServiceResult<Item> {
        let mut conn = self.db.acquire().await?;
        items::find_item(&mut conn, item_id)
            .await?
            .ok_or(ServiceError::ItemNotFound(item_id))
    }

    /// Move an item into `bucket_id`.
    ///
    /// Only the destination's capacity is evaluated, whether or not the item
    /// currently sits in another bucket (or already in this one).
    pub async fn assign_to_bucket(&self, item_id: i64, bucket_id: i64) -> ServiceResult<()> {
        self.assign_inner(item_id, bucket_id)
            .await
            .inspect_err(ServiceError::log)
    }

    async fn assign_inner(&self, item_id: i64, bucket_id: i64) -> ServiceResult<()> {
        let now = self.clock.now();
        let mut tx = self.db.begin().await?;

        capacity::admit(&mut tx, bucket_id, now).await?;
        if items::set_item_bucket(&mut tx, item_id, bucket_id).await? == 0 {
            return Err(ServiceError::ItemNotFound(item_id));
        }

        tx.commit().await?;
        debug!(item_id, bucket_id, "item assigned");
        Ok(())
    }

    /// Detach an item from its bucket. Fails with `ItemNotFound` if the item
    /// is missing or deleted.
    pub async fn unassign_from_bucket(&self, item_id: i64) -> ServiceResult<()> {
        self.unassign_inner(item_id)
            .await
            .inspect_err(ServiceError::log)
    }

    async fn unassign_inner(&self, item_id: i64) -> ServiceResult<()> {
        let mut conn = self.db.acquire().await?;
        if items::clear_item_bucket(&mut conn, item_id).await? == 0 {
            return Err(ServiceError::ItemNotFound(item_id));
        }

        debug!(item_id, "item unassigned");
        Ok(())
    }

    /// Soft-delete an item. Deleting a missing or already deleted item
    /// succeeds without changes.
    pub async fn delete(&self, item_id: i64) -> ServiceResult<()> {
        self.delete_inner(item_id).await.inspect_err(ServiceError::log)
    }

    async fn delete_inner(&self, item_id: i64) -> ServiceResult<()> {
        let mut conn = self.db.acquire().await?;
        items::retire_item(&mut conn, item_id, self.clock.now()).await?;
        Ok(())
    }
}
