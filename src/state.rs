//! Shared state handed to every handler.

use crate::{
    clock::Clock,
    services::{bucket_service::BucketService, item_service::ItemService},
};
use sqlx::SqlitePool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<SqlitePool>,
    pub buckets: BucketService,
    pub items: ItemService,
}

impl AppState {
    pub fn new(db: Arc<SqlitePool>, clock: Arc<dyn Clock>) -> Self {
        Self {
            buckets: BucketService::new(db.clone(), clock.clone()),
            items: ItemService::new(db.clone(), clock),
            db,
        }
    }
}
