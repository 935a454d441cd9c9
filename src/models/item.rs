//! Represents a perishable item ("fruit"), optionally placed in a bucket.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

/// A single item.
///
/// An item counts toward its bucket's occupancy only while `deleted_at` is
/// unset and `expires_at` lies in the future. Once expired it is stale but
/// remains stored.
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct Item {
    /// Store-assigned identifier.
    pub id: i64,

    /// Display name, 1 to 128 characters.
    pub name: String,

    /// Non-negative price.
    pub price: Decimal,

    /// When this item was created.
    pub created_at: DateTime<Utc>,

    /// Instant after which the item no longer occupies a bucket slot.
    pub expires_at: DateTime<Utc>,

    /// Soft-delete marker.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,

    /// Owning bucket, if any.
    pub bucket_id: Option<i64>,
}

impl Item {
    /// Whether the item still occupies a slot at `now`.
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.deleted_at.is_none() && self.expires_at > now
    }
}

/// Input for creating an item. `ttl` is relative to the creation instant.
///
/// `price` and `ttl` are optional here so a missing value is reported as a
/// field violation alongside any others.
#[derive(Clone, Debug)]
pub struct NewItem {
    pub name: String,
    pub price: Option<Decimal>,
    pub ttl: Option<Duration>,
    pub bucket_id: Option<i64>,
}
