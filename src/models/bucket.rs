//! A capacity-bounded container for items.

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A bucket row.
///
/// `capacity` bounds how many live items may point at the bucket at once.
/// Retired buckets keep their row with `deleted_at` set and are excluded
/// from every lookup, listing and admission check.
#[derive(Serialize, Deserialize, Clone, FromRow, Debug, PartialEq, Eq)]
pub struct Bucket {
    /// Store-assigned identifier.
    pub id: i64,

    /// Display label, 1 to 128 characters.
    pub name: String,

    /// Maximum number of simultaneously active items.
    pub capacity: i64,

    /// When this bucket was created.
    pub created_at: DateTime<Utc>,

    /// Soft-delete marker.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Input for creating a bucket.
#[derive(Deserialize, Clone, Debug)]
pub struct NewBucket {
    pub name: String,
    pub capacity: i64,
}

/// One row of the bucket listing, with occupancy aggregates computed at
/// query time.
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct BucketSummary {
    pub id: i64,
    pub name: String,
    pub capacity: i64,
    pub total_items: i64,
    pub total_value: Decimal,
    /// `total_items * 100 / capacity`, two decimals, e.g. `"33.33%"`.
    pub percent: String,
}

/// Format an occupancy ratio the way listings present it.
pub fn format_percent(total_items: i64, capacity: i64) -> String {
    if capacity <= 0 {
        return "0.00%".to_string();
    }
    let ratio = Decimal::from(total_items) * Decimal::ONE_HUNDRED / Decimal::from(capacity);
    format!(
        "{:.2}%",
        ratio.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    )
}
