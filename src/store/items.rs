//! Queries against the `items` table.
//!
//! Prices are stored as canonical decimal text and parsed back into
//! `Decimal` on read; a row that fails to parse surfaces as a decode error.

use crate::models::item::Item;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, QueryBuilder, SqliteConnection, sqlite::Sqlite};
use std::{collections::HashMap, str::FromStr};

const ITEM_COLUMNS: &str = "id, name, price, created_at, expires_at, deleted_at, bucket_id";

#[derive(Debug, FromRow)]
struct ItemRow {
    id: i64,
    name: String,
    price: String,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
    bucket_id: Option<i64>,
}

impl TryFrom<ItemRow> for Item {
    type Error = sqlx::Error;

    fn try_from(row: ItemRow) -> Result<Self, Self::Error> {
        Ok(Item {
            id: row.id,
            name: row.name,
            price: parse_price(&row.price)?,
            created_at: row.created_at,
            expires_at: row.expires_at,
            deleted_at: row.deleted_at,
            bucket_id: row.bucket_id,
        })
    }
}

fn parse_price(raw: &str) -> Result<Decimal, sqlx::Error> {
    Decimal::from_str(raw).map_err(|err| sqlx::Error::Decode(Box::new(err)))
}

/// Column values for a new item row.
#[derive(Debug, Clone)]
pub struct ItemInsert<'a> {
    pub name: &'a str,
    pub price: Decimal,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub bucket_id: Option<i64>,
}

pub async fn insert_item(
    conn: &mut SqliteConnection,
    item: &ItemInsert<'_>,
) -> Result<Item, sqlx::Error> {
    let row = sqlx::query_as::<_, ItemRow>(&format!(
        "INSERT INTO items (name, price, created_at, expires_at, bucket_id)
         VALUES (?, ?, ?, ?, ?)
         RETURNING {ITEM_COLUMNS}"
    ))
    .bind(item.name)
    .bind(item.price.to_string())
    .bind(item.created_at)
    .bind(item.expires_at)
    .bind(item.bucket_id)
    .fetch_one(conn)
    .await?;

    Item::try_from(row)
}

/// Fetch a non-deleted item. Expired items are still returned.
pub async fn find_item(conn: &mut SqliteConnection, id: i64) -> Result<Option<Item>, sqlx::Error> {
    let row = sqlx::query_as::<_, ItemRow>(&format!(
        "SELECT {ITEM_COLUMNS} FROM items WHERE id = ? AND deleted_at IS NULL"
    ))
    .bind(id)
    .fetch_optional(conn)
    .await?;

    row.map(Item::try_from).transpose()
}

/// Number of items occupying `bucket_id` at `now`.
pub async fn count_active_items(
    conn: &mut SqliteConnection,
    bucket_id: i64,
    now: DateTime<Utc>,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM items
         WHERE bucket_id = ? AND deleted_at IS NULL AND expires_at > ?",
    )
    .bind(bucket_id)
    .bind(now)
    .fetch_one(conn)
    .await
}

/// Sum of prices of the items occupying each of `bucket_ids` at `now`.
///
/// Buckets without active items are absent from the map.
pub async fn sum_active_prices(
    conn: &mut SqliteConnection,
    bucket_ids: &[i64],
    now: DateTime<Utc>,
) -> Result<HashMap<i64, Decimal>, sqlx::Error> {
    let mut totals = HashMap::new();
    if bucket_ids.is_empty() {
        return Ok(totals);
    }

    let mut builder = QueryBuilder::<Sqlite>::new(
        "SELECT bucket_id, price FROM items WHERE deleted_at IS NULL AND expires_at > ",
    );
    builder.push_bind(now);
    builder.push(" AND bucket_id IN (");
    let mut ids = builder.separated(", ");
    for id in bucket_ids {
        ids.push_bind(*id);
    }
    ids.push_unseparated(")");

    let rows: Vec<(i64, String)> = builder.build_query_as().fetch_all(conn).await?;
    for (bucket_id, price) in rows {
        *totals.entry(bucket_id).or_insert(Decimal::ZERO) += parse_price(&price)?;
    }

    Ok(totals)
}

/// Point a live item at `bucket_id`. Returns the number of rows touched.
pub async fn set_item_bucket(
    conn: &mut SqliteConnection,
    item_id: i64,
    bucket_id: i64,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("UPDATE items SET bucket_id = ? WHERE id = ? AND deleted_at IS NULL")
        .bind(bucket_id)
        .bind(item_id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected())
}

/// Detach a live item from whatever bucket holds it.
pub async fn clear_item_bucket(conn: &mut SqliteConnection, item_id: i64) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("UPDATE items SET bucket_id = NULL WHERE id = ? AND deleted_at IS NULL")
        .bind(item_id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected())
}

/// Soft-delete an item. An already-deleted item keeps its first timestamp.
pub async fn retire_item(
    conn: &mut SqliteConnection,
    item_id: i64,
    at: DateTime<Utc>,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("UPDATE items SET deleted_at = ? WHERE id = ? AND deleted_at IS NULL")
        .bind(at)
        .bind(item_id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected())
}
