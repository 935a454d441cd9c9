//! Core data models: buckets, items and the listing aggregate.
//!
//! Row types map to the `buckets` and `items` tables and serialize as JSON
//! via `serde` for the HTTP layer.

pub mod bucket;
pub mod item;
