//! Fruit inventory service: perishable items grouped into capacity-bounded
//! buckets, backed by SQLite.
//!
//! The interesting part lives in [`services`]: admission into a bucket is
//! decided and written inside one transaction that holds the bucket lock, so
//! a bucket never holds more live items than its capacity.

pub mod clock;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;
