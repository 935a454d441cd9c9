//! Field checks for create requests. All checks run; every violation is
//! reported, not just the first.

use super::{FieldViolation, ServiceError, ServiceResult};
use crate::models::{bucket::NewBucket, item::NewItem};
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;

pub const NAME_MAX_CHARS: usize = 128;

#[derive(Debug, Default)]
struct Violations(Vec<FieldViolation>);

impl Violations {
    fn check(&mut self, ok: bool, field: &'static str, message: &str) {
        if !ok {
            self.0.push(FieldViolation::new(field, message));
        }
    }

    fn name(&mut self, name: &str) {
        let len = name.chars().count();
        self.check(len > 0, "name", "is required");
        self.check(
            len <= NAME_MAX_CHARS,
            "name",
            "must be at most 128 characters",
        );
    }

    fn finish(self) -> ServiceResult<()> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(ServiceError::Validation(self.0))
        }
    }
}

pub fn validate_new_bucket(input: &NewBucket) -> ServiceResult<()> {
    let mut violations = Violations::default();
    violations.name(&input.name);
    violations.check(input.capacity > 0, "capacity", "must be greater than 0");
    violations.finish()
}

/// Item fields that passed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckedItem {
    pub price: Decimal,
    pub expires_at: DateTime<Utc>,
}

/// Checks every field and resolves the expiry instant against `now`.
pub fn validate_new_item(input: &NewItem, now: DateTime<Utc>) -> ServiceResult<CheckedItem> {
    let mut violations = Violations::default();
    violations.name(&input.name);
    let price = match input.price {
        None => {
            violations.check(false, "price", "is required");
            Decimal::ZERO
        }
        Some(price) => {
            violations.check(
                price >= Decimal::ZERO,
                "price",
                "must be greater than or equal to 0",
            );
            price
        }
    };
    let expires_at = match input.ttl {
        None => {
            violations.check(false, "ttl", "is required");
            now
        }
        Some(ttl) if ttl <= Duration::zero() => {
            violations.check(false, "ttl", "must be greater than 0");
            now
        }
        Some(ttl) => match now.checked_add_signed(ttl) {
            Some(expires_at) => expires_at,
            None => {
                violations.check(false, "ttl", "is out of range");
                now
            }
        },
    };
    if let Some(bucket_id) = input.bucket_id {
        violations.check(bucket_id > 0, "bucket_id", "must be greater than 0");
    }
    violations.finish()?;

    Ok(CheckedItem { price, expires_at })
}
