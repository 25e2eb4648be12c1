//! Billing calculator
//!
//! Parking is charged per started hour with a one-hour minimum:
//! `hours = max(1, ceil(seconds / 3600))`, `cost = hours * hourly_price`.
//! Both timestamps are supplied by the caller; nothing here reads the clock.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::shared::errors::{DomainError, DomainResult};

const MILLIS_PER_HOUR: i64 = 3_600_000;

/// Number of billable hours between `entry` and `exit`.
pub fn billable_hours(entry: DateTime<Utc>, exit: DateTime<Utc>) -> DomainResult<i64> {
    if exit < entry {
        return Err(DomainError::InvalidInput(format!(
            "exit time {} is before entry time {}",
            exit.to_rfc3339(),
            entry.to_rfc3339()
        )));
    }

    let elapsed_ms = (exit - entry).num_milliseconds();
    let hours = (elapsed_ms + MILLIS_PER_HOUR - 1) / MILLIS_PER_HOUR;
    Ok(hours.max(1))
}

/// Cost of a stay at `hourly_price`.
pub fn compute_cost(
    entry: DateTime<Utc>,
    exit: DateTime<Utc>,
    hourly_price: Decimal,
) -> DomainResult<Decimal> {
    if hourly_price < Decimal::ZERO {
        return Err(DomainError::InvalidInput(format!(
            "hourly price must not be negative, got {}",
            hourly_price
        )));
    }

    let hours = billable_hours(entry, exit)?;
    Ok(Decimal::from(hours) * hourly_price)
}
