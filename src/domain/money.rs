//! Money amounts are `Decimal` in the domain and minor units (cents) in storage.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::shared::errors::{DomainError, DomainResult};

/// Fractional digits kept for prices and costs.
pub const SCALE: u32 = 2;

/// Convert an amount to minor units, rounding half away from zero.
pub fn to_minor_units(amount: Decimal) -> DomainResult<i64> {
    amount
        .round_dp_with_strategy(SCALE, RoundingStrategy::MidpointAwayFromZero)
        .checked_mul(Decimal::from(100))
        .and_then(|cents| cents.to_i64())
        .ok_or_else(|| DomainError::InvalidInput(format!("amount {} is out of range", amount)))
}

pub fn from_minor_units(cents: i64) -> Decimal {
    Decimal::new(cents, SCALE)
}
