//! Parking lot domain entity and capacity rules

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::domain::money;
use crate::shared::errors::{DomainError, DomainResult};
use crate::shared::validations::non_blank;

/// A parking location with a fixed hourly price and a pool of spots
#[derive(Debug, Clone, PartialEq)]
pub struct ParkingLot {
    pub id: i32,
    pub prime_location_name: String,
    /// Price per started hour
    pub price: Decimal,
    pub address: String,
    pub pin_code: String,
    /// Declared number of spots; equals the live spot count after every resize
    pub maximum_spots: i32,
    pub created_at: DateTime<Utc>,
}

/// Descriptive fields of a lot, validated
#[derive(Debug, Clone, PartialEq)]
pub struct LotDetails {
    pub prime_location_name: String,
    pub price: Decimal,
    pub address: String,
    pub pin_code: String,
}

impl LotDetails {
    /// Validate and normalise lot fields.
    ///
    /// Price must be strictly positive after rounding to cents; text fields
    /// must not be blank.
    pub fn new(
        prime_location_name: &str,
        price: Decimal,
        address: &str,
        pin_code: &str,
    ) -> DomainResult<Self> {
        let price = price.round_dp(money::SCALE);
        if price <= Decimal::ZERO {
            return Err(DomainError::InvalidInput(format!(
                "price must be positive, got {}",
                price
            )));
        }

        let name = non_blank(prime_location_name)
            .ok_or_else(|| DomainError::InvalidInput("location name is required".into()))?;
        let address = non_blank(address)
            .ok_or_else(|| DomainError::InvalidInput("address is required".into()))?;
        let pin_code = non_blank(pin_code)
            .ok_or_else(|| DomainError::InvalidInput("pin code is required".into()))?;

        Ok(Self {
            prime_location_name: name.to_string(),
            price,
            address: address.to_string(),
            pin_code: pin_code.to_string(),
        })
    }
}

/// Spot counts for one lot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpotCounts {
    pub total: u64,
    pub available: u64,
    pub occupied: u64,
}

/// A lot together with its live spot counts
#[derive(Debug, Clone, PartialEq)]
pub struct LotOccupancy {
    pub lot: ParkingLot,
    pub counts: SpotCounts,
}

/// What a resize has to do to the spot pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapacityPlan {
    Unchanged,
    /// Append this many `Available` spots
    Grow(u64),
    /// Remove this many `Available` spots
    Shrink(u64),
}

impl CapacityPlan {
    /// Decide how to move a lot from `current` spots to `new_max`.
    ///
    /// Shrinking is only allowed when at least `current - new_max` spots are
    /// available; occupied spots are never removed.
    pub fn compute(current: u64, available: u64, new_max: i32) -> DomainResult<Self> {
        let target = validate_spot_count(new_max)?;

        if target > current {
            Ok(Self::Grow(target - current))
        } else if target < current {
            let deficit = current - target;
            if available < deficit {
                return Err(DomainError::CapacityConflict(format!(
                    "cannot remove {} spots: only {} of {} are available",
                    deficit, available, current
                )));
            }
            Ok(Self::Shrink(deficit))
        } else {
            Ok(Self::Unchanged)
        }
    }
}

/// A spot count must be strictly positive.
pub fn validate_spot_count(count: i32) -> DomainResult<u64> {
    if count <= 0 {
        return Err(DomainError::InvalidInput(format!(
            "maximum spots must be positive, got {}",
            count
        )));
    }
    Ok(count as u64)
}
