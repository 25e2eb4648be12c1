//! Parking lot DTOs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::application::NewLot;
use crate::domain::{LotOccupancy, ParkingLot, ParkingSpot};

/// Parking lot as stored
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LotResponse {
    pub id: i32,
    pub prime_location_name: String,
    /// Hourly price, decimal string
    pub price: Decimal,
    pub address: String,
    pub pin_code: String,
    pub maximum_spots: i32,
    pub created_at: DateTime<Utc>,
}

impl From<ParkingLot> for LotResponse {
    fn from(l: ParkingLot) -> Self {
        Self {
            id: l.id,
            prime_location_name: l.prime_location_name,
            price: l.price,
            address: l.address,
            pin_code: l.pin_code,
            maximum_spots: l.maximum_spots,
            created_at: l.created_at,
        }
    }
}

/// Lot with live spot counts
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LotOccupancyResponse {
    pub lot: LotResponse,
    pub total_spots: u64,
    pub available_spots: u64,
    pub occupied_spots: u64,
}

impl From<LotOccupancy> for LotOccupancyResponse {
    fn from(o: LotOccupancy) -> Self {
        Self {
            lot: o.lot.into(),
            total_spots: o.counts.total,
            available_spots: o.counts.available,
            occupied_spots: o.counts.occupied,
        }
    }
}

/// Compact per-lot counts for occupancy charts
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OccupancyEntry {
    pub lot_id: i32,
    pub prime_location_name: String,
    pub available: u64,
    pub occupied: u64,
}

impl From<LotOccupancy> for OccupancyEntry {
    fn from(o: LotOccupancy) -> Self {
        Self {
            lot_id: o.lot.id,
            prime_location_name: o.lot.prime_location_name,
            available: o.counts.available,
            occupied: o.counts.occupied,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SpotResponse {
    pub id: i32,
    pub lot_id: i32,
    /// `Available` or `Occupied`
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl From<ParkingSpot> for SpotResponse {
    fn from(s: ParkingSpot) -> Self {
        Self {
            id: s.id,
            lot_id: s.lot_id,
            status: s.status.to_string(),
            created_at: s.created_at,
        }
    }
}

/// Body of both lot creation and full lot edit
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LotRequest {
    #[validate(length(min = 1, max = 100, message = "location name must be 1-100 characters"))]
    pub prime_location_name: String,
    /// Hourly price; must be positive
    #[schema(value_type = String, example = "20.00")]
    pub price: Decimal,
    #[validate(length(min = 1, max = 200, message = "address must be 1-200 characters"))]
    pub address: String,
    #[validate(length(min = 1, max = 10, message = "pin code must be 1-10 characters"))]
    pub pin_code: String,
    #[validate(range(min = 1, max = 10000, message = "must be between 1 and 10000"))]
    pub maximum_spots: i32,
}

impl From<LotRequest> for NewLot {
    fn from(r: LotRequest) -> Self {
        Self {
            prime_location_name: r.prime_location_name,
            price: r.price,
            address: r.address,
            pin_code: r.pin_code,
            maximum_spots: r.maximum_spots,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ResizeLotRequest {
    #[validate(range(min = 1, max = 10000, message = "must be between 1 and 10000"))]
    pub maximum_spots: i32,
}
