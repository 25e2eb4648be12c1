//! Reservation DTOs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::{MonthlyUsage, Reservation, ReservationDetails};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ReservationResponse {
    pub id: i32,
    pub spot_id: i32,
    pub user_id: String,
    pub parking_timestamp: DateTime<Utc>,
    pub leaving_timestamp: Option<DateTime<Utc>>,
    /// Billed amount, set on release
    pub parking_cost: Option<Decimal>,
    /// `active` or `completed`
    pub status: String,
}

impl From<Reservation> for ReservationResponse {
    fn from(r: Reservation) -> Self {
        Self {
            id: r.id,
            spot_id: r.spot_id,
            user_id: r.user_id,
            parking_timestamp: r.parking_timestamp,
            leaving_timestamp: r.leaving_timestamp,
            parking_cost: r.parking_cost,
            status: r.status.to_string(),
        }
    }
}

/// Reservation joined with its spot and lot
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ReservationDetailsResponse {
    pub reservation: ReservationResponse,
    pub lot_id: i32,
    pub prime_location_name: String,
    pub address: String,
    pub hourly_price: Decimal,
}

impl From<ReservationDetails> for ReservationDetailsResponse {
    fn from(d: ReservationDetails) -> Self {
        Self {
            reservation: d.reservation.into(),
            lot_id: d.lot_id,
            prime_location_name: d.prime_location_name,
            address: d.address,
            hourly_price: d.hourly_price,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MonthlyUsageResponse {
    /// `YYYY-MM`
    pub month: String,
    pub bookings: u64,
    pub total_cost: Decimal,
}

impl From<MonthlyUsage> for MonthlyUsageResponse {
    fn from(m: MonthlyUsage) -> Self {
        Self {
            month: m.month,
            bookings: m.bookings,
            total_cost: m.total_cost,
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct HistoryQuery {
    /// Maximum number of reservations, newest first
    pub limit: Option<u64>,
}
