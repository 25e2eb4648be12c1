//! Parking spot domain entity

use chrono::{DateTime, Utc};

/// Spot status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpotStatus {
    /// Free to be booked
    Available,
    /// Held by exactly one active reservation
    Occupied,
}

impl SpotStatus {
    /// Single-letter code used in storage
    pub fn code(&self) -> &'static str {
        match self {
            Self::Available => "A",
            Self::Occupied => "O",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "Available",
            Self::Occupied => "Occupied",
        }
    }
}

impl std::fmt::Display for SpotStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An individually bookable unit within a lot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParkingSpot {
    pub id: i32,
    pub lot_id: i32,
    pub status: SpotStatus,
    pub created_at: DateTime<Utc>,
}

impl ParkingSpot {
    pub fn is_available(&self) -> bool {
        self.status == SpotStatus::Available
    }
}
