//! Parking lot aggregate
//!
//! Contains the ParkingLot entity, capacity rules, and repository interface.

pub mod model;
pub mod repository;

pub use model::{
    validate_spot_count, CapacityPlan, LotDetails, LotOccupancy, ParkingLot, SpotCounts,
};
pub use repository::LotRepository;
