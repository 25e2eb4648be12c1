//! Parking spot entity
//!
//! Spots are persisted and mutated only through the lot and reservation
//! repositories, which keep status and active reservation in step.

pub mod model;

pub use model::{ParkingSpot, SpotStatus};
