//! Reservation aggregate
//!
//! Contains the Reservation entity, related types, and repository interface.

pub mod model;
pub mod repository;

pub use model::{monthly_usage, MonthlyUsage, Reservation, ReservationDetails, ReservationStatus};
pub use repository::ReservationRepository;
