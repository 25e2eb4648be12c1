//! Application layer: parking and identity use-cases
//!
//! Services validate the caller, serialize per lot where needed and
//! delegate persistence to the repositories. HTTP handlers stay thin.

pub mod identity;
pub mod parking;

pub use identity::{AuthResult, RegisterUser, UserService};
pub use parking::{
    AdminOverview, AdminSummary, LotCapacityManager, LotLocks, NewLot, ReservationLedger,
    SpotAllocator,
};
