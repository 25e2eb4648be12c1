//! Parking lot module: lot administration and occupancy queries

pub mod dto;
pub mod handlers;

pub use dto::*;
pub use handlers::*;
