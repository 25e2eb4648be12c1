//! Reservation module: booking, release and parking history

pub mod dto;
pub mod handlers;

pub use dto::*;
pub use handlers::*;
