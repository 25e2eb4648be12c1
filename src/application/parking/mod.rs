//! Parking use-cases

pub mod allocator;
pub mod capacity;
pub mod ledger;
pub mod locks;
pub mod overview;

pub use allocator::SpotAllocator;
pub use capacity::{LotCapacityManager, NewLot};
pub use ledger::ReservationLedger;
pub use locks::LotLocks;
pub use overview::{AdminOverview, AdminSummary};
