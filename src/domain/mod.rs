//! Domain layer: parking entities, rules and repository interfaces

pub mod billing;
pub mod caller;
pub mod lot;
pub mod money;
pub mod repositories;
pub mod reservation;
pub mod spot;
pub mod user;

pub use caller::Caller;
pub use lot::{CapacityPlan, LotDetails, LotOccupancy, LotRepository, ParkingLot, SpotCounts};
pub use repositories::{DomainResult, RepositoryProvider};
pub use reservation::{
    MonthlyUsage, Reservation, ReservationDetails, ReservationRepository, ReservationStatus,
};
pub use spot::{ParkingSpot, SpotStatus};
pub use user::{CreateUserDto, User, UserRepositoryInterface, UserSummary};

pub use crate::shared::errors::DomainError;
