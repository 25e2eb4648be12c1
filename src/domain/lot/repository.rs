//! Parking lot repository interface

use async_trait::async_trait;

use super::model::{LotDetails, LotOccupancy, ParkingLot, SpotCounts};
use crate::domain::spot::ParkingSpot;
use crate::domain::DomainResult;

#[async_trait]
pub trait LotRepository: Send + Sync {
    /// Insert the lot and `maximum_spots` available spots in one transaction
    async fn create_with_spots(
        &self,
        details: LotDetails,
        maximum_spots: u64,
    ) -> DomainResult<ParkingLot>;

    /// Find lot by ID
    async fn find_by_id(&self, id: i32) -> DomainResult<Option<ParkingLot>>;

    /// All lots, oldest first
    async fn find_all(&self) -> DomainResult<Vec<ParkingLot>>;

    /// Spots of a lot ordered by ID
    async fn spots(&self, lot_id: i32) -> DomainResult<Vec<ParkingSpot>>;

    /// Live spot counts of one lot
    async fn counts(&self, lot_id: i32) -> DomainResult<SpotCounts>;

    /// Every lot with its live spot counts
    async fn occupancy(&self) -> DomainResult<Vec<LotOccupancy>>;

    /// Resize the spot pool to `new_max` and optionally replace the lot's
    /// descriptive fields, all-or-nothing.
    ///
    /// Fails with `CapacityConflict` when shrinking would need to remove an
    /// occupied spot.
    async fn resize(
        &self,
        lot_id: i32,
        new_max: i32,
        details: Option<LotDetails>,
    ) -> DomainResult<ParkingLot>;

    /// Remove the lot, its spots and all their reservations.
    ///
    /// Fails with `CapacityConflict` while any spot is occupied.
    async fn delete_cascade(&self, lot_id: i32) -> DomainResult<()>;
}
