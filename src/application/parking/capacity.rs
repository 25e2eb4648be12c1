//! Lot capacity management: create, edit, resize and delete lots

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::info;

use super::locks::LotLocks;
use crate::domain::lot::validate_spot_count;
use crate::domain::{
    Caller, DomainError, DomainResult, LotDetails, LotOccupancy, ParkingLot, ParkingSpot,
    RepositoryProvider,
};

/// Fields of a lot as entered by an administrator
#[derive(Debug, Clone)]
pub struct NewLot {
    pub prime_location_name: String,
    pub price: Decimal,
    pub address: String,
    pub pin_code: String,
    pub maximum_spots: i32,
}

impl NewLot {
    fn validate(&self) -> DomainResult<(LotDetails, u64)> {
        let details = LotDetails::new(
            &self.prime_location_name,
            self.price,
            &self.address,
            &self.pin_code,
        )?;
        let spots = validate_spot_count(self.maximum_spots)?;
        Ok((details, spots))
    }
}

pub struct LotCapacityManager {
    repos: Arc<dyn RepositoryProvider>,
    locks: LotLocks,
}

impl LotCapacityManager {
    pub fn new(repos: Arc<dyn RepositoryProvider>, locks: LotLocks) -> Self {
        Self { repos, locks }
    }

    // ── Commands (admin) ────────────────────────────────────────

    /// Create a lot together with `maximum_spots` available spots.
    pub async fn create_lot(&self, caller: &Caller, lot: NewLot) -> DomainResult<ParkingLot> {
        caller.require_admin()?;
        let (details, spots) = lot.validate()?;

        let created = self.repos.lots().create_with_spots(details, spots).await?;
        info!(
            lot_id = created.id,
            name = %created.prime_location_name,
            spots = created.maximum_spots,
            "Parking lot created"
        );
        Ok(created)
    }

    /// Grow or shrink the spot pool of a lot to `new_max`.
    pub async fn resize_lot(
        &self,
        caller: &Caller,
        lot_id: i32,
        new_max: i32,
    ) -> DomainResult<ParkingLot> {
        caller.require_admin()?;
        validate_spot_count(new_max)?;

        let _guard = self.locks.lock(lot_id).await;
        let lot = self.repos.lots().resize(lot_id, new_max, None).await?;
        info!(lot_id, new_max, "Parking lot capacity changed");
        Ok(lot)
    }

    /// Replace the descriptive fields and price, then apply the resize rule.
    /// Nothing changes if the resize is refused.
    pub async fn update_lot(
        &self,
        caller: &Caller,
        lot_id: i32,
        lot: NewLot,
    ) -> DomainResult<ParkingLot> {
        caller.require_admin()?;
        let (details, _) = lot.validate()?;

        let _guard = self.locks.lock(lot_id).await;
        let updated = self
            .repos
            .lots()
            .resize(lot_id, lot.maximum_spots, Some(details))
            .await?;
        info!(lot_id, spots = updated.maximum_spots, "Parking lot updated");
        Ok(updated)
    }

    /// Delete a lot with its spots and reservation history.
    pub async fn delete_lot(&self, caller: &Caller, lot_id: i32) -> DomainResult<()> {
        caller.require_admin()?;

        {
            let _guard = self.locks.lock(lot_id).await;
            self.repos.lots().delete_cascade(lot_id).await?;
        }
        self.locks.forget(lot_id);

        info!(lot_id, "Parking lot deleted");
        Ok(())
    }

    // ── Queries ─────────────────────────────────────────────────

    /// Every lot with its live spot counts
    pub async fn list_lots(&self) -> DomainResult<Vec<LotOccupancy>> {
        self.repos.lots().occupancy().await
    }

    /// Lots with at least one available spot
    pub async fn available_lots(&self) -> DomainResult<Vec<LotOccupancy>> {
        let lots = self.repos.lots().occupancy().await?;
        Ok(lots.into_iter().filter(|l| l.counts.available > 0).collect())
    }

    pub async fn lot_spots(&self, caller: &Caller, lot_id: i32) -> DomainResult<Vec<ParkingSpot>> {
        caller.require_admin()?;
        if self.repos.lots().find_by_id(lot_id).await?.is_none() {
            return Err(DomainError::not_found("ParkingLot", "id", lot_id));
        }
        self.repos.lots().spots(lot_id).await
    }
}
