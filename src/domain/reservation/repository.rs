//! Reservation repository interface
//!
//! Combines the ledger operations (open/close) with the two atomic
//! spot/reservation transitions used by the allocator.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use super::model::{Reservation, ReservationDetails};
use crate::domain::DomainResult;

#[async_trait]
pub trait ReservationRepository: Send + Sync {
    /// Open an active reservation on a spot that is already occupied.
    ///
    /// Fails with `InvalidState` if the spot is available and with
    /// `Conflict` if it already has an active reservation.
    async fn open(
        &self,
        spot_id: i32,
        user_id: &str,
        entry_time: DateTime<Utc>,
    ) -> DomainResult<Reservation>;

    /// Close an active reservation with its exit time and cost, and free
    /// its spot, in one transaction.
    ///
    /// Fails with `InvalidState` unless the reservation is active.
    async fn close(
        &self,
        id: i32,
        exit_time: DateTime<Utc>,
        cost: Decimal,
    ) -> DomainResult<Reservation>;

    /// Claim the lowest-id available spot of a lot and open a reservation
    /// on it, in one transaction.
    ///
    /// Fails with `NoAvailableSpot` when the lot is full.
    async fn claim_spot(
        &self,
        lot_id: i32,
        user_id: &str,
        entry_time: DateTime<Utc>,
    ) -> DomainResult<Reservation>;

    /// Close the reservation and free its spot in one transaction.
    async fn close_and_release(
        &self,
        id: i32,
        exit_time: DateTime<Utc>,
        cost: Decimal,
    ) -> DomainResult<Reservation>;

    /// Find reservation by ID together with its spot and lot
    async fn find_details(&self, id: i32) -> DomainResult<Option<ReservationDetails>>;

    /// Active reservations of a user
    async fn active_for_user(&self, user_id: &str) -> DomainResult<Vec<ReservationDetails>>;

    /// Most recent reservations of a user first, at most `limit`
    async fn history(&self, user_id: &str, limit: u64) -> DomainResult<Vec<ReservationDetails>>;

    /// Every reservation of a user (any status)
    async fn find_all_for_user(&self, user_id: &str) -> DomainResult<Vec<Reservation>>;

    /// Number of active reservations across all lots
    async fn count_active(&self) -> DomainResult<u64>;
}
