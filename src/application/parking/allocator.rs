//! Spot allocation: booking and releasing spots

use std::sync::Arc;

use tracing::{info, warn};

use super::locks::LotLocks;
use crate::domain::billing::compute_cost;
use crate::domain::{Caller, DomainError, DomainResult, RepositoryProvider, Reservation};
use crate::shared::clock::Clock;

pub struct SpotAllocator {
    repos: Arc<dyn RepositoryProvider>,
    locks: LotLocks,
    clock: Arc<dyn Clock>,
}

impl SpotAllocator {
    pub fn new(repos: Arc<dyn RepositoryProvider>, locks: LotLocks, clock: Arc<dyn Clock>) -> Self {
        Self {
            repos,
            locks,
            clock,
        }
    }

    /// Occupy the first available spot of a lot and open a reservation for
    /// the caller, stamped with the current time.
    pub async fn book_spot(&self, caller: &Caller, lot_id: i32) -> DomainResult<Reservation> {
        caller.require_driver()?;

        if self.repos.users().get_user_by_id(&caller.user_id).await?.is_none() {
            return Err(DomainError::not_found("User", "id", &caller.user_id));
        }

        let _guard = self.locks.lock(lot_id).await;

        let active = self.repos.reservations().active_for_user(&caller.user_id).await?;
        if let Some(current) = active.first() {
            metrics::counter!("parking_booking_rejections_total", "reason" => "already_parked")
                .increment(1);
            return Err(DomainError::Conflict(format!(
                "user already holds active reservation {}",
                current.reservation.id
            )));
        }

        let result = self
            .repos
            .reservations()
            .claim_spot(lot_id, &caller.user_id, self.clock.now())
            .await;

        match result {
            Ok(reservation) => {
                metrics::counter!("parking_bookings_total").increment(1);
                info!(
                    reservation_id = reservation.id,
                    lot_id,
                    spot_id = reservation.spot_id,
                    user_id = %caller.user_id,
                    "Spot booked"
                );
                Ok(reservation)
            }
            Err(e) => {
                if let DomainError::NoAvailableSpot(_) = e {
                    metrics::counter!("parking_booking_rejections_total", "reason" => "lot_full")
                        .increment(1);
                }
                warn!(lot_id, user_id = %caller.user_id, error = %e, "Booking rejected");
                Err(e)
            }
        }
    }

    /// Bill the caller's active reservation and free its spot.
    pub async fn release_spot(
        &self,
        caller: &Caller,
        reservation_id: i32,
    ) -> DomainResult<Reservation> {
        caller.require_driver()?;

        let details = self
            .repos
            .reservations()
            .find_details(reservation_id)
            .await?
            .filter(|d| d.reservation.user_id == caller.user_id)
            .ok_or_else(|| DomainError::not_found("Reservation", "id", reservation_id))?;

        if !details.reservation.is_active() {
            return Err(DomainError::AlreadyCompleted(reservation_id));
        }

        let _guard = self.locks.lock(details.lot_id).await;

        let entry = details.reservation.parking_timestamp;
        let exit = self.clock.now().max(entry);
        let cost = compute_cost(entry, exit, details.hourly_price)?;

        let closed = self
            .repos
            .reservations()
            .close_and_release(reservation_id, exit, cost)
            .await?;

        metrics::counter!("parking_releases_total").increment(1);
        info!(
            reservation_id,
            lot_id = details.lot_id,
            spot_id = closed.spot_id,
            %cost,
            "Spot released"
        );
        Ok(closed)
    }
}
