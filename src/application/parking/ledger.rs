//! Reservation ledger: opening, closing and reporting on reservations

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::debug;

use crate::domain::reservation::monthly_usage;
use crate::domain::{
    DomainResult, MonthlyUsage, RepositoryProvider, Reservation, ReservationDetails,
};

pub struct ReservationLedger {
    repos: Arc<dyn RepositoryProvider>,
    /// How many months the monthly aggregate keeps
    months: usize,
}

impl ReservationLedger {
    pub fn new(repos: Arc<dyn RepositoryProvider>, months: usize) -> Self {
        Self { repos, months }
    }

    pub async fn open_reservation(
        &self,
        spot_id: i32,
        user_id: &str,
        entry_time: DateTime<Utc>,
    ) -> DomainResult<Reservation> {
        self.repos.reservations().open(spot_id, user_id, entry_time).await
    }

    pub async fn close_reservation(
        &self,
        reservation_id: i32,
        exit_time: DateTime<Utc>,
        cost: Decimal,
    ) -> DomainResult<Reservation> {
        self.repos.reservations().close(reservation_id, exit_time, cost).await
    }

    /// Most recent reservations first, joined with spot and lot
    pub async fn history(&self, user_id: &str, limit: u64) -> DomainResult<Vec<ReservationDetails>> {
        self.repos.reservations().history(user_id, limit).await
    }

    pub async fn active_for_user(&self, user_id: &str) -> DomainResult<Vec<ReservationDetails>> {
        self.repos.reservations().active_for_user(user_id).await
    }

    /// Bookings and spend per month of entry, newest month first
    pub async fn monthly_aggregate(&self, user_id: &str) -> DomainResult<Vec<MonthlyUsage>> {
        let reservations = self.repos.reservations().find_all_for_user(user_id).await?;
        let usage = monthly_usage(&reservations, self.months);
        debug!(user_id, months = usage.len(), "Monthly usage computed");
        Ok(usage)
    }
}
