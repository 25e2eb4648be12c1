//! SeaORM implementation of ReservationRepository
//!
//! Every write runs in one database transaction behind the shared
//! [`WriteGate`]. Status changes are guarded by conditional updates
//! (`... WHERE status = <expected>`) so two writers can never both win.
//! A spot is occupied exactly while it carries an active reservation:
//! opening requires an occupied spot, closing frees it.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use tracing::{debug, warn};

use crate::domain::money::{from_minor_units, to_minor_units};
use crate::domain::reservation::{
    Reservation, ReservationDetails, ReservationRepository, ReservationStatus,
};
use crate::domain::{DomainError, DomainResult};
use crate::infrastructure::database::entities::{parking_lot, parking_spot, reservation};
use crate::infrastructure::database::{commit_or_rollback, WriteGate};

/// Attempts at claiming a spot before reporting contention
const MAX_CLAIM_ATTEMPTS: usize = 3;

pub struct SeaOrmReservationRepository {
    db: DatabaseConnection,
    gate: WriteGate,
}

impl SeaOrmReservationRepository {
    pub fn new(db: DatabaseConnection, gate: WriteGate) -> Self {
        Self { db, gate }
    }
}

// ── Conversion helpers ──────────────────────────────────────────

fn status_to_domain(status: reservation::ReservationStatus) -> ReservationStatus {
    match status {
        reservation::ReservationStatus::Active => ReservationStatus::Active,
        reservation::ReservationStatus::Completed => ReservationStatus::Completed,
    }
}

fn model_to_domain(m: reservation::Model) -> Reservation {
    Reservation {
        id: m.id,
        spot_id: m.spot_id,
        user_id: m.user_id,
        parking_timestamp: m.parking_timestamp,
        leaving_timestamp: m.leaving_timestamp,
        parking_cost: m.parking_cost_cents.map(from_minor_units),
        status: status_to_domain(m.status),
    }
}

fn reservation_not_found(id: i32) -> DomainError {
    DomainError::not_found("Reservation", "id", id)
}

// ── Statement helpers (usable inside a transaction) ─────────────

async fn open_in<C: ConnectionTrait>(
    conn: &C,
    spot_id: i32,
    user_id: &str,
    entry_time: DateTime<Utc>,
) -> DomainResult<reservation::Model> {
    let active = reservation::Entity::find()
        .filter(reservation::Column::SpotId.eq(spot_id))
        .filter(reservation::Column::Status.eq(reservation::ReservationStatus::Active))
        .count(conn)
        .await?;
    if active > 0 {
        return Err(DomainError::Conflict(format!(
            "spot {} already has an active reservation",
            spot_id
        )));
    }

    let model = reservation::ActiveModel {
        spot_id: Set(spot_id),
        user_id: Set(user_id.to_string()),
        parking_timestamp: Set(entry_time),
        leaving_timestamp: Set(None),
        parking_cost_cents: Set(None),
        status: Set(reservation::ReservationStatus::Active),
        ..Default::default()
    }
    .insert(conn)
    .await?;

    Ok(model)
}

async fn close_in<C: ConnectionTrait>(
    conn: &C,
    id: i32,
    exit_time: DateTime<Utc>,
    cost: Decimal,
) -> DomainResult<reservation::Model> {
    let existing = reservation::Entity::find_by_id(id)
        .one(conn)
        .await?
        .ok_or_else(|| reservation_not_found(id))?;

    // Validates state, exit ordering and cost before touching the row
    let mut closing = model_to_domain(existing);
    closing.complete(exit_time, cost)?;
    let cost_cents = to_minor_units(cost)?;

    let result = reservation::Entity::update_many()
        .col_expr(
            reservation::Column::Status,
            Expr::value(reservation::ReservationStatus::Completed),
        )
        .col_expr(reservation::Column::LeavingTimestamp, Expr::value(exit_time))
        .col_expr(reservation::Column::ParkingCostCents, Expr::value(cost_cents))
        .filter(reservation::Column::Id.eq(id))
        .filter(reservation::Column::Status.eq(reservation::ReservationStatus::Active))
        .exec(conn)
        .await?;

    if result.rows_affected == 0 {
        return Err(DomainError::InvalidState(format!(
            "reservation {} is no longer active",
            id
        )));
    }

    reservation::Entity::find_by_id(id)
        .one(conn)
        .await?
        .ok_or_else(|| reservation_not_found(id))
}

/// Open a reservation on a spot the caller has already marked occupied.
async fn open_on_occupied_in<C: ConnectionTrait>(
    conn: &C,
    spot_id: i32,
    user_id: &str,
    entry_time: DateTime<Utc>,
) -> DomainResult<reservation::Model> {
    let spot = parking_spot::Entity::find_by_id(spot_id)
        .one(conn)
        .await?
        .ok_or_else(|| DomainError::not_found("ParkingSpot", "id", spot_id))?;
    if spot.status != parking_spot::SpotStatus::Occupied {
        return Err(DomainError::InvalidState(format!(
            "spot {} is not occupied",
            spot_id
        )));
    }

    open_in(conn, spot_id, user_id, entry_time).await
}

/// Flip a spot from occupied back to available.
async fn free_spot_in<C: ConnectionTrait>(
    conn: &C,
    spot_id: i32,
    reservation_id: i32,
) -> DomainResult<()> {
    let freed = parking_spot::Entity::update_many()
        .col_expr(
            parking_spot::Column::Status,
            Expr::value(parking_spot::SpotStatus::Available),
        )
        .filter(parking_spot::Column::Id.eq(spot_id))
        .filter(parking_spot::Column::Status.eq(parking_spot::SpotStatus::Occupied))
        .exec(conn)
        .await?;

    if freed.rows_affected != 1 {
        return Err(DomainError::InvalidState(format!(
            "spot {} of reservation {} is not occupied",
            spot_id, reservation_id
        )));
    }
    Ok(())
}

/// Close a reservation and free its spot.
async fn close_and_free_in<C: ConnectionTrait>(
    conn: &C,
    id: i32,
    exit_time: DateTime<Utc>,
    cost: Decimal,
) -> DomainResult<reservation::Model> {
    let closed = close_in(conn, id, exit_time, cost).await?;
    free_spot_in(conn, closed.spot_id, id).await?;
    Ok(closed)
}

/// Occupy the lowest-id available spot of a lot and open a reservation on it.
async fn claim_in<C: ConnectionTrait>(
    conn: &C,
    lot_id: i32,
    user_id: &str,
    entry_time: DateTime<Utc>,
) -> DomainResult<reservation::Model> {
    parking_lot::Entity::find_by_id(lot_id)
        .one(conn)
        .await?
        .ok_or_else(|| DomainError::not_found("ParkingLot", "id", lot_id))?;

    for attempt in 1..=MAX_CLAIM_ATTEMPTS {
        let candidate = parking_spot::Entity::find()
            .filter(parking_spot::Column::LotId.eq(lot_id))
            .filter(parking_spot::Column::Status.eq(parking_spot::SpotStatus::Available))
            .order_by_asc(parking_spot::Column::Id)
            .one(conn)
            .await?;

        let Some(spot) = candidate else {
            return Err(DomainError::NoAvailableSpot(lot_id));
        };

        let claimed = parking_spot::Entity::update_many()
            .col_expr(
                parking_spot::Column::Status,
                Expr::value(parking_spot::SpotStatus::Occupied),
            )
            .filter(parking_spot::Column::Id.eq(spot.id))
            .filter(parking_spot::Column::Status.eq(parking_spot::SpotStatus::Available))
            .exec(conn)
            .await?;

        if claimed.rows_affected == 1 {
            return open_in(conn, spot.id, user_id, entry_time).await;
        }

        warn!(lot_id, spot_id = spot.id, attempt, "Spot taken concurrently, retrying");
    }

    Err(DomainError::Conflict(format!(
        "lot {} is under contention, try again",
        lot_id
    )))
}

/// Join reservations with their spot's lot, preserving input order.
async fn attach_details<C: ConnectionTrait>(
    conn: &C,
    models: Vec<reservation::Model>,
) -> DomainResult<Vec<ReservationDetails>> {
    if models.is_empty() {
        return Ok(Vec::new());
    }

    let spot_ids: Vec<i32> = models.iter().map(|m| m.spot_id).collect();
    let spots: HashMap<i32, i32> = parking_spot::Entity::find()
        .filter(parking_spot::Column::Id.is_in(spot_ids))
        .all(conn)
        .await?
        .into_iter()
        .map(|s| (s.id, s.lot_id))
        .collect();

    let lot_ids: Vec<i32> = spots.values().copied().collect();
    let lots: HashMap<i32, parking_lot::Model> = parking_lot::Entity::find()
        .filter(parking_lot::Column::Id.is_in(lot_ids))
        .all(conn)
        .await?
        .into_iter()
        .map(|l| (l.id, l))
        .collect();

    models
        .into_iter()
        .map(|m| {
            let lot = spots
                .get(&m.spot_id)
                .and_then(|lot_id| lots.get(lot_id))
                .ok_or_else(|| DomainError::not_found("ParkingSpot", "id", m.spot_id))?;
            Ok(ReservationDetails {
                lot_id: lot.id,
                prime_location_name: lot.prime_location_name.clone(),
                address: lot.address.clone(),
                hourly_price: from_minor_units(lot.price_cents),
                reservation: model_to_domain(m),
            })
        })
        .collect()
}

// ── ReservationRepository impl ──────────────────────────────────

#[async_trait]
impl ReservationRepository for SeaOrmReservationRepository {
    async fn open(
        &self,
        spot_id: i32,
        user_id: &str,
        entry_time: DateTime<Utc>,
    ) -> DomainResult<Reservation> {
        let (_write, txn) = self.gate.begin(&self.db).await?;
        let result = open_on_occupied_in(&txn, spot_id, user_id, entry_time).await;
        let model = commit_or_rollback(txn, result).await?;

        debug!(reservation_id = model.id, spot_id, user_id, "Reservation opened");
        Ok(model_to_domain(model))
    }

    async fn close(
        &self,
        id: i32,
        exit_time: DateTime<Utc>,
        cost: Decimal,
    ) -> DomainResult<Reservation> {
        let (_write, txn) = self.gate.begin(&self.db).await?;
        let result = close_and_free_in(&txn, id, exit_time, cost).await;
        let model = commit_or_rollback(txn, result).await?;

        debug!(reservation_id = id, spot_id = model.spot_id, %cost, "Reservation closed");
        Ok(model_to_domain(model))
    }

    async fn claim_spot(
        &self,
        lot_id: i32,
        user_id: &str,
        entry_time: DateTime<Utc>,
    ) -> DomainResult<Reservation> {
        let (_write, txn) = self.gate.begin(&self.db).await?;
        let result = claim_in(&txn, lot_id, user_id, entry_time).await;
        let model = commit_or_rollback(txn, result).await?;

        debug!(
            reservation_id = model.id,
            lot_id,
            spot_id = model.spot_id,
            user_id,
            "Spot claimed"
        );
        Ok(model_to_domain(model))
    }

    async fn close_and_release(
        &self,
        id: i32,
        exit_time: DateTime<Utc>,
        cost: Decimal,
    ) -> DomainResult<Reservation> {
        let (_write, txn) = self.gate.begin(&self.db).await?;
        let result: DomainResult<reservation::Model> = async {
            let existing = reservation::Entity::find_by_id(id)
                .one(&txn)
                .await?
                .ok_or_else(|| reservation_not_found(id))?;
            if existing.status != reservation::ReservationStatus::Active {
                return Err(DomainError::AlreadyCompleted(id));
            }
            close_and_free_in(&txn, id, exit_time, cost).await
        }
        .await;
        let closed = commit_or_rollback(txn, result).await?;

        debug!(reservation_id = id, spot_id = closed.spot_id, %cost, "Spot released");
        Ok(model_to_domain(closed))
    }

    async fn find_details(&self, id: i32) -> DomainResult<Option<ReservationDetails>> {
        let Some(model) = reservation::Entity::find_by_id(id).one(&self.db).await? else {
            return Ok(None);
        };
        Ok(attach_details(&self.db, vec![model]).await?.into_iter().next())
    }

    async fn active_for_user(&self, user_id: &str) -> DomainResult<Vec<ReservationDetails>> {
        let models = reservation::Entity::find()
            .filter(reservation::Column::UserId.eq(user_id))
            .filter(reservation::Column::Status.eq(reservation::ReservationStatus::Active))
            .order_by_desc(reservation::Column::ParkingTimestamp)
            .all(&self.db)
            .await?;
        attach_details(&self.db, models).await
    }

    async fn history(&self, user_id: &str, limit: u64) -> DomainResult<Vec<ReservationDetails>> {
        let models = reservation::Entity::find()
            .filter(reservation::Column::UserId.eq(user_id))
            .order_by_desc(reservation::Column::ParkingTimestamp)
            .order_by_desc(reservation::Column::Id)
            .limit(limit)
            .all(&self.db)
            .await?;
        attach_details(&self.db, models).await
    }

    async fn find_all_for_user(&self, user_id: &str) -> DomainResult<Vec<Reservation>> {
        let models = reservation::Entity::find()
            .filter(reservation::Column::UserId.eq(user_id))
            .order_by_desc(reservation::Column::ParkingTimestamp)
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(model_to_domain).collect())
    }

    async fn count_active(&self) -> DomainResult<u64> {
        Ok(reservation::Entity::find()
            .filter(reservation::Column::Status.eq(reservation::ReservationStatus::Active))
            .count(&self.db)
            .await?)
    }
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SpotStatus;
    use crate::infrastructure::database::testing::{
        active_in_lot, insert_user, lot_details, memory_repos, occupy_spot,
    };
    use chrono::{Duration, TimeZone};

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, h, m, 0).unwrap()
    }

    #[tokio::test]
    async fn claim_takes_lowest_available_spot() {
        let (db, repos) = memory_repos().await;
        let alice = insert_user(&db, "alice", false).await;
        let bob = insert_user(&db, "bob", false).await;
        let lot = repos.lots().create_with_spots(lot_details("Central", 10), 3).await.unwrap();
        let spots = repos.lots().spots(lot.id).await.unwrap();

        let first = repos.reservations().claim_spot(lot.id, &alice, at(9, 0)).await.unwrap();
        let second = repos.reservations().claim_spot(lot.id, &bob, at(9, 5)).await.unwrap();

        assert_eq!(first.spot_id, spots[0].id);
        assert_eq!(second.spot_id, spots[1].id);
        assert!(first.is_active());

        let counts = repos.lots().counts(lot.id).await.unwrap();
        assert_eq!(counts.occupied, 2);
        assert_eq!(active_in_lot(&db, lot.id).await, 2);
    }

    #[tokio::test]
    async fn claim_on_full_lot_fails() {
        let (db, repos) = memory_repos().await;
        let alice = insert_user(&db, "alice", false).await;
        let bob = insert_user(&db, "bob", false).await;
        let lot = repos.lots().create_with_spots(lot_details("Tiny", 10), 1).await.unwrap();

        repos.reservations().claim_spot(lot.id, &alice, at(9, 0)).await.unwrap();
        let err = repos.reservations().claim_spot(lot.id, &bob, at(9, 1)).await.unwrap_err();

        assert_eq!(err, DomainError::NoAvailableSpot(lot.id));
        assert_eq!(repos.reservations().count_active().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn claim_on_missing_lot_is_not_found() {
        let (db, repos) = memory_repos().await;
        let alice = insert_user(&db, "alice", false).await;

        let err = repos.reservations().claim_spot(42, &alice, at(9, 0)).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));
    }

    #[tokio::test]
    async fn release_frees_spot_and_records_cost() {
        let (db, repos) = memory_repos().await;
        let alice = insert_user(&db, "alice", false).await;
        let lot = repos.lots().create_with_spots(lot_details("Central", 10), 2).await.unwrap();

        let r = repos.reservations().claim_spot(lot.id, &alice, at(9, 0)).await.unwrap();
        let closed = repos
            .reservations()
            .close_and_release(r.id, at(10, 30), Decimal::from(20))
            .await
            .unwrap();

        assert_eq!(closed.status, ReservationStatus::Completed);
        assert_eq!(closed.parking_cost, Some(Decimal::from(20)));
        assert_eq!(closed.leaving_timestamp, Some(at(10, 30)));

        let spots = repos.lots().spots(lot.id).await.unwrap();
        assert!(spots.iter().all(|s| s.status == SpotStatus::Available));

        let err = repos
            .reservations()
            .close_and_release(r.id, at(11, 0), Decimal::from(20))
            .await
            .unwrap_err();
        assert_eq!(err, DomainError::AlreadyCompleted(r.id));
    }

    #[tokio::test]
    async fn open_rejects_second_active_reservation_on_spot() {
        let (db, repos) = memory_repos().await;
        let alice = insert_user(&db, "alice", false).await;
        let lot = repos.lots().create_with_spots(lot_details("Central", 10), 1).await.unwrap();
        let spot_id = repos.lots().spots(lot.id).await.unwrap()[0].id;
        occupy_spot(&db, spot_id).await;

        repos.reservations().open(spot_id, &alice, at(9, 0)).await.unwrap();
        let err = repos.reservations().open(spot_id, &alice, at(9, 1)).await.unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[tokio::test]
    async fn open_on_available_spot_leaves_it_bookable() {
        let (db, repos) = memory_repos().await;
        let alice = insert_user(&db, "alice", false).await;
        let bob = insert_user(&db, "bob", false).await;
        let lot = repos.lots().create_with_spots(lot_details("Central", 10), 2).await.unwrap();
        let spots = repos.lots().spots(lot.id).await.unwrap();

        let err = repos.reservations().open(spots[0].id, &alice, at(9, 0)).await.unwrap_err();
        assert!(matches!(err, DomainError::InvalidState(_)));
        assert_eq!(repos.reservations().count_active().await.unwrap(), 0);

        let claimed = repos.reservations().claim_spot(lot.id, &bob, at(9, 5)).await.unwrap();
        assert_eq!(claimed.spot_id, spots[0].id);
        assert_eq!(active_in_lot(&db, lot.id).await, 1);

        let err = repos.reservations().open(9999, &alice, at(9, 0)).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));
    }

    #[tokio::test]
    async fn close_frees_the_spot() {
        let (db, repos) = memory_repos().await;
        let alice = insert_user(&db, "alice", false).await;
        let bob = insert_user(&db, "bob", false).await;
        let lot = repos.lots().create_with_spots(lot_details("Tiny", 10), 1).await.unwrap();

        let r = repos.reservations().claim_spot(lot.id, &alice, at(9, 0)).await.unwrap();
        let closed = repos.reservations().close(r.id, at(10, 0), Decimal::from(10)).await.unwrap();
        assert_eq!(closed.status, ReservationStatus::Completed);

        let counts = repos.lots().counts(lot.id).await.unwrap();
        assert_eq!((counts.available, counts.occupied), (1, 0));
        assert_eq!(active_in_lot(&db, lot.id).await, 0);

        let next = repos.reservations().claim_spot(lot.id, &bob, at(10, 5)).await.unwrap();
        assert_eq!(next.spot_id, r.spot_id);
    }

    #[tokio::test]
    async fn close_twice_is_invalid_state() {
        let (db, repos) = memory_repos().await;
        let alice = insert_user(&db, "alice", false).await;
        let lot = repos.lots().create_with_spots(lot_details("Central", 10), 1).await.unwrap();
        let spot_id = repos.lots().spots(lot.id).await.unwrap()[0].id;
        occupy_spot(&db, spot_id).await;

        let r = repos.reservations().open(spot_id, &alice, at(9, 0)).await.unwrap();
        repos.reservations().close(r.id, at(10, 0), Decimal::from(10)).await.unwrap();

        let err = repos
            .reservations()
            .close(r.id, at(11, 0), Decimal::from(20))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidState(_)));

        let details = repos.reservations().find_details(r.id).await.unwrap().unwrap();
        assert_eq!(details.reservation.parking_cost, Some(Decimal::from(10)));
        assert_eq!(repos.lots().counts(lot.id).await.unwrap().occupied, 0);
    }

    #[tokio::test]
    async fn history_is_newest_first_and_limited() {
        let (db, repos) = memory_repos().await;
        let alice = insert_user(&db, "alice", false).await;
        let lot = repos.lots().create_with_spots(lot_details("Central", 10), 1).await.unwrap();

        for i in 0..4 {
            let entry = at(8, 0) + Duration::hours(i * 2);
            let r = repos.reservations().claim_spot(lot.id, &alice, entry).await.unwrap();
            repos
                .reservations()
                .close_and_release(r.id, entry + Duration::hours(1), Decimal::from(10))
                .await
                .unwrap();
        }

        let history = repos.reservations().history(&alice, 3).await.unwrap();
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].reservation.parking_timestamp, at(14, 0));
        assert_eq!(history[2].reservation.parking_timestamp, at(10, 0));
        assert_eq!(history[0].prime_location_name, "Central");
        assert_eq!(history[0].hourly_price, Decimal::from(10));
    }

    #[tokio::test]
    async fn active_count_matches_occupied_spots() {
        let (db, repos) = memory_repos().await;
        let alice = insert_user(&db, "alice", false).await;
        let bob = insert_user(&db, "bob", false).await;
        let a = repos.lots().create_with_spots(lot_details("A", 10), 2).await.unwrap();
        let b = repos.lots().create_with_spots(lot_details("B", 10), 2).await.unwrap();

        let r = repos.reservations().claim_spot(a.id, &alice, at(9, 0)).await.unwrap();
        repos.reservations().claim_spot(b.id, &bob, at(9, 0)).await.unwrap();
        repos
            .reservations()
            .close_and_release(r.id, at(9, 30), Decimal::from(10))
            .await
            .unwrap();

        let occupied: u64 = repos
            .lots()
            .occupancy()
            .await
            .unwrap()
            .iter()
            .map(|o| o.counts.occupied)
            .sum();
        assert_eq!(occupied, repos.reservations().count_active().await.unwrap());
        assert_eq!(occupied, 1);
        assert_eq!(repos.reservations().active_for_user(&bob).await.unwrap().len(), 1);
        assert!(repos.reservations().active_for_user(&alice).await.unwrap().is_empty());
    }
}
