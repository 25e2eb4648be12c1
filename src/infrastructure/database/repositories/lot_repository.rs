//! SeaORM implementation of LotRepository

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, QueryTrait, Set,
};
use tracing::debug;

use crate::domain::lot::{CapacityPlan, LotDetails, LotOccupancy, LotRepository, ParkingLot, SpotCounts};
use crate::domain::money::{from_minor_units, to_minor_units};
use crate::domain::spot::{ParkingSpot, SpotStatus};
use crate::domain::{DomainError, DomainResult};
use crate::infrastructure::database::entities::{parking_lot, parking_spot, reservation};
use crate::infrastructure::database::{commit_or_rollback, WriteGate};

/// Spots per statement when inserting or deleting them in bulk
const SPOT_BATCH: u64 = 500;

pub struct SeaOrmLotRepository {
    db: DatabaseConnection,
    gate: WriteGate,
}

impl SeaOrmLotRepository {
    pub fn new(db: DatabaseConnection, gate: WriteGate) -> Self {
        Self { db, gate }
    }
}

// ── Conversion helpers ──────────────────────────────────────────

pub(crate) fn lot_to_domain(m: parking_lot::Model) -> ParkingLot {
    ParkingLot {
        id: m.id,
        prime_location_name: m.prime_location_name,
        price: from_minor_units(m.price_cents),
        address: m.address,
        pin_code: m.pin_code,
        maximum_spots: m.maximum_spots,
        created_at: m.created_at,
    }
}

pub(crate) fn spot_status_to_domain(status: parking_spot::SpotStatus) -> SpotStatus {
    match status {
        parking_spot::SpotStatus::Available => SpotStatus::Available,
        parking_spot::SpotStatus::Occupied => SpotStatus::Occupied,
    }
}

fn spot_to_domain(m: parking_spot::Model) -> ParkingSpot {
    ParkingSpot {
        id: m.id,
        lot_id: m.lot_id,
        status: spot_status_to_domain(m.status),
        created_at: m.created_at,
    }
}

fn lot_not_found(lot_id: i32) -> DomainError {
    DomainError::not_found("ParkingLot", "id", lot_id)
}

// ── Statement helpers (usable inside a transaction) ─────────────

async fn insert_spots<C: ConnectionTrait>(conn: &C, lot_id: i32, count: u64) -> Result<(), DbErr> {
    let now = Utc::now();
    let mut remaining = count;

    while remaining > 0 {
        let batch = remaining.min(SPOT_BATCH);
        let spots = (0..batch).map(|_| parking_spot::ActiveModel {
            lot_id: Set(lot_id),
            status: Set(parking_spot::SpotStatus::Available),
            created_at: Set(now),
            ..Default::default()
        });
        parking_spot::Entity::insert_many(spots).exec(conn).await?;
        remaining -= batch;
    }

    Ok(())
}

async fn count_spots<C: ConnectionTrait>(
    conn: &C,
    lot_id: i32,
    status: Option<parking_spot::SpotStatus>,
) -> Result<u64, DbErr> {
    let mut query = parking_spot::Entity::find().filter(parking_spot::Column::LotId.eq(lot_id));
    if let Some(status) = status {
        query = query.filter(parking_spot::Column::Status.eq(status));
    }
    query.count(conn).await
}

async fn spot_counts<C: ConnectionTrait>(conn: &C, lot_id: i32) -> Result<SpotCounts, DbErr> {
    let total = count_spots(conn, lot_id, None).await?;
    let available = count_spots(conn, lot_id, Some(parking_spot::SpotStatus::Available)).await?;
    Ok(SpotCounts {
        total,
        available,
        occupied: total - available,
    })
}

/// Remove `count` available spots (highest IDs first) and their
/// reservation history. Returns the number of spots actually removed.
async fn remove_available_spots<C: ConnectionTrait>(
    conn: &C,
    lot_id: i32,
    count: u64,
) -> Result<u64, DbErr> {
    let ids: Vec<i32> = parking_spot::Entity::find()
        .select_only()
        .column(parking_spot::Column::Id)
        .filter(parking_spot::Column::LotId.eq(lot_id))
        .filter(parking_spot::Column::Status.eq(parking_spot::SpotStatus::Available))
        .order_by_desc(parking_spot::Column::Id)
        .limit(count)
        .into_tuple()
        .all(conn)
        .await?;

    let mut deleted = 0;
    for batch in ids.chunks(SPOT_BATCH as usize) {
        reservation::Entity::delete_many()
            .filter(reservation::Column::SpotId.is_in(batch.iter().copied()))
            .exec(conn)
            .await?;

        deleted += parking_spot::Entity::delete_many()
            .filter(parking_spot::Column::Id.is_in(batch.iter().copied()))
            .filter(parking_spot::Column::Status.eq(parking_spot::SpotStatus::Available))
            .exec(conn)
            .await?
            .rows_affected;
    }

    Ok(deleted)
}

// ── LotRepository impl ──────────────────────────────────────────

#[async_trait]
impl LotRepository for SeaOrmLotRepository {
    async fn create_with_spots(
        &self,
        details: LotDetails,
        maximum_spots: u64,
    ) -> DomainResult<ParkingLot> {
        let maximum = i32::try_from(maximum_spots).map_err(|_| {
            DomainError::InvalidInput(format!("maximum spots {} is too large", maximum_spots))
        })?;
        let price_cents = to_minor_units(details.price)?;

        let (_write, txn) = self.gate.begin(&self.db).await?;
        let result: DomainResult<parking_lot::Model> = async {
            let lot = parking_lot::ActiveModel {
                prime_location_name: Set(details.prime_location_name),
                price_cents: Set(price_cents),
                address: Set(details.address),
                pin_code: Set(details.pin_code),
                maximum_spots: Set(maximum),
                created_at: Set(Utc::now()),
                ..Default::default()
            }
            .insert(&txn)
            .await?;

            insert_spots(&txn, lot.id, maximum_spots).await?;
            Ok(lot)
        }
        .await;
        let lot = commit_or_rollback(txn, result).await?;

        debug!(lot_id = lot.id, spots = maximum_spots, "Parking lot created");
        Ok(lot_to_domain(lot))
    }

    async fn find_by_id(&self, id: i32) -> DomainResult<Option<ParkingLot>> {
        let model = parking_lot::Entity::find_by_id(id).one(&self.db).await?;
        Ok(model.map(lot_to_domain))
    }

    async fn find_all(&self) -> DomainResult<Vec<ParkingLot>> {
        let models = parking_lot::Entity::find()
            .order_by_asc(parking_lot::Column::Id)
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(lot_to_domain).collect())
    }

    async fn spots(&self, lot_id: i32) -> DomainResult<Vec<ParkingSpot>> {
        let models = parking_spot::Entity::find()
            .filter(parking_spot::Column::LotId.eq(lot_id))
            .order_by_asc(parking_spot::Column::Id)
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(spot_to_domain).collect())
    }

    async fn counts(&self, lot_id: i32) -> DomainResult<SpotCounts> {
        Ok(spot_counts(&self.db, lot_id).await?)
    }

    async fn occupancy(&self) -> DomainResult<Vec<LotOccupancy>> {
        let lots = self.find_all().await?;

        let rows: Vec<(i32, parking_spot::SpotStatus, i64)> = parking_spot::Entity::find()
            .select_only()
            .column(parking_spot::Column::LotId)
            .column(parking_spot::Column::Status)
            .column_as(Expr::col(parking_spot::Column::Id).count(), "spot_count")
            .group_by(parking_spot::Column::LotId)
            .group_by(parking_spot::Column::Status)
            .into_tuple()
            .all(&self.db)
            .await?;

        let mut counts: std::collections::HashMap<i32, SpotCounts> =
            std::collections::HashMap::new();
        for (lot_id, status, n) in rows {
            let entry = counts.entry(lot_id).or_default();
            let n = n.max(0) as u64;
            entry.total += n;
            match status {
                parking_spot::SpotStatus::Available => entry.available += n,
                parking_spot::SpotStatus::Occupied => entry.occupied += n,
            }
        }

        Ok(lots
            .into_iter()
            .map(|lot| LotOccupancy {
                counts: counts.get(&lot.id).copied().unwrap_or_default(),
                lot,
            })
            .collect())
    }

    async fn resize(
        &self,
        lot_id: i32,
        new_max: i32,
        details: Option<LotDetails>,
    ) -> DomainResult<ParkingLot> {
        let (_write, txn) = self.gate.begin(&self.db).await?;
        let result: DomainResult<(parking_lot::Model, CapacityPlan)> = async {
            let lot = parking_lot::Entity::find_by_id(lot_id)
                .one(&txn)
                .await?
                .ok_or_else(|| lot_not_found(lot_id))?;

            let counts = spot_counts(&txn, lot_id).await?;
            let plan = CapacityPlan::compute(counts.total, counts.available, new_max)?;

            match plan {
                CapacityPlan::Grow(n) => insert_spots(&txn, lot_id, n).await?,
                CapacityPlan::Shrink(n) => {
                    let removed = remove_available_spots(&txn, lot_id, n).await?;
                    if removed != n {
                        return Err(DomainError::CapacityConflict(format!(
                            "only {} of {} spots could be removed from lot {}",
                            removed, n, lot_id
                        )));
                    }
                }
                CapacityPlan::Unchanged => {}
            }

            let mut active: parking_lot::ActiveModel = lot.into();
            active.maximum_spots = Set(new_max);
            if let Some(details) = details {
                active.price_cents = Set(to_minor_units(details.price)?);
                active.prime_location_name = Set(details.prime_location_name);
                active.address = Set(details.address);
                active.pin_code = Set(details.pin_code);
            }
            Ok((active.update(&txn).await?, plan))
        }
        .await;
        let (updated, plan) = commit_or_rollback(txn, result).await?;

        debug!(lot_id, ?plan, new_max, "Parking lot resized");
        Ok(lot_to_domain(updated))
    }

    async fn delete_cascade(&self, lot_id: i32) -> DomainResult<()> {
        let (_write, txn) = self.gate.begin(&self.db).await?;
        let result: DomainResult<(u64, u64)> = async {
            parking_lot::Entity::find_by_id(lot_id)
                .one(&txn)
                .await?
                .ok_or_else(|| lot_not_found(lot_id))?;

            let occupied =
                count_spots(&txn, lot_id, Some(parking_spot::SpotStatus::Occupied)).await?;
            if occupied > 0 {
                return Err(DomainError::CapacityConflict(format!(
                    "lot {} still has {} occupied spots",
                    lot_id, occupied
                )));
            }

            let lot_spots = parking_spot::Entity::find()
                .select_only()
                .column(parking_spot::Column::Id)
                .filter(parking_spot::Column::LotId.eq(lot_id))
                .into_query();

            let reservations = reservation::Entity::delete_many()
                .filter(reservation::Column::SpotId.in_subquery(lot_spots))
                .exec(&txn)
                .await?;
            let spots = parking_spot::Entity::delete_many()
                .filter(parking_spot::Column::LotId.eq(lot_id))
                .exec(&txn)
                .await?;
            parking_lot::Entity::delete_by_id(lot_id).exec(&txn).await?;

            Ok((spots.rows_affected, reservations.rows_affected))
        }
        .await;
        let (spots, reservations) = commit_or_rollback(txn, result).await?;

        debug!(
            lot_id,
            spots,
            reservations,
            "Parking lot deleted"
        );
        Ok(())
    }
}

// ── Tests ──────────────────────────────────────────────────────
