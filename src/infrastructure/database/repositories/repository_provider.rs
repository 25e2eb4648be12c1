//! SeaORM implementation of RepositoryProvider

use sea_orm::DatabaseConnection;

use crate::domain::lot::LotRepository;
use crate::domain::repositories::RepositoryProvider;
use crate::domain::reservation::ReservationRepository;
use crate::domain::user::UserRepositoryInterface;
use crate::infrastructure::database::WriteGate;

use super::lot_repository::SeaOrmLotRepository;
use super::reservation_repository::SeaOrmReservationRepository;
use super::user_repository::UserRepository;

/// Unified repository provider backed by SeaORM.
///
/// Holds one connection pool and exposes per-aggregate repository accessors.
/// All three repositories share a single [`WriteGate`].
///
/// ```ignore
/// let repos = SeaOrmRepositoryProvider::new(db.clone());
/// let lot = repos.lots().find_by_id(1).await?;
/// let active = repos.reservations().active_for_user(&user_id).await?;
/// ```
pub struct SeaOrmRepositoryProvider {
    lots: SeaOrmLotRepository,
    reservations: SeaOrmReservationRepository,
    users: UserRepository,
}

impl SeaOrmRepositoryProvider {
    pub fn new(db: DatabaseConnection) -> Self {
        let gate = WriteGate::new();
        Self {
            lots: SeaOrmLotRepository::new(db.clone(), gate.clone()),
            reservations: SeaOrmReservationRepository::new(db.clone(), gate.clone()),
            users: UserRepository::new(db, gate),
        }
    }
}

impl RepositoryProvider for SeaOrmRepositoryProvider {
    fn lots(&self) -> &dyn LotRepository {
        &self.lots
    }

    fn reservations(&self) -> &dyn ReservationRepository {
        &self.reservations
    }

    fn users(&self) -> &dyn UserRepositoryInterface {
        &self.users
    }
}
