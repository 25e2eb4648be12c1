//! SQLite fixtures shared by repository and service tests

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectOptions, Database, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QuerySelect, QueryTrait, Set,
};
use sea_orm_migration::MigratorTrait;

use super::entities::{parking_spot, reservation, user};
use super::migrator::Migrator;
use super::repositories::SeaOrmRepositoryProvider;
use super::{init_database, DatabaseConfig};
use crate::domain::{LotDetails, RepositoryProvider};

/// Fresh, migrated in-memory database.
///
/// A single pooled connection keeps every query on the same in-memory
/// database.
pub async fn memory_db() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:".to_string());
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);

    let db = Database::connect(options).await.unwrap();
    Migrator::up(&db, None).await.unwrap();
    db
}

pub async fn memory_repos() -> (DatabaseConnection, Arc<dyn RepositoryProvider>) {
    let db = memory_db().await;
    let repos: Arc<dyn RepositoryProvider> = Arc::new(SeaOrmRepositoryProvider::new(db.clone()));
    (db, repos)
}

/// Insert a user row without hashing a password.
pub async fn insert_user(db: &DatabaseConnection, username: &str, is_admin: bool) -> String {
    let id = uuid::Uuid::new_v4().to_string();
    user::ActiveModel {
        id: Set(id.clone()),
        username: Set(username.to_string()),
        email: Set(None),
        phone: Set(None),
        password_hash: Set("not-a-real-hash".to_string()),
        is_admin: Set(is_admin),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await
    .unwrap();
    id
}

pub fn lot_details(name: &str, price: i64) -> LotDetails {
    LotDetails::new(name, Decimal::from(price), "12 Station Road", "560001").unwrap()
}

/// Migrated database in a temporary file, opened with the default pool.
///
/// The files are removed when the fixture is dropped.
pub struct FileDb {
    pub db: DatabaseConnection,
    pub repos: Arc<dyn RepositoryProvider>,
    path: PathBuf,
}

impl FileDb {
    pub async fn new() -> Self {
        let path = std::env::temp_dir().join(format!("parkhub-{}.db", uuid::Uuid::new_v4()));
        let config = DatabaseConfig::sqlite(&path.to_string_lossy());
        let db = init_database(&config).await.unwrap();
        Migrator::up(&db, None).await.unwrap();
        let repos: Arc<dyn RepositoryProvider> =
            Arc::new(SeaOrmRepositoryProvider::new(db.clone()));
        Self { db, repos, path }
    }
}

impl Drop for FileDb {
    fn drop(&mut self) {
        for suffix in ["", "-wal", "-shm", "-journal"] {
            let mut file = self.path.clone().into_os_string();
            file.push(suffix);
            let _ = std::fs::remove_file(file);
        }
    }
}

/// Mark a spot occupied without opening a reservation on it.
pub async fn occupy_spot(db: &DatabaseConnection, spot_id: i32) {
    parking_spot::Entity::update_many()
        .col_expr(
            parking_spot::Column::Status,
            Expr::value(parking_spot::SpotStatus::Occupied),
        )
        .filter(parking_spot::Column::Id.eq(spot_id))
        .exec(db)
        .await
        .unwrap();
}

/// Active reservations on spots of one lot.
pub async fn active_in_lot(db: &DatabaseConnection, lot_id: i32) -> u64 {
    let lot_spots = parking_spot::Entity::find()
        .select_only()
        .column(parking_spot::Column::Id)
        .filter(parking_spot::Column::LotId.eq(lot_id))
        .into_query();

    reservation::Entity::find()
        .filter(reservation::Column::Status.eq(reservation::ReservationStatus::Active))
        .filter(reservation::Column::SpotId.in_subquery(lot_spots))
        .count(db)
        .await
        .unwrap()
}

/// Reservations (any status) whose spot row no longer exists.
pub async fn orphaned_reservations(db: &DatabaseConnection) -> u64 {
    let all_spots = parking_spot::Entity::find()
        .select_only()
        .column(parking_spot::Column::Id)
        .into_query();

    reservation::Entity::find()
        .filter(reservation::Column::SpotId.not_in_subquery(all_spots))
        .count(db)
        .await
        .unwrap()
}
