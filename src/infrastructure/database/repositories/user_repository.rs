use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use tracing::debug;

use crate::domain::{
    CreateUserDto, DomainError, DomainResult, User, UserRepositoryInterface, UserSummary,
};
use crate::infrastructure::database::entities::{reservation, user};
use crate::infrastructure::database::{commit_or_rollback, WriteGate};

pub struct UserRepository {
    db: DatabaseConnection,
    gate: WriteGate,
}

impl UserRepository {
    pub fn new(db: DatabaseConnection, gate: WriteGate) -> Self {
        Self { db, gate }
    }
}

// ── Conversion helpers ──────────────────────────────────────────

fn user_model_to_domain(model: user::Model) -> User {
    User {
        id: model.id,
        username: model.username,
        email: model.email,
        phone: model.phone,
        password_hash: model.password_hash,
        is_admin: model.is_admin,
        created_at: model.created_at,
    }
}

// ── Repository implementation ───────────────────────────────────

#[async_trait]
impl UserRepositoryInterface for UserRepository {
    async fn create_user(&self, dto: CreateUserDto) -> DomainResult<User> {
        // Held across the uniqueness check and the insert
        let _write = self.gate.hold().await;
        if self.get_user_by_username(&dto.username).await?.is_some() {
            return Err(DomainError::Conflict(format!(
                "username '{}' is already taken",
                dto.username
            )));
        }

        let new_user = user::ActiveModel {
            id: Set(uuid::Uuid::new_v4().to_string()),
            username: Set(dto.username),
            email: Set(dto.email),
            phone: Set(dto.phone),
            password_hash: Set(dto.password_hash),
            is_admin: Set(dto.is_admin),
            created_at: Set(Utc::now()),
        };

        let model = new_user.insert(&self.db).await?;
        debug!(user_id = %model.id, username = %model.username, "User created");
        Ok(user_model_to_domain(model))
    }

    async fn get_user_by_id(&self, id: &str) -> DomainResult<Option<User>> {
        let model = user::Entity::find_by_id(id.to_string()).one(&self.db).await?;
        Ok(model.map(user_model_to_domain))
    }

    async fn get_user_by_username(&self, username: &str) -> DomainResult<Option<User>> {
        let model = user::Entity::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.db)
            .await?;
        Ok(model.map(user_model_to_domain))
    }

    async fn list_regular_users(&self) -> DomainResult<Vec<UserSummary>> {
        let users = user::Entity::find()
            .filter(user::Column::IsAdmin.eq(false))
            .order_by_asc(user::Column::CreatedAt)
            .order_by_asc(user::Column::Username)
            .all(&self.db)
            .await?;

        let bookings: HashMap<String, i64> = reservation::Entity::find()
            .select_only()
            .column(reservation::Column::UserId)
            .column_as(Expr::col(reservation::Column::Id).count(), "bookings")
            .group_by(reservation::Column::UserId)
            .into_tuple::<(String, i64)>()
            .all(&self.db)
            .await?
            .into_iter()
            .collect();

        Ok(users
            .into_iter()
            .map(|m| {
                let total_bookings = bookings.get(&m.id).copied().unwrap_or(0).max(0) as u64;
                UserSummary {
                    user: user_model_to_domain(m),
                    total_bookings,
                }
            })
            .collect())
    }

    async fn count_regular_users(&self) -> DomainResult<u64> {
        Ok(user::Entity::find()
            .filter(user::Column::IsAdmin.eq(false))
            .count(&self.db)
            .await?)
    }

    async fn admin_exists(&self) -> DomainResult<bool> {
        let admins = user::Entity::find()
            .filter(user::Column::IsAdmin.eq(true))
            .count(&self.db)
            .await?;
        Ok(admins > 0)
    }

    async fn delete_user(&self, id: &str) -> DomainResult<()> {
        let (_write, txn) = self.gate.begin(&self.db).await?;
        let result: DomainResult<u64> = async {
            user::Entity::find_by_id(id.to_string())
                .one(&txn)
                .await?
                .ok_or_else(|| DomainError::not_found("User", "id", id))?;

            let active = reservation::Entity::find()
                .filter(reservation::Column::UserId.eq(id))
                .filter(reservation::Column::Status.eq(reservation::ReservationStatus::Active))
                .count(&txn)
                .await?;
            if active > 0 {
                return Err(DomainError::InvalidState(format!(
                    "user {} still has {} active reservation(s)",
                    id, active
                )));
            }

            let removed = reservation::Entity::delete_many()
                .filter(reservation::Column::UserId.eq(id))
                .exec(&txn)
                .await?;
            user::Entity::delete_by_id(id.to_string()).exec(&txn).await?;
            Ok(removed.rows_affected)
        }
        .await;
        let removed = commit_or_rollback(txn, result).await?;

        debug!(user_id = id, reservations = removed, "User deleted");
        Ok(())
    }
}
