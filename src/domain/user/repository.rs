use async_trait::async_trait;

use super::{CreateUserDto, User, UserSummary};
use crate::domain::DomainResult;

#[async_trait]
pub trait UserRepositoryInterface: Send + Sync {
    /// Fails with `Conflict` when the username is taken
    async fn create_user(&self, dto: CreateUserDto) -> DomainResult<User>;

    async fn get_user_by_id(&self, id: &str) -> DomainResult<Option<User>>;
    async fn get_user_by_username(&self, username: &str) -> DomainResult<Option<User>>;

    /// Non-admin users with their booking counts, oldest account first
    async fn list_regular_users(&self) -> DomainResult<Vec<UserSummary>>;
    async fn count_regular_users(&self) -> DomainResult<u64>;
    async fn admin_exists(&self) -> DomainResult<bool>;

    /// Delete the user and all of their reservations.
    ///
    /// Fails with `InvalidState` while the user holds an active reservation.
    async fn delete_user(&self, id: &str) -> DomainResult<()>;
}
