//! Repository traits for the domain layer
//!
//! - `RepositoryProvider`: unified access to all per-aggregate repositories
//! - `DomainResult`: standard result type for domain operations

use super::lot::LotRepository;
use super::reservation::ReservationRepository;
use super::user::UserRepositoryInterface;

pub use crate::shared::errors::DomainResult;

/// Provides access to all domain repositories.
///
/// ```ignore
/// async fn handle(repos: &dyn RepositoryProvider) {
///     let lot = repos.lots().find_by_id(1).await?;
///     let active = repos.reservations().active_for_user("user-id").await?;
/// }
/// ```
pub trait RepositoryProvider: Send + Sync {
    fn lots(&self) -> &dyn LotRepository;
    fn reservations(&self) -> &dyn ReservationRepository;
    fn users(&self) -> &dyn UserRepositoryInterface;
}
