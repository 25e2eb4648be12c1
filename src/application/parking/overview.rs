//! Administrator dashboard figures

use std::sync::Arc;

use crate::domain::{Caller, DomainResult, LotOccupancy, RepositoryProvider};

#[derive(Debug, Clone, PartialEq)]
pub struct AdminSummary {
    pub lots: Vec<LotOccupancy>,
    pub regular_users: u64,
    pub active_reservations: u64,
}

pub struct AdminOverview {
    repos: Arc<dyn RepositoryProvider>,
}

impl AdminOverview {
    pub fn new(repos: Arc<dyn RepositoryProvider>) -> Self {
        Self { repos }
    }

    pub async fn summary(&self, caller: &Caller) -> DomainResult<AdminSummary> {
        caller.require_admin()?;

        Ok(AdminSummary {
            lots: self.repos.lots().occupancy().await?,
            regular_users: self.repos.users().count_regular_users().await?,
            active_reservations: self.repos.reservations().count_active().await?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DomainError;
    use crate::infrastructure::database::testing::{insert_user, lot_details, memory_repos};
    use chrono::Utc;

    #[tokio::test]
    async fn summary_counts_users_and_active_reservations() {
        let (db, repos) = memory_repos().await;
        let overview = AdminOverview::new(repos.clone());
        insert_user(&db, "admin", true).await;
        let alice = insert_user(&db, "alice", false).await;
        insert_user(&db, "bob", false).await;

        let lot = repos.lots().create_with_spots(lot_details("Central", 10), 3).await.unwrap();
        repos.reservations().claim_spot(lot.id, &alice, Utc::now()).await.unwrap();

        let summary = overview.summary(&Caller::admin("admin")).await.unwrap();
        assert_eq!(summary.regular_users, 2);
        assert_eq!(summary.active_reservations, 1);
        assert_eq!(summary.lots.len(), 1);
        assert_eq!(summary.lots[0].counts.occupied, 1);
    }

    #[tokio::test]
    async fn summary_is_admin_only() {
        let (_db, repos) = memory_repos().await;
        let overview = AdminOverview::new(repos);

        let err = overview.summary(&Caller::user("u1")).await.unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));
    }
}
