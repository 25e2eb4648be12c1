//! Administration DTOs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::application::AdminSummary;
use crate::domain::UserSummary;
use crate::interfaces::http::modules::auth::UserInfo;
use crate::interfaces::http::modules::lots::LotOccupancyResponse;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AdminSummaryResponse {
    pub lots: Vec<LotOccupancyResponse>,
    pub regular_users: u64,
    pub active_reservations: u64,
}

impl From<AdminSummary> for AdminSummaryResponse {
    fn from(s: AdminSummary) -> Self {
        Self {
            lots: s.lots.into_iter().map(Into::into).collect(),
            regular_users: s.regular_users,
            active_reservations: s.active_reservations,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserSummaryResponse {
    pub user: UserInfo,
    pub total_bookings: u64,
}

impl From<UserSummary> for UserSummaryResponse {
    fn from(s: UserSummary) -> Self {
        Self {
            user: s.user.into(),
            total_bookings: s.total_bookings,
        }
    }
}
