//! Administration API handlers

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Extension, Json,
};

use super::dto::{AdminSummaryResponse, UserSummaryResponse};
use crate::application::{AdminOverview, UserService};
use crate::interfaces::http::common::{domain_error, ApiResponse, ApiResult};
use crate::interfaces::http::middleware::AuthenticatedUser;

#[derive(Clone)]
pub struct AdminState {
    pub overview: Arc<AdminOverview>,
    pub users: Arc<UserService>,
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/summary",
    tag = "Administration",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Lots, user count and active reservations", body = ApiResponse<AdminSummaryResponse>),
        (status = 403, description = "Administrator access required")
    )
)]
pub async fn admin_summary(
    State(state): State<AdminState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> ApiResult<AdminSummaryResponse> {
    let summary = state
        .overview
        .summary(&user.caller())
        .await
        .map_err(domain_error)?;

    Ok(Json(ApiResponse::success(summary.into())))
}

#[utoipa::path(
    get,
    path = "/api/v1/users",
    tag = "Administration",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Regular users with booking counts", body = ApiResponse<Vec<UserSummaryResponse>>),
        (status = 403, description = "Administrator access required")
    )
)]
pub async fn list_users(
    State(state): State<AdminState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> ApiResult<Vec<UserSummaryResponse>> {
    let users = state
        .users
        .list_users(&user.caller())
        .await
        .map_err(domain_error)?;

    Ok(Json(ApiResponse::success(
        users.into_iter().map(Into::into).collect(),
    )))
}

#[utoipa::path(
    delete,
    path = "/api/v1/users/{id}",
    tag = "Administration",
    params(("id" = String, Path, description = "User ID")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "User and reservation history deleted"),
        (status = 404, description = "User not found"),
        (status = 409, description = "User is parked or is an administrator")
    )
)]
pub async fn delete_user(
    State(state): State<AdminState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    state
        .users
        .delete_user(&user.caller(), &id)
        .await
        .map_err(domain_error)?;

    Ok(Json(ApiResponse::success(())))
}
