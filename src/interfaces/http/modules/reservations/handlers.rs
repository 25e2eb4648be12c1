//! Reservation API handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};

use super::dto::{
    HistoryQuery, MonthlyUsageResponse, ReservationDetailsResponse, ReservationResponse,
};
use crate::application::{ReservationLedger, SpotAllocator};
use crate::interfaces::http::common::{domain_error, ApiError, ApiResponse, ApiResult};
use crate::interfaces::http::middleware::AuthenticatedUser;
use crate::shared::validations::validate_limit;

#[derive(Clone)]
pub struct ReservationsState {
    pub allocator: Arc<SpotAllocator>,
    pub ledger: Arc<ReservationLedger>,
    pub history_default_limit: u64,
    pub history_max_limit: u64,
}

#[utoipa::path(
    post,
    path = "/api/v1/lots/{id}/book",
    tag = "Reservations",
    params(("id" = i32, Path, description = "Lot ID")),
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Spot occupied, reservation opened", body = ApiResponse<ReservationResponse>),
        (status = 403, description = "Administrators cannot book"),
        (status = 404, description = "Lot not found"),
        (status = 409, description = "Lot full or user already parked")
    )
)]
pub async fn book_spot(
    State(state): State<ReservationsState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(lot_id): Path<i32>,
) -> Result<(StatusCode, Json<ApiResponse<ReservationResponse>>), ApiError<ReservationResponse>> {
    let reservation = state
        .allocator
        .book_spot(&user.caller(), lot_id)
        .await
        .map_err(domain_error)?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(reservation.into())),
    ))
}

#[utoipa::path(
    post,
    path = "/api/v1/reservations/{id}/release",
    tag = "Reservations",
    params(("id" = i32, Path, description = "Reservation ID")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Reservation billed and spot freed", body = ApiResponse<ReservationResponse>),
        (status = 404, description = "Reservation not found"),
        (status = 409, description = "Reservation already completed")
    )
)]
pub async fn release_spot(
    State(state): State<ReservationsState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<i32>,
) -> ApiResult<ReservationResponse> {
    let reservation = state
        .allocator
        .release_spot(&user.caller(), id)
        .await
        .map_err(domain_error)?;

    Ok(Json(ApiResponse::success(reservation.into())))
}

#[utoipa::path(
    get,
    path = "/api/v1/reservations/active",
    tag = "Reservations",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Caller's active reservations", body = ApiResponse<Vec<ReservationDetailsResponse>>)
    )
)]
pub async fn active_reservations(
    State(state): State<ReservationsState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> ApiResult<Vec<ReservationDetailsResponse>> {
    let active = state
        .ledger
        .active_for_user(&user.user_id)
        .await
        .map_err(domain_error)?;

    Ok(Json(ApiResponse::success(
        active.into_iter().map(Into::into).collect(),
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/reservations/history",
    tag = "Reservations",
    params(HistoryQuery),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Caller's reservations, newest first", body = ApiResponse<Vec<ReservationDetailsResponse>>)
    )
)]
pub async fn reservation_history(
    State(state): State<ReservationsState>,
    Extension(user): Extension<AuthenticatedUser>,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<Vec<ReservationDetailsResponse>> {
    let limit = validate_limit(
        query.limit,
        state.history_default_limit,
        state.history_max_limit,
    );
    let history = state
        .ledger
        .history(&user.user_id, limit)
        .await
        .map_err(domain_error)?;

    Ok(Json(ApiResponse::success(
        history.into_iter().map(Into::into).collect(),
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/reservations/monthly",
    tag = "Reservations",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Bookings and spend per month, newest first", body = ApiResponse<Vec<MonthlyUsageResponse>>)
    )
)]
pub async fn monthly_usage(
    State(state): State<ReservationsState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> ApiResult<Vec<MonthlyUsageResponse>> {
    let usage = state
        .ledger
        .monthly_aggregate(&user.user_id)
        .await
        .map_err(domain_error)?;

    Ok(Json(ApiResponse::success(
        usage.into_iter().map(Into::into).collect(),
    )))
}
