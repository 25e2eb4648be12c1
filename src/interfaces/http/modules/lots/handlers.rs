//! Parking lot API handlers

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};

use super::dto::{
    LotOccupancyResponse, LotRequest, LotResponse, OccupancyEntry, ResizeLotRequest, SpotResponse,
};
use crate::application::LotCapacityManager;
use crate::interfaces::http::common::{domain_error, ApiError, ApiResponse, ApiResult, ValidatedJson};
use crate::interfaces::http::middleware::AuthenticatedUser;

#[derive(Clone)]
pub struct LotsState {
    pub lots: Arc<LotCapacityManager>,
}

#[utoipa::path(
    get,
    path = "/api/v1/lots",
    tag = "Parking Lots",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "All lots with spot counts", body = ApiResponse<Vec<LotOccupancyResponse>>)
    )
)]
pub async fn list_lots(State(state): State<LotsState>) -> ApiResult<Vec<LotOccupancyResponse>> {
    let lots = state.lots.list_lots().await.map_err(domain_error)?;
    Ok(Json(ApiResponse::success(
        lots.into_iter().map(Into::into).collect(),
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/lots/available",
    tag = "Parking Lots",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Lots with at least one free spot", body = ApiResponse<Vec<LotOccupancyResponse>>)
    )
)]
pub async fn list_available_lots(
    State(state): State<LotsState>,
) -> ApiResult<Vec<LotOccupancyResponse>> {
    let lots = state.lots.available_lots().await.map_err(domain_error)?;
    Ok(Json(ApiResponse::success(
        lots.into_iter().map(Into::into).collect(),
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/occupancy",
    tag = "Parking Lots",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Available and occupied counts per lot", body = ApiResponse<Vec<OccupancyEntry>>)
    )
)]
pub async fn occupancy(State(state): State<LotsState>) -> ApiResult<Vec<OccupancyEntry>> {
    let lots = state.lots.list_lots().await.map_err(domain_error)?;
    Ok(Json(ApiResponse::success(
        lots.into_iter().map(Into::into).collect(),
    )))
}

#[utoipa::path(
    post,
    path = "/api/v1/lots",
    tag = "Parking Lots",
    request_body = LotRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Lot created with all spots available", body = ApiResponse<LotResponse>),
        (status = 400, description = "Invalid price or fields"),
        (status = 403, description = "Administrator access required")
    )
)]
pub async fn create_lot(
    State(state): State<LotsState>,
    Extension(user): Extension<AuthenticatedUser>,
    ValidatedJson(request): ValidatedJson<LotRequest>,
) -> Result<(StatusCode, Json<ApiResponse<LotResponse>>), ApiError<LotResponse>> {
    let lot = state
        .lots
        .create_lot(&user.caller(), request.into())
        .await
        .map_err(domain_error)?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(lot.into()))))
}

#[utoipa::path(
    put,
    path = "/api/v1/lots/{id}",
    tag = "Parking Lots",
    params(("id" = i32, Path, description = "Lot ID")),
    request_body = LotRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Lot updated", body = ApiResponse<LotResponse>),
        (status = 404, description = "Lot not found"),
        (status = 409, description = "Shrinking would remove occupied spots")
    )
)]
pub async fn update_lot(
    State(state): State<LotsState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<i32>,
    ValidatedJson(request): ValidatedJson<LotRequest>,
) -> ApiResult<LotResponse> {
    let lot = state
        .lots
        .update_lot(&user.caller(), id, request.into())
        .await
        .map_err(domain_error)?;

    Ok(Json(ApiResponse::success(lot.into())))
}

#[utoipa::path(
    put,
    path = "/api/v1/lots/{id}/capacity",
    tag = "Parking Lots",
    params(("id" = i32, Path, description = "Lot ID")),
    request_body = ResizeLotRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Capacity changed", body = ApiResponse<LotResponse>),
        (status = 404, description = "Lot not found"),
        (status = 409, description = "Not enough available spots to remove")
    )
)]
pub async fn resize_lot(
    State(state): State<LotsState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<i32>,
    ValidatedJson(request): ValidatedJson<ResizeLotRequest>,
) -> ApiResult<LotResponse> {
    let lot = state
        .lots
        .resize_lot(&user.caller(), id, request.maximum_spots)
        .await
        .map_err(domain_error)?;

    Ok(Json(ApiResponse::success(lot.into())))
}

#[utoipa::path(
    delete,
    path = "/api/v1/lots/{id}",
    tag = "Parking Lots",
    params(("id" = i32, Path, description = "Lot ID")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Lot, spots and history deleted"),
        (status = 404, description = "Lot not found"),
        (status = 409, description = "Lot has occupied spots")
    )
)]
pub async fn delete_lot(
    State(state): State<LotsState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<i32>,
) -> ApiResult<()> {
    state
        .lots
        .delete_lot(&user.caller(), id)
        .await
        .map_err(domain_error)?;

    Ok(Json(ApiResponse::success(())))
}

#[utoipa::path(
    get,
    path = "/api/v1/lots/{id}/spots",
    tag = "Parking Lots",
    params(("id" = i32, Path, description = "Lot ID")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Spots of the lot", body = ApiResponse<Vec<SpotResponse>>),
        (status = 404, description = "Lot not found")
    )
)]
pub async fn list_spots(
    State(state): State<LotsState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<i32>,
) -> ApiResult<Vec<SpotResponse>> {
    let spots = state
        .lots
        .lot_spots(&user.caller(), id)
        .await
        .map_err(domain_error)?;

    Ok(Json(ApiResponse::success(
        spots.into_iter().map(Into::into).collect(),
    )))
}
