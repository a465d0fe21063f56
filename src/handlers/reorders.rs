use super::common::{
    created_response, map_service_error, success_response, validate_input,
    PaginatedResponse, PaginationParams,
};
use crate::{
    entities::reorder_request::ReorderStatus,
    errors::ApiError,
    services::reorders::CreateReorder,
    AppState,
};
use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::get,
    Router,
};
use serde::Deserialize;
use tracing::info;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

#[derive(Debug, Deserialize, IntoParams)]
struct ReorderListParams {
    #[serde(default = "default_page")]
    page: u64,
    #[serde(default = "default_per_page")]
    per_page: u64,
    status: Option<ReorderStatus>,
}

fn default_page() -> u64 {
    1
}

fn default_per_page() -> u64 {
    20
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateReorderStatusRequest {
    pub status: ReorderStatus,
}

/// File a reorder request
#[utoipa::path(
    post,
    path = "/api/v1/reorders",
    request_body = CreateReorder,
    responses(
        (status = 201, description = "Reorder request filed"),
        (status = 404, description = "No such material"),
    ),
    tag = "reorders"
)]
pub async fn create_reorder(
    State(state): State<AppState>,
    Json(payload): Json<CreateReorder>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let reorder = state
        .services
        .reorders
        .create_reorder(payload)
        .await
        .map_err(map_service_error)?;

    info!("Reorder requested: {}", reorder.id);

    Ok(created_response(reorder))
}

/// List reorder requests, newest first, optionally filtered by status
#[utoipa::path(
    get,
    path = "/api/v1/reorders",
    params(ReorderListParams),
    responses((status = 200, description = "Page of reorder requests")),
    tag = "reorders"
)]
pub async fn list_reorders(
    State(state): State<AppState>,
    Query(params): Query<ReorderListParams>,
) -> Result<impl IntoResponse, ApiError> {
    let (reorders, total) = state
        .services
        .reorders
        .list_reorders(params.page, params.per_page, params.status)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(PaginatedResponse::new(
        reorders,
        params.page,
        params.per_page,
        total,
    )))
}

/// Get one reorder request
#[utoipa::path(
    get,
    path = "/api/v1/reorders/{id}",
    params(("id" = Uuid, Path, description = "Reorder request id")),
    responses(
        (status = 200, description = "The reorder request"),
        (status = 404, description = "No such reorder request"),
    ),
    tag = "reorders"
)]
pub async fn get_reorder(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let reorder = state
        .services
        .reorders
        .get_reorder(id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(reorder))
}

/// Change a reorder's status. Moving to Received restocks the material.
#[utoipa::path(
    put,
    path = "/api/v1/reorders/{id}/status",
    params(("id" = Uuid, Path, description = "Reorder request id")),
    request_body = UpdateReorderStatusRequest,
    responses(
        (status = 200, description = "Updated reorder request"),
        (status = 409, description = "Request was already received"),
    ),
    tag = "reorders"
)]
pub async fn update_reorder_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateReorderStatusRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let reorder = state
        .services
        .reorders
        .update_status(id, payload.status)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(reorder))
}

pub fn reorder_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_reorders).post(create_reorder))
        .route("/:id", get(get_reorder))
        .route("/:id/status", axum::routing::put(update_reorder_status))
}
