use super::common::{
    map_service_error, success_response, PaginatedResponse, PaginationParams,
};
use crate::{errors::ApiError, AppState};
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde_json::json;
use tracing::warn;
use uuid::Uuid;

/// List sales, newest first
#[utoipa::path(
    get,
    path = "/api/v1/sales",
    params(PaginationParams),
    responses((status = 200, description = "Page of sales")),
    tag = "sales"
)]
pub async fn list_sales(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> Result<impl IntoResponse, ApiError> {
    let (sales, total) = state
        .services
        .sales
        .list_sales(params.page, params.per_page)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(PaginatedResponse::new(
        sales,
        params.page,
        params.per_page,
        total,
    )))
}

/// Get a sale with its line items
#[utoipa::path(
    get,
    path = "/api/v1/sales/{id}",
    params(("id" = Uuid, Path, description = "Sale id")),
    responses(
        (status = 200, description = "The sale and its lines"),
        (status = 404, description = "No such sale"),
    ),
    tag = "sales"
)]
pub async fn get_sale(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let detail = state
        .services
        .sales
        .get_sale(id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(detail))
}

/// Download the full sales history as a CSV attachment
#[utoipa::path(
    get,
    path = "/api/v1/sales/export",
    responses((status = 200, description = "CSV file", content_type = "text/csv")),
    tag = "sales"
)]
pub async fn export_sales(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let csv = state
        .services
        .sales
        .export_csv()
        .await
        .map_err(map_service_error)?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"sales_export.csv\"",
            ),
        ],
        csv,
    ))
}

/// Delete all sales history
#[utoipa::path(
    delete,
    path = "/api/v1/sales",
    responses((status = 200, description = "Sales history cleared")),
    tag = "sales"
)]
pub async fn clear_sales(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let deleted = state
        .services
        .sales
        .clear_sales()
        .await
        .map_err(map_service_error)?;

    warn!("Sales history cleared ({} sales deleted)", deleted);

    Ok(success_response(json!({ "deleted": deleted })))
}

/// Wipe every table
#[utoipa::path(
    post,
    path = "/api/v1/admin/reset",
    responses((status = 200, description = "All data removed")),
    tag = "admin"
)]
pub async fn reset_all(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .sales
        .reset_all()
        .await
        .map_err(map_service_error)?;

    warn!("Full data reset performed");

    Ok(success_response(json!({ "reset": true })))
}

pub fn sales_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_sales).delete(clear_sales))
        .route("/export", get(export_sales))
        .route("/:id", get(get_sale))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new().route("/reset", post(reset_all))
}
