use super::common::{
    created_response, map_service_error, no_content_response, success_response, validate_input,
    PaginatedResponse, PaginationParams,
};
use crate::{
    errors::ApiError,
    services::suppliers::{CreateSupplier, UpdateSupplier},
    AppState,
};
use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::get,
    Router,
};
use tracing::info;
use uuid::Uuid;

/// Create a supplier
#[utoipa::path(
    post,
    path = "/api/v1/suppliers",
    request_body = CreateSupplier,
    responses((status = 201, description = "Supplier created")),
    tag = "suppliers"
)]
pub async fn create_supplier(
    State(state): State<AppState>,
    Json(payload): Json<CreateSupplier>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let supplier = state
        .services
        .suppliers
        .create_supplier(payload)
        .await
        .map_err(map_service_error)?;

    info!("Supplier created: {}", supplier.id);

    Ok(created_response(supplier))
}

/// List suppliers, paginated and ordered by name
#[utoipa::path(
    get,
    path = "/api/v1/suppliers",
    params(PaginationParams),
    responses((status = 200, description = "Page of suppliers")),
    tag = "suppliers"
)]
pub async fn list_suppliers(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> Result<impl IntoResponse, ApiError> {
    let (suppliers, total) = state
        .services
        .suppliers
        .list_suppliers(params.page, params.per_page)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(PaginatedResponse::new(
        suppliers,
        params.page,
        params.per_page,
        total,
    )))
}

/// Get a supplier by id
#[utoipa::path(
    get,
    path = "/api/v1/suppliers/{id}",
    params(("id" = Uuid, Path, description = "Supplier id")),
    responses(
        (status = 200, description = "The supplier"),
        (status = 404, description = "No such supplier"),
    ),
    tag = "suppliers"
)]
pub async fn get_supplier(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let supplier = state
        .services
        .suppliers
        .get_supplier(id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(supplier))
}

/// Materials sourced from one supplier
#[utoipa::path(
    get,
    path = "/api/v1/suppliers/{id}/materials",
    params(("id" = Uuid, Path, description = "Supplier id")),
    responses((status = 200, description = "Materials for the supplier")),
    tag = "suppliers"
)]
pub async fn supplier_materials(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let materials = state
        .services
        .suppliers
        .supplier_materials(id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(materials))
}

/// Update a supplier
#[utoipa::path(
    put,
    path = "/api/v1/suppliers/{id}",
    params(("id" = Uuid, Path, description = "Supplier id")),
    request_body = UpdateSupplier,
    responses((status = 200, description = "Updated supplier")),
    tag = "suppliers"
)]
pub async fn update_supplier(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateSupplier>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let supplier = state
        .services
        .suppliers
        .update_supplier(id, payload)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(supplier))
}

/// Delete an unreferenced supplier
#[utoipa::path(
    delete,
    path = "/api/v1/suppliers/{id}",
    params(("id" = Uuid, Path, description = "Supplier id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 409, description = "Supplier is still referenced"),
    ),
    tag = "suppliers"
)]
pub async fn delete_supplier(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .suppliers
        .delete_supplier(id)
        .await
        .map_err(map_service_error)?;

    Ok(no_content_response())
}

pub fn supplier_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_suppliers).post(create_supplier))
        .route(
            "/:id",
            get(get_supplier).put(update_supplier).delete(delete_supplier),
        )
        .route("/:id/materials", get(supplier_materials))
}
