use super::common::{
    created_response, map_service_error, no_content_response, success_response, validate_input,
    PaginatedResponse, PaginationParams,
};
use crate::{
    errors::ApiError,
    services::materials::{CreateMaterial, UpdateMaterial},
    AppState,
};
use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::get,
    Router,
};
use serde::Serialize;
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

/// A material decorated with its derived stock status
#[derive(Debug, Serialize, ToSchema)]
struct MaterialView {
    #[serde(flatten)]
    material: crate::entities::material::Model,
    status: crate::entities::material::StockStatus,
}

impl From<crate::entities::material::Model> for MaterialView {
    fn from(material: crate::entities::material::Model) -> Self {
        Self {
            status: material.status(),
            material,
        }
    }
}

/// Create a material
#[utoipa::path(
    post,
    path = "/api/v1/materials",
    request_body = CreateMaterial,
    responses(
        (status = 201, description = "Material created"),
        (status = 409, description = "Name already in use"),
    ),
    tag = "materials"
)]
pub async fn create_material(
    State(state): State<AppState>,
    Json(payload): Json<CreateMaterial>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let material = state
        .services
        .materials
        .create_material(payload)
        .await
        .map_err(map_service_error)?;

    info!("Material created: {}", material.id);

    Ok(created_response(MaterialView::from(material)))
}

/// List materials, paginated and ordered by name
#[utoipa::path(
    get,
    path = "/api/v1/materials",
    params(PaginationParams),
    responses((status = 200, description = "Page of materials")),
    tag = "materials"
)]
pub async fn list_materials(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> Result<impl IntoResponse, ApiError> {
    let (materials, total) = state
        .services
        .materials
        .list_materials(params.page, params.per_page)
        .await
        .map_err(map_service_error)?;

    let views: Vec<MaterialView> = materials.into_iter().map(MaterialView::from).collect();

    Ok(success_response(PaginatedResponse::new(
        views,
        params.page,
        params.per_page,
        total,
    )))
}

/// Get a material by id
#[utoipa::path(
    get,
    path = "/api/v1/materials/{id}",
    params(("id" = Uuid, Path, description = "Material id")),
    responses(
        (status = 200, description = "The material"),
        (status = 404, description = "No such material"),
    ),
    tag = "materials"
)]
pub async fn get_material(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let material = state
        .services
        .materials
        .get_material(id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(MaterialView::from(material)))
}

/// Update a material
#[utoipa::path(
    put,
    path = "/api/v1/materials/{id}",
    params(("id" = Uuid, Path, description = "Material id")),
    request_body = UpdateMaterial,
    responses(
        (status = 200, description = "Updated material"),
        (status = 404, description = "No such material"),
    ),
    tag = "materials"
)]
pub async fn update_material(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateMaterial>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let material = state
        .services
        .materials
        .update_material(id, payload)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(MaterialView::from(material)))
}

/// Delete a material without history
#[utoipa::path(
    delete,
    path = "/api/v1/materials/{id}",
    params(("id" = Uuid, Path, description = "Material id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 409, description = "Material still has history"),
    ),
    tag = "materials"
)]
pub async fn delete_material(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .materials
        .delete_material(id)
        .await
        .map_err(map_service_error)?;

    Ok(no_content_response())
}

/// Materials at or below their reorder point
#[utoipa::path(
    get,
    path = "/api/v1/materials/low-stock",
    responses((status = 200, description = "Materials needing restock")),
    tag = "materials"
)]
pub async fn low_stock_materials(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let materials = state
        .services
        .materials
        .low_stock_materials()
        .await
        .map_err(map_service_error)?;

    let views: Vec<MaterialView> = materials.into_iter().map(MaterialView::from).collect();

    Ok(success_response(views))
}

/// Forecast days until a material's stock depletes
#[utoipa::path(
    get,
    path = "/api/v1/materials/{id}/forecast",
    params(("id" = Uuid, Path, description = "Material id")),
    responses(
        (status = 200, description = "Depletion forecast"),
        (status = 404, description = "No such material"),
    ),
    tag = "materials"
)]
pub async fn forecast_material(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let forecast = state
        .services
        .forecasting
        .forecast_depletion(id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(forecast))
}

/// Reorder requests for one material, newest first
#[utoipa::path(
    get,
    path = "/api/v1/materials/{id}/reorders",
    params(("id" = Uuid, Path, description = "Material id")),
    responses((status = 200, description = "Reorder requests")),
    tag = "materials"
)]
pub async fn material_reorders(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    // 404 for unknown materials rather than an empty list
    state
        .services
        .materials
        .get_material(id)
        .await
        .map_err(map_service_error)?;

    let reorders = state
        .services
        .reorders
        .reorders_for_material(id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(reorders))
}

pub fn material_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_materials).post(create_material))
        .route("/low-stock", get(low_stock_materials))
        .route(
            "/:id",
            get(get_material).put(update_material).delete(delete_material),
        )
        .route("/:id/forecast", get(forecast_material))
        .route("/:id/reorders", get(material_reorders))
}
