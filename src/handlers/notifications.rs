use super::common::{map_service_error, success_response};
use crate::{errors::ApiError, AppState};
use axum::{extract::State, response::IntoResponse, routing::get, Router};

/// Low-stock notifications: every material at or below its reorder point,
/// with a depletion forecast and its reorder requests.
#[utoipa::path(
    get,
    path = "/api/v1/notifications/low-stock",
    responses((status = 200, description = "Low-stock report")),
    tag = "notifications"
)]
pub async fn low_stock(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let report = state
        .services
        .forecasting
        .low_stock_report()
        .await
        .map_err(map_service_error)?;

    Ok(success_response(report))
}

pub fn notification_routes() -> Router<AppState> {
    Router::new().route("/low-stock", get(low_stock))
}
