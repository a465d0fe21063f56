use super::common::{created_response, map_service_error, validate_input};
use crate::{
    errors::ApiError,
    services::checkout::{CheckoutLine, CheckoutReceipt},
    AppState,
};
use axum::{
    extract::{Json, State},
    response::IntoResponse,
    routing::post,
    Router,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CheckoutRequest {
    #[validate(length(min = 1, message = "at least one item is required"))]
    pub items: Vec<CheckoutLine>,
}

/// Receipt envelope returned on a committed sale
#[derive(Debug, Serialize, ToSchema)]
pub struct CheckoutResponse {
    pub success: bool,
    #[serde(flatten)]
    pub receipt: CheckoutReceipt,
}

/// Process a multi-line sale
#[utoipa::path(
    post,
    path = "/api/v1/checkout",
    request_body = CheckoutRequest,
    responses(
        (status = 201, description = "Sale committed, receipt returned"),
        (status = 404, description = "A line referenced an unknown material"),
        (status = 422, description = "A line exceeded available stock"),
    ),
    tag = "checkout"
)]
pub async fn checkout(
    State(state): State<AppState>,
    Json(payload): Json<CheckoutRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;
    for line in &payload.items {
        validate_input(line)?;
    }

    let receipt = state
        .services
        .checkout
        .checkout(&payload.items)
        .await
        .map_err(map_service_error)?;

    info!(
        "Checkout committed: sale {} total {} ({} lines)",
        receipt.sale_id, receipt.total, receipt.line_count
    );

    Ok(created_response(CheckoutResponse {
        success: true,
        receipt,
    }))
}

pub fn checkout_routes() -> Router<AppState> {
    Router::new().route("/", post(checkout))
}
