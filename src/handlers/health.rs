//! Health check endpoint for service monitoring.

use axum::{Json, extract::State};

use crate::{error::AppError, models::response::HealthResponse, services::SharedService};

/// Health check handler.
///
/// # Endpoint
///
/// `GET /v1/healthcheck`
///
/// # Response (200 OK)
///
/// ```json
/// { "success": true }
/// ```
///
/// If the ledger store is unreachable, returns the standard error response.
pub async fn health_check(
    State(service): State<SharedService>,
) -> Result<Json<HealthResponse>, AppError> {
    let healthy = service.health_check().await?;

    Ok(Json(HealthResponse { success: healthy }))
}
