//! Transfer HTTP handler.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};

use crate::{
    error::AppError,
    models::{TransferRequest, response::TransferResponse},
    services::SharedService,
};

/// Transfer money between two accounts.
///
/// # Endpoint
///
/// `POST /v1/transfer`
///
/// # Request Body
///
/// ```json
/// {
///   "from": "bob123",
///   "to": "alice456",
///   "amount": 0.01,
///   "currency": "USD"
/// }
/// ```
///
/// # Responses
///
/// - **200 OK**: the transfer committed
/// - **400 Bad Request**: a business rule rejected the transfer
/// - **500 Internal Server Error**: the body could not be decoded or the ledger store failed
pub async fn create_transfer(
    State(service): State<SharedService>,
    payload: Result<Json<TransferRequest>, JsonRejection>,
) -> Result<Json<TransferResponse>, AppError> {
    let Json(request) = payload.map_err(|rejection| AppError::InvalidRequest(rejection.body_text()))?;

    let transfer = service.transfer(request).await?;

    Ok(Json(transfer.into()))
}
