//! Payment history HTTP handlers.

use axum::{Json, extract::State};

use crate::{
    error::AppError,
    models::{PaymentView, response::PaymentsResponse},
    services::SharedService,
};

/// List the whole payment ledger.
///
/// # Endpoint
///
/// `GET /v1/payments`
///
/// # Response (200 OK)
///
/// ```json
/// {
///   "success": true,
///   "payments": [
///     {
///       "id": 1,
///       "direction": "outgoing",
///       "date": "2019-06-01T10:00:00Z",
///       "account": "bob123",
///       "to_account": "alice456",
///       "amount": 0.01,
///       "currency": "USD",
///       "error": ""
///     }
///   ]
/// }
/// ```
///
/// Failed attempts appear as `outgoing` rows with a non-empty `error`.
pub async fn list_payments(
    State(service): State<SharedService>,
) -> Result<Json<PaymentsResponse>, AppError> {
    let records = service.list_transactions().await?;

    // Convert each ledger row to its per-direction view
    let payments: Vec<PaymentView> = records.into_iter().map(Into::into).collect();

    Ok(Json(PaymentsResponse {
        success: true,
        payments,
    }))
}
