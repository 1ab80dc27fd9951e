//! Account HTTP handlers.

use axum::{Json, extract::State};

use crate::{error::AppError, models::response::AccountsResponse, services::SharedService};

/// List every account.
///
/// # Endpoint
///
/// `GET /v1/accounts`
///
/// # Response (200 OK)
///
/// ```json
/// {
///   "success": true,
///   "accounts": [
///     { "id": "alice456", "balance": 0.01, "currency": "USD" },
///     { "id": "bob123", "balance": 100.0, "currency": "USD" }
///   ]
/// }
/// ```
///
/// No ordering is guaranteed.
pub async fn list_accounts(
    State(service): State<SharedService>,
) -> Result<Json<AccountsResponse>, AppError> {
    let accounts = service.list_accounts().await?;

    Ok(Json(AccountsResponse {
        success: true,
        accounts,
    }))
}
