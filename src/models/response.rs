//! JSON envelopes returned by the HTTP API.
//!
//! Every successful response carries `"success": true` next to its payload.
//! Failures are rendered by [`crate::error::AppError`] as
//! `{"success": false, "error": "..."}`.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{Account, PaymentView, Transfer};

/// Response body for `GET /v1/healthcheck`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub success: bool,
}

/// Response body for `GET /v1/accounts`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountsResponse {
    pub success: bool,
    pub accounts: Vec<Account>,
}

/// Response body for `GET /v1/payments`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentsResponse {
    pub success: bool,
    pub payments: Vec<PaymentView>,
}

/// Response body for `POST /v1/transfer`.
///
/// ```json
/// {
///   "success": true,
///   "payer": "bob123",
///   "payee": "alice456",
///   "amount": 0.01,
///   "currency": "USD"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferResponse {
    pub success: bool,
    pub payer: String,
    pub payee: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub currency: String,
}

impl From<Transfer> for TransferResponse {
    fn from(transfer: Transfer) -> Self {
        Self {
            success: true,
            payer: transfer.payer,
            payee: transfer.payee,
            amount: transfer.amount,
            currency: transfer.currency,
        }
    }
}

impl From<TransferResponse> for Transfer {
    fn from(response: TransferResponse) -> Self {
        Transfer::new(
            response.payer,
            response.payee,
            response.amount,
            response.currency,
        )
    }
}

/// Body of any failed response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}
