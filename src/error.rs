//! Error types and HTTP error response handling.
//!
//! This module defines every failure the payment service reports and how it
//! is converted into an HTTP response with a status code and JSON body.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::{models::response::ErrorResponse, store::StoreError};

/// Application-wide error type.
///
/// # Error Categories
///
/// - **Business rule failures**: the transfer was rejected; reported as 400
/// - **Store failures**: the ledger store could not do its job; reported as 500
/// - **Undecodable requests**: reported as 500, like any other non-business failure
/// - **Client failures**: talking to a remote instance failed
///
/// The display strings of the business rule variants are part of the wire
/// contract. Clients match on them to recover the typed error.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// `from` or `to` is empty, or `amount` is not positive.
    #[error("Required argument missing or it is incorrect")]
    RequiredArgumentMissing,

    #[error("Transfer to self")]
    SelfTransfer,

    #[error("Payer not found")]
    PayerNotFound,

    #[error("Payee not found")]
    PayeeNotFound,

    /// The caller asked for a currency other than the payer's.
    #[error("Wrong currency")]
    WrongCurrency,

    /// Payer and payee accounts hold different currencies.
    #[error("Different currency")]
    DifferentCurrency,

    #[error("Insufficient funds")]
    InsufficientFunds,

    /// A balance write or the commit failed after validation passed.
    #[error("Transaction failed")]
    TransactionFailed,

    /// Request body could not be decoded.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// Remote instance could not be reached or returned garbage.
    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    /// Remote instance reported a failure this client does not know.
    #[error("{message}")]
    Remote { status: u16, message: String },
}

impl AppError {
    /// Whether the error is a rejected transfer rather than a system failure.
    pub fn is_business_rule(&self) -> bool {
        matches!(
            self,
            AppError::RequiredArgumentMissing
                | AppError::SelfTransfer
                | AppError::PayerNotFound
                | AppError::PayeeNotFound
                | AppError::WrongCurrency
                | AppError::DifferentCurrency
                | AppError::InsufficientFunds
        )
    }

    pub fn status_code(&self) -> StatusCode {
        if self.is_business_rule() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }

    /// Rebuild an error from the `error` field of a failed response.
    ///
    /// Known messages map back to their variant; anything else is kept as
    /// [`AppError::Remote`].
    pub fn from_response(status: u16, message: &str) -> Self {
        match message {
            "Required argument missing or it is incorrect" => AppError::RequiredArgumentMissing,
            "Transfer to self" => AppError::SelfTransfer,
            "Payer not found" => AppError::PayerNotFound,
            "Payee not found" => AppError::PayeeNotFound,
            "Wrong currency" => AppError::WrongCurrency,
            "Different currency" => AppError::DifferentCurrency,
            "Insufficient funds" => AppError::InsufficientFunds,
            "Transaction failed" => AppError::TransactionFailed,
            other => AppError::Remote {
                status,
                message: other.to_string(),
            },
        }
    }
}

/// Convert AppError into an HTTP response.
///
/// # Response Format
///
/// ```json
/// {
///   "success": false,
///   "error": "Insufficient funds"
/// }
/// ```
///
/// # Status Code Mapping
///
/// - Business rule failures → 400 Bad Request
/// - Everything else → 500 Internal Server Error
///
/// Store errors are not echoed to the client; they carry backend details.
/// The logging middleware records them in full.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match self {
            AppError::Store(_) => "An internal error occurred".to_string(),
            other => other.to_string(),
        };

        let body = Json(ErrorResponse {
            success: false,
            error: message,
        });

        (status, body).into_response()
    }
}
