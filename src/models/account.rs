//! Account data model.
//!
//! Accounts are created out of band. The service reads them and, inside the
//! transfer protocol, updates `balance`. Nothing else is ever written.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Represents an account record from the database.
///
/// # Database Table
///
/// Maps to the `account` table, keyed by `user_id`.
///
/// # JSON Example
///
/// ```json
/// {
///   "id": "bob123",
///   "balance": 100.0,
///   "currency": "USD"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow, Serialize, Deserialize)]
pub struct Account {
    /// Unique, immutable account identifier
    #[serde(rename = "id")]
    pub user_id: String,

    /// Current balance
    ///
    /// Never negative after a committed transfer.
    #[serde(with = "rust_decimal::serde::float")]
    pub balance: Decimal,

    /// Currency code, fixed for the lifetime of the account
    pub currency: String,
}

impl Account {
    pub fn new(user_id: impl Into<String>, balance: Decimal, currency: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            balance,
            currency: currency.into(),
        }
    }
}
