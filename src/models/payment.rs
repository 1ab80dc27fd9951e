//! Payment ledger models and transfer request/response types.
//!
//! This module defines:
//! - `TransactionRecord`: one immutable row of the `payment` ledger
//! - `NewLedgerEntry`: the shape appended by the transfer protocol
//! - `Transfer`: the prospective (and, on success, committed) transfer
//! - `TransferRequest`: request body for `POST /v1/transfer`
//! - `PaymentView`: how a ledger row is rendered to API clients

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Which side of a transfer a ledger row describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Incoming,
    Outgoing,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Incoming => "incoming",
            Direction::Outgoing => "outgoing",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a stored direction is neither `incoming` nor `outgoing`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown payment direction: {0}")]
pub struct UnknownDirection(pub String);

impl FromStr for Direction {
    type Err = UnknownDirection;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "incoming" => Ok(Direction::Incoming),
            "outgoing" => Ok(Direction::Outgoing),
            other => Err(UnknownDirection(other.to_string())),
        }
    }
}

/// Represents a row of the append-only `payment` table.
///
/// Two rows describe one successful transfer (one per direction). A failed
/// attempt leaves a single `outgoing` row with a non-empty `error`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Monotonic identifier assigned by the store
    pub id: i64,

    pub direction: Direction,

    /// When the row was appended
    pub date: DateTime<Utc>,

    /// Account that sends money
    pub payer: String,

    /// Account that receives money
    pub payee: String,

    /// Requested amount (always positive)
    pub amount: Decimal,

    pub currency: String,

    /// Empty on success, otherwise the failure message
    pub error: String,
}

impl TransactionRecord {
    pub fn succeeded(&self) -> bool {
        self.error.is_empty()
    }
}

/// A ledger row before the store assigns its id and timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLedgerEntry {
    pub direction: Direction,
    pub payer: String,
    pub payee: String,
    pub amount: Decimal,
    pub currency: String,
    pub error: String,
}

/// A transfer between two accounts.
///
/// Built once both accounts are locked. The currency starts as the payer's
/// currency and is replaced by the caller's when the caller asked for a
/// different one, so the ledger records what was requested.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub payer: String,
    pub payee: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub currency: String,
}

impl Transfer {
    pub fn new(
        payer: impl Into<String>,
        payee: impl Into<String>,
        amount: Decimal,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            payer: payer.into(),
            payee: payee.into(),
            amount,
            currency: currency.into(),
        }
    }

    /// Ledger row describing this transfer from one side.
    pub fn ledger_entry(&self, direction: Direction, error: impl Into<String>) -> NewLedgerEntry {
        NewLedgerEntry {
            direction,
            payer: self.payer.clone(),
            payee: self.payee.clone(),
            amount: self.amount,
            currency: self.currency.clone(),
            error: error.into(),
        }
    }
}

/// Request to transfer money between accounts.
///
/// # JSON Example
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
/// Missing fields decode as empty strings or zero, which the transfer
/// protocol rejects as a missing argument. `currency` may be left empty to
/// transfer in the payer's currency.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRequest {
    #[serde(default)]
    pub from: String,

    #[serde(default)]
    pub to: String,

    #[serde(default, with = "rust_decimal::serde::float")]
    pub amount: Decimal,

    #[serde(default)]
    pub currency: String,
}

/// Ledger row as rendered by `GET /v1/payments`.
///
/// `account` is always the account the row belongs to: the payer for
/// outgoing rows and the payee for incoming rows. The counterpart is
/// rendered as `to_account` or `from_account` respectively.
///
/// ```json
/// {
///   "id": 7,
///   "direction": "outgoing",
///   "date": "2019-06-01T10:00:00Z",
///   "account": "bob123",
///   "to_account": "alice456",
///   "amount": 0.01,
///   "currency": "USD",
///   "error": ""
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentView {
    pub id: i64,
    pub direction: Direction,
    pub date: DateTime<Utc>,
    pub account: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_account: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_account: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub currency: String,
    pub error: String,
}

impl From<TransactionRecord> for PaymentView {
    fn from(record: TransactionRecord) -> Self {
        let (account, from_account, to_account) = match record.direction {
            Direction::Outgoing => (record.payer, None, Some(record.payee)),
            Direction::Incoming => (record.payee, Some(record.payer), None),
        };
        Self {
            id: record.id,
            direction: record.direction,
            date: record.date,
            account,
            from_account,
            to_account,
            amount: record.amount,
            currency: record.currency,
            error: record.error,
        }
    }
}

/// Returned when a rendered payment lacks its counterpart account.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("payment {0} has no counterpart account")]
pub struct MissingCounterpart(pub i64);

impl TryFrom<PaymentView> for TransactionRecord {
    type Error = MissingCounterpart;

    fn try_from(view: PaymentView) -> Result<Self, Self::Error> {
        let (payer, payee) = match view.direction {
            Direction::Outgoing => {
                let payee = view.to_account.ok_or(MissingCounterpart(view.id))?;
                (view.account, payee)
            }
            Direction::Incoming => {
                let payer = view.from_account.ok_or(MissingCounterpart(view.id))?;
                (payer, view.account)
            }
        };

        Ok(Self {
            id: view.id,
            direction: view.direction,
            date: view.date,
            payer,
            payee,
            amount: view.amount,
            currency: view.currency,
            error: view.error,
        })
    }
}
