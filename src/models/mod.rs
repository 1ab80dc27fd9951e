//! Data models representing database entities and API payloads.

/// Account model
pub mod account;
/// Payment ledger and transfer models
pub mod payment;
/// HTTP response envelopes
pub mod response;

pub use account::Account;
pub use payment::{
    Direction, NewLedgerEntry, PaymentView, TransactionRecord, Transfer, TransferRequest,
};
