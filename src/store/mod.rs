//! Ledger store: the storage contract consumed by the transfer protocol.
//!
//! The protocol depends only on [`LedgerStore`] and [`StoreTxn`]. Two
//! backends implement them:
//! - [`PgLedgerStore`]: PostgreSQL via sqlx, row locks with `FOR NO KEY UPDATE`
//! - [`MemoryLedgerStore`]: in-memory double with per-row async locks
//!
//! # Transactions
//!
//! A [`StoreTxn`] is scoped to one transfer attempt. Dropping it without
//! calling [`StoreTxn::commit`] discards every write made through it and
//! releases its row locks, so an early return, a panic or a cancelled
//! request never leaves a lock held.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::models::{Account, NewLedgerEntry, TransactionRecord};

pub use memory::{Fault, MemoryLedgerStore};
pub use postgres::PgLedgerStore;

/// Failures reported by a ledger store backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backend could not open a unit of work.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// No account with this identifier exists.
    #[error("Account not found: {0}")]
    NotFound(String),

    /// A balance or ledger write was rejected.
    #[error("Write failed: {0}")]
    WriteFailed(String),

    /// Any other database failure.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Durable accounts table plus append-only payment ledger.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Open an isolated unit of work.
    async fn begin(&self) -> Result<Box<dyn StoreTxn>, StoreError>;

    /// Append one ledger row outside any transfer transaction.
    ///
    /// The row persists even when the transfer that produced it rolls back.
    async fn append_ledger_entry(&self, entry: NewLedgerEntry) -> Result<(), StoreError>;

    /// Snapshot of every account. No locks are taken.
    async fn list_accounts(&self) -> Result<Vec<Account>, StoreError>;

    /// Snapshot of the whole ledger. No locks are taken.
    async fn list_transactions(&self) -> Result<Vec<TransactionRecord>, StoreError>;

    /// Cheap connectivity probe used by the health check.
    async fn ping(&self) -> Result<(), StoreError>;
}

/// One open store transaction.
#[async_trait]
pub trait StoreTxn: Send {
    /// Lock the account row for writing and return its current state.
    ///
    /// Blocks while another transaction holds the same row. Locking a row
    /// this transaction already holds returns it without blocking.
    async fn lock_and_fetch(&mut self, user_id: &str) -> Result<Account, StoreError>;

    /// Write a new balance for an account locked by this transaction.
    async fn set_balance(&mut self, user_id: &str, balance: Decimal) -> Result<(), StoreError>;

    /// Make every write visible and release the row locks.
    async fn commit(self: Box<Self>) -> Result<(), StoreError>;

    /// Discard every write and release the row locks.
    ///
    /// Safe to call when nothing was written.
    async fn rollback(self: Box<Self>) -> Result<(), StoreError>;
}
