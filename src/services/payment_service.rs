//! Payment service - the transfer protocol and read-only queries.
//!
//! # Transfer protocol
//!
//! 1. Reject empty identifiers, non-positive amounts and self transfers
//! 2. Open one store transaction
//! 3. Lock both account rows in lexicographic order of their identifiers
//! 4. Check currencies, then funds
//! 5. Write both balances and commit
//! 6. Append the outcome to the ledger, outside the transaction
//!
//! # Deadlock freedom
//!
//! Every transfer touching the same two accounts requests their row locks in
//! the same order, whichever way the money flows, so no two transfers can
//! wait on each other in a cycle.
//!
//! # Ledger
//!
//! Once both rows are locked, every attempt leaves one `outgoing` row whose
//! `error` is empty on success. A successful transfer also leaves one
//! `incoming` row. Attempts rejected before the locks leave nothing.
//!
//! The protocol runs on its own task, so a caller that stops waiting (a
//! client hanging up mid-request) cannot cut it off between the commit and
//! the ledger rows.

use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use tracing::Instrument;

use crate::{
    error::AppError,
    models::{Account, Direction, NewLedgerEntry, TransactionRecord, Transfer, TransferRequest},
    services::PaymentService,
    store::{LedgerStore, StoreError, StoreTxn},
};

/// Core payment service over a ledger store.
pub struct Payments {
    store: Arc<dyn LedgerStore>,
}

impl Payments {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    /// Execute a transfer between two accounts.
    ///
    /// # Arguments
    ///
    /// * `from` - Payer account identifier
    /// * `to` - Payee account identifier
    /// * `amount` - Amount to move (must be positive)
    /// * `currency` - Expected currency, or empty for the payer's currency
    ///
    /// Dropping the returned future does not abort a transfer that has
    /// started: it still commits or rolls back and is still recorded.
    ///
    /// # Errors
    ///
    /// - `RequiredArgumentMissing` / `SelfTransfer`: rejected before touching the store
    /// - `PayerNotFound` / `PayeeNotFound`: by role, whatever the lock order
    /// - `WrongCurrency`, `DifferentCurrency`, `InsufficientFunds`: rolled back
    /// - `TransactionFailed`: a balance write or the commit failed
    /// - `Store`: the transaction could not be opened or a row could not be locked
    pub async fn execute_transfer(
        &self,
        from: &str,
        to: &str,
        amount: Decimal,
        currency: &str,
    ) -> Result<Transfer, AppError> {
        if from.is_empty() || to.is_empty() || amount <= Decimal::ZERO {
            return Err(AppError::RequiredArgumentMissing);
        }

        if from == to {
            return Err(AppError::SelfTransfer);
        }

        let store = Arc::clone(&self.store);
        let (from, to, currency) = (from.to_string(), to.to_string(), currency.to_string());
        let task = tokio::spawn(
            async move { run_transfer(store.as_ref(), &from, &to, amount, &currency).await }
                .in_current_span(),
        );

        task.await.map_err(|err| {
            tracing::error!(error = %err, "transfer task failed");
            AppError::TransactionFailed
        })?
    }
}

/// The transfer protocol proper, from `begin` to the ledger rows.
async fn run_transfer(
    store: &dyn LedgerStore,
    from: &str,
    to: &str,
    amount: Decimal,
    currency: &str,
) -> Result<Transfer, AppError> {
    let mut txn = store.begin().await?;

    let (payer, payee) = match lock_pair(txn.as_mut(), from, to).await {
        Ok(pair) => pair,
        Err(err) => {
            discard(txn).await;
            return Err(err);
        }
    };

    let mut transfer = Transfer::new(from, to, amount, payer.currency.as_str());

    let outcome = match check(&payer, &payee, amount, currency) {
        Ok(()) => commit_transfer(txn, &payer, &payee, amount).await,
        Err(err) => {
            // The ledger records the currency the caller asked for.
            if matches!(err, AppError::WrongCurrency) {
                transfer.currency = currency.to_string();
            }
            discard(txn).await;
            Err(err)
        }
    };

    record(store, &transfer, outcome.as_ref().err()).await;

    match outcome {
        Ok(()) => Ok(transfer),
        Err(err) => {
            tracing::debug!(
                payer = %transfer.payer,
                payee = %transfer.payee,
                currency = %transfer.currency,
                error = %err,
                "transfer rejected"
            );
            Err(err)
        }
    }
}

/// Append the ledger rows describing a transfer attempt.
async fn record(store: &dyn LedgerStore, transfer: &Transfer, failure: Option<&AppError>) {
    let error = failure.map(ToString::to_string).unwrap_or_default();
    append(store, transfer.ledger_entry(Direction::Outgoing, error)).await;

    if failure.is_none() {
        append(store, transfer.ledger_entry(Direction::Incoming, "")).await;
    }
}

async fn append(store: &dyn LedgerStore, entry: NewLedgerEntry) {
    let direction = entry.direction;
    if let Err(err) = store.append_ledger_entry(entry).await {
        tracing::error!(%direction, error = %err, "failed to append ledger entry");
    }
}

/// Order in which the rows of a transfer between `from` and `to` are locked.
///
/// Lexicographic on the identifiers, independent of which side pays.
pub fn lock_order<'a>(from: &'a str, to: &'a str) -> [&'a str; 2] {
    if from > to { [to, from] } else { [from, to] }
}

/// Lock both accounts and return them as `(payer, payee)`.
async fn lock_pair(
    txn: &mut dyn StoreTxn,
    payer_id: &str,
    payee_id: &str,
) -> Result<(Account, Account), AppError> {
    let [first_id, second_id] = lock_order(payer_id, payee_id);
    let first = lock_account(txn, first_id, payer_id).await?;
    let second = lock_account(txn, second_id, payer_id).await?;

    if first_id == payer_id {
        Ok((first, second))
    } else {
        Ok((second, first))
    }
}

/// Lock one account; a missing row is reported by the role it plays.
async fn lock_account(
    txn: &mut dyn StoreTxn,
    user_id: &str,
    payer_id: &str,
) -> Result<Account, AppError> {
    txn.lock_and_fetch(user_id).await.map_err(|err| match err {
        StoreError::NotFound(_) if user_id == payer_id => AppError::PayerNotFound,
        StoreError::NotFound(_) => AppError::PayeeNotFound,
        other => AppError::Store(other),
    })
}

/// Business checks, in the order they take precedence.
fn check(
    payer: &Account,
    payee: &Account,
    amount: Decimal,
    requested_currency: &str,
) -> Result<(), AppError> {
    if !requested_currency.is_empty() && requested_currency != payer.currency {
        return Err(AppError::WrongCurrency);
    }

    if payer.currency != payee.currency {
        return Err(AppError::DifferentCurrency);
    }

    if payer.balance < amount {
        return Err(AppError::InsufficientFunds);
    }

    Ok(())
}

/// Write both balances and commit. Consumes the transaction either way.
async fn commit_transfer(
    mut txn: Box<dyn StoreTxn>,
    payer: &Account,
    payee: &Account,
    amount: Decimal,
) -> Result<(), AppError> {
    let (Some(debited), Some(credited)) = (
        payer.balance.checked_sub(amount),
        payee.balance.checked_add(amount),
    ) else {
        tracing::warn!(payer = %payer.user_id, payee = %payee.user_id, "balance overflow");
        discard(txn).await;
        return Err(AppError::TransactionFailed);
    };

    let written = match txn.set_balance(&payer.user_id, debited).await {
        Ok(()) => txn.set_balance(&payee.user_id, credited).await,
        Err(err) => Err(err),
    };

    if let Err(err) = written {
        tracing::warn!(error = %err, "balance update failed");
        discard(txn).await;
        return Err(AppError::TransactionFailed);
    }

    txn.commit().await.map_err(|err| {
        tracing::warn!(error = %err, "commit failed");
        AppError::TransactionFailed
    })
}

/// Roll back, logging rather than propagating a failed rollback.
async fn discard(txn: Box<dyn StoreTxn>) {
    if let Err(err) = txn.rollback().await {
        tracing::warn!(error = %err, "rollback failed");
    }
}

#[async_trait]
impl PaymentService for Payments {
    async fn health_check(&self) -> Result<bool, AppError> {
        self.store.ping().await?;
        Ok(true)
    }

    async fn list_accounts(&self) -> Result<Vec<Account>, AppError> {
        Ok(self.store.list_accounts().await?)
    }

    async fn list_transactions(&self) -> Result<Vec<TransactionRecord>, AppError> {
        Ok(self.store.list_transactions().await?)
    }

    async fn transfer(&self, request: TransferRequest) -> Result<Transfer, AppError> {
        self.execute_transfer(
            &request.from,
            &request.to,
            request.amount,
            &request.currency,
        )
        .await
    }
}
