//! In-memory ledger store.
//!
//! Used by tests to drive the transfer protocol without a database. Each
//! account row owns an async mutex that plays the part of a row lock: a
//! transaction holds the guard until it commits, rolls back or is dropped.
//! Balance writes are staged inside the transaction and only become visible
//! on commit.

use std::{
    collections::{BTreeMap, HashSet},
    sync::Arc,
};

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use crate::{
    models::{Account, NewLedgerEntry, TransactionRecord},
    store::{LedgerStore, StoreError, StoreTxn},
};

/// Store operation that can be forced to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fault {
    Begin,
    LockAndFetch,
    SetBalance,
    Commit,
    AppendLedgerEntry,
}

/// Ledger store kept entirely in memory.
///
/// Cloning is cheap and every clone shares the same data.
#[derive(Debug, Clone, Default)]
pub struct MemoryLedgerStore {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    accounts: RwLock<BTreeMap<String, Row>>,
    ledger: Mutex<Vec<TransactionRecord>>,
    faults: Mutex<HashSet<Fault>>,
}

#[derive(Debug)]
struct Row {
    lock: Arc<Mutex<()>>,
    account: Account,
}

impl Inner {
    async fn check(&self, fault: Fault) -> Result<(), StoreError> {
        if !self.faults.lock().await.contains(&fault) {
            return Ok(());
        }

        let message = format!("injected {fault:?} failure");
        Err(match fault {
            Fault::Begin | Fault::LockAndFetch => StoreError::Unavailable(message),
            Fault::SetBalance | Fault::Commit | Fault::AppendLedgerEntry => {
                StoreError::WriteFailed(message)
            }
        })
    }
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store pre-populated with `accounts`.
    pub async fn with_accounts(accounts: impl IntoIterator<Item = Account>) -> Self {
        let store = Self::new();
        for account in accounts {
            store.insert_account(account).await;
        }
        store
    }

    /// Insert or replace an account.
    pub async fn insert_account(&self, account: Account) {
        let row = Row {
            lock: Arc::new(Mutex::new(())),
            account,
        };
        self.inner
            .accounts
            .write()
            .await
            .insert(row.account.user_id.clone(), row);
    }

    /// Committed state of one account.
    pub async fn account(&self, user_id: &str) -> Option<Account> {
        self.inner
            .accounts
            .read()
            .await
            .get(user_id)
            .map(|row| row.account.clone())
    }

    /// Remove every account and ledger row.
    pub async fn flush(&self) {
        self.inner.accounts.write().await.clear();
        self.inner.ledger.lock().await.clear();
    }

    /// Make every subsequent call of `fault`'s operation fail.
    pub async fn inject_fault(&self, fault: Fault) {
        self.inner.faults.lock().await.insert(fault);
    }

    pub async fn clear_faults(&self) {
        self.inner.faults.lock().await.clear();
    }
}

#[async_trait]
impl LedgerStore for MemoryLedgerStore {
    async fn begin(&self) -> Result<Box<dyn StoreTxn>, StoreError> {
        self.inner.check(Fault::Begin).await?;

        Ok(Box::new(MemoryTxn {
            inner: Arc::clone(&self.inner),
            held: BTreeMap::new(),
            staged: BTreeMap::new(),
        }))
    }

    async fn append_ledger_entry(&self, entry: NewLedgerEntry) -> Result<(), StoreError> {
        self.inner.check(Fault::AppendLedgerEntry).await?;

        let mut ledger = self.inner.ledger.lock().await;
        let id = i64::try_from(ledger.len())
            .map_err(|err| StoreError::WriteFailed(err.to_string()))?
            + 1;
        ledger.push(TransactionRecord {
            id,
            direction: entry.direction,
            date: Utc::now(),
            payer: entry.payer,
            payee: entry.payee,
            amount: entry.amount,
            currency: entry.currency,
            error: entry.error,
        });

        Ok(())
    }

    async fn list_accounts(&self) -> Result<Vec<Account>, StoreError> {
        let accounts = self.inner.accounts.read().await;
        Ok(accounts.values().map(|row| row.account.clone()).collect())
    }

    async fn list_transactions(&self) -> Result<Vec<TransactionRecord>, StoreError> {
        Ok(self.inner.ledger.lock().await.clone())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.inner.check(Fault::Begin).await
    }
}

/// Open in-memory transaction: held row guards plus staged balances.
struct MemoryTxn {
    inner: Arc<Inner>,
    held: BTreeMap<String, OwnedMutexGuard<()>>,
    staged: BTreeMap<String, Decimal>,
}

#[async_trait]
impl StoreTxn for MemoryTxn {
    async fn lock_and_fetch(&mut self, user_id: &str) -> Result<Account, StoreError> {
        self.inner.check(Fault::LockAndFetch).await?;

        if !self.held.contains_key(user_id) {
            // The map guard must be gone before waiting on the row.
            let lock = {
                let accounts = self.inner.accounts.read().await;
                accounts.get(user_id).map(|row| Arc::clone(&row.lock))
            }
            .ok_or_else(|| StoreError::NotFound(user_id.to_string()))?;

            let guard = lock.lock_owned().await;
            self.held.insert(user_id.to_string(), guard);

            // Let concurrent transfers interleave between two row locks.
            tokio::task::yield_now().await;
        }

        let mut account = self
            .inner
            .accounts
            .read()
            .await
            .get(user_id)
            .map(|row| row.account.clone())
            .ok_or_else(|| StoreError::NotFound(user_id.to_string()))?;

        if let Some(balance) = self.staged.get(user_id) {
            account.balance = *balance;
        }

        Ok(account)
    }

    async fn set_balance(&mut self, user_id: &str, balance: Decimal) -> Result<(), StoreError> {
        self.inner.check(Fault::SetBalance).await?;

        if !self.held.contains_key(user_id) {
            return Err(StoreError::WriteFailed(format!(
                "row {user_id} is not locked by this transaction"
            )));
        }

        self.staged.insert(user_id.to_string(), balance);
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.inner.check(Fault::Commit).await?;

        let mut accounts = self.inner.accounts.write().await;
        for (user_id, balance) in &self.staged {
            if let Some(row) = accounts.get_mut(user_id) {
                row.account.balance = *balance;
            }
        }

        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        Ok(())
    }
}
