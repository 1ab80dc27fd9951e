//! PostgreSQL ledger store.
//!
//! # Locking
//!
//! Account rows are locked with `FOR NO KEY UPDATE`. It blocks other writers
//! of the same row but, unlike `FOR UPDATE`, does not block inserts that
//! reference the key.
//!
//! # Ledger rows
//!
//! Ledger rows are inserted through the pool, not the open transaction, so a
//! rolled back transfer still leaves its audit record behind.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{Postgres, Transaction};

use crate::{
    db::DbPool,
    models::{Account, Direction, NewLedgerEntry, TransactionRecord},
    store::{LedgerStore, StoreError, StoreTxn},
};

const QUERY_LOCK: &str =
    "SELECT user_id, balance, currency FROM account WHERE user_id = $1 FOR NO KEY UPDATE";

const QUERY_UPDATE: &str = "UPDATE account SET balance = $1 WHERE user_id = $2";

const QUERY_INSERT: &str = r#"
    INSERT INTO payment (direction, payer, payee, amount, currency, error)
    VALUES ($1, $2, $3, $4, $5, $6)
"#;

/// Ledger store backed by a PostgreSQL connection pool.
#[derive(Debug, Clone)]
pub struct PgLedgerStore {
    pool: DbPool,
}

impl PgLedgerStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Raw `payment` row; `direction` is stored as text.
#[derive(Debug, sqlx::FromRow)]
struct PaymentRow {
    txn_id: i64,
    direction: String,
    date: DateTime<Utc>,
    payer: String,
    payee: String,
    amount: Decimal,
    currency: String,
    error: String,
}

impl TryFrom<PaymentRow> for TransactionRecord {
    type Error = StoreError;

    fn try_from(row: PaymentRow) -> Result<Self, Self::Error> {
        let direction = row
            .direction
            .parse::<Direction>()
            .map_err(|err| StoreError::Database(sqlx::Error::Decode(Box::new(err))))?;

        Ok(Self {
            id: row.txn_id,
            direction,
            date: row.date,
            payer: row.payer,
            payee: row.payee,
            amount: row.amount,
            currency: row.currency,
            error: row.error,
        })
    }
}

#[async_trait]
impl LedgerStore for PgLedgerStore {
    async fn begin(&self) -> Result<Box<dyn StoreTxn>, StoreError> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|err| StoreError::Unavailable(err.to_string()))?;

        Ok(Box::new(PgTxn { tx }))
    }

    async fn append_ledger_entry(&self, entry: NewLedgerEntry) -> Result<(), StoreError> {
        sqlx::query(QUERY_INSERT)
            .bind(entry.direction.as_str())
            .bind(entry.payer)
            .bind(entry.payee)
            .bind(entry.amount)
            .bind(entry.currency)
            .bind(entry.error)
            .execute(&self.pool)
            .await
            .map_err(|err| StoreError::WriteFailed(err.to_string()))?;

        Ok(())
    }

    async fn list_accounts(&self) -> Result<Vec<Account>, StoreError> {
        let accounts =
            sqlx::query_as::<_, Account>("SELECT user_id, balance, currency FROM account")
                .fetch_all(&self.pool)
                .await?;

        Ok(accounts)
    }

    async fn list_transactions(&self) -> Result<Vec<TransactionRecord>, StoreError> {
        let rows = sqlx::query_as::<_, PaymentRow>(
            r#"
            SELECT txn_id, direction, date, payer, payee, amount, currency, error
            FROM payment
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TransactionRecord::try_from).collect()
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|err| StoreError::Unavailable(err.to_string()))?;

        Ok(())
    }
}

/// Open PostgreSQL transaction.
///
/// sqlx rolls the transaction back when it is dropped uncommitted.
struct PgTxn {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl StoreTxn for PgTxn {
    async fn lock_and_fetch(&mut self, user_id: &str) -> Result<Account, StoreError> {
        sqlx::query_as::<_, Account>(QUERY_LOCK)
            .bind(user_id)
            .fetch_optional(&mut *self.tx)
            .await?
            .ok_or_else(|| StoreError::NotFound(user_id.to_string()))
    }

    async fn set_balance(&mut self, user_id: &str, balance: Decimal) -> Result<(), StoreError> {
        let updated = sqlx::query(QUERY_UPDATE)
            .bind(balance)
            .bind(user_id)
            .execute(&mut *self.tx)
            .await
            .map_err(|err| StoreError::WriteFailed(err.to_string()))?
            .rows_affected();

        if updated == 0 {
            return Err(StoreError::WriteFailed(format!("no account row for {user_id}")));
        }

        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.rollback().await?;
        Ok(())
    }
}
