//! Logging middleware for [`PaymentService`].

use async_trait::async_trait;
use tracing::Instrument;

use crate::{
    error::AppError,
    models::{Account, TransactionRecord, Transfer, TransferRequest},
    services::PaymentService,
};

/// Wraps a service and emits one tracing event per call.
pub struct LoggingService<S> {
    next: S,
}

impl<S: PaymentService> LoggingService<S> {
    pub fn new(next: S) -> Self {
        Self { next }
    }
}

#[async_trait]
impl<S: PaymentService> PaymentService for LoggingService<S> {
    async fn health_check(&self) -> Result<bool, AppError> {
        let result = self.next.health_check().await;
        match &result {
            Ok(healthy) => tracing::info!(method = "health_check", success = healthy),
            Err(err) => tracing::warn!(method = "health_check", error = %err),
        }
        result
    }

    async fn list_accounts(&self) -> Result<Vec<Account>, AppError> {
        let result = self.next.list_accounts().await;
        match &result {
            Ok(accounts) => tracing::info!(method = "list_accounts", count = accounts.len()),
            Err(err) => tracing::warn!(method = "list_accounts", error = %err),
        }
        result
    }

    async fn list_transactions(&self) -> Result<Vec<TransactionRecord>, AppError> {
        let result = self.next.list_transactions().await;
        match &result {
            Ok(records) => tracing::info!(method = "list_transactions", count = records.len()),
            Err(err) => tracing::warn!(method = "list_transactions", error = %err),
        }
        result
    }

    async fn transfer(&self, request: TransferRequest) -> Result<Transfer, AppError> {
        let span = tracing::info_span!(
            "transfer",
            from = %request.from,
            to = %request.to,
            amount = %request.amount,
            currency = %request.currency,
        );
        let result = self
            .next
            .transfer(request)
            .instrument(span.clone())
            .await;
        match &result {
            Ok(transfer) => tracing::info!(
                parent: &span,
                method = "transfer",
                currency = %transfer.currency,
                "transfer committed"
            ),
            Err(err) if err.is_business_rule() => tracing::info!(
                parent: &span,
                method = "transfer",
                error = %err,
                "transfer rejected"
            ),
            Err(err) => tracing::error!(
                parent: &span,
                method = "transfer",
                error = %err,
                "transfer failed"
            ),
        }
        result
    }
}
