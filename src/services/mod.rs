//! Business logic services.
//!
//! [`PaymentService`] is the boundary every adapter talks to: the HTTP
//! handlers consume it and the HTTP client implements it. The core
//! implementation is [`Payments`]; [`LoggingService`] decorates any
//! implementation with one tracing event per call.

pub mod logging;
pub mod payment_service;

use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    error::AppError,
    models::{Account, TransactionRecord, Transfer, TransferRequest},
    store::LedgerStore,
};

pub use logging::LoggingService;
pub use payment_service::Payments;

/// Operations the payment system exposes to adapters.
#[async_trait]
pub trait PaymentService: Send + Sync {
    async fn health_check(&self) -> Result<bool, AppError>;

    async fn list_accounts(&self) -> Result<Vec<Account>, AppError>;

    async fn list_transactions(&self) -> Result<Vec<TransactionRecord>, AppError>;

    /// Move `request.amount` from `request.from` to `request.to`.
    ///
    /// Returns the committed transfer, whose `currency` is the currency the
    /// money moved in.
    async fn transfer(&self, request: TransferRequest) -> Result<Transfer, AppError>;
}

/// Shared handle used as router state.
pub type SharedService = Arc<dyn PaymentService>;

/// Wire the payment service with its middlewares around `store`.
pub fn build(store: Arc<dyn LedgerStore>) -> SharedService {
    Arc::new(LoggingService::new(Payments::new(store)))
}
