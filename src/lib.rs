//! Payment System
//!
//! A REST service that lists account balances and payment history and
//! transfers funds between two accounts.
//!
//! # Architecture
//!
//! - **Web Framework**: Axum (async HTTP server)
//! - **Database**: PostgreSQL with sqlx (async queries, row locks)
//! - **Amounts**: `rust_decimal`, never floats
//! - **Format**: JSON requests/responses
//!
//! The transfer protocol lives in [`services::Payments`] and depends only on
//! the [`store::LedgerStore`] trait. Adapters (HTTP handlers, the HTTP
//! client) depend only on [`services::PaymentService`].

pub mod app;
pub mod client;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod services;
pub mod store;
