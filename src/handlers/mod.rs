//! HTTP request handlers (route handlers).
//!
//! Each handler decodes the request, calls the payment service held in
//! router state and wraps the result in a `"success": true` envelope.
//! Errors are rendered by [`crate::error::AppError`].

/// Account listing endpoint
pub mod accounts;
/// Service health endpoint
pub mod health;
/// Payment history endpoint
pub mod payments;
/// Transfer endpoint
pub mod transfer;
