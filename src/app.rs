//! HTTP router.

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::{handlers, services::SharedService};

pub const HEALTH_CHECK_PATH: &str = "/v1/healthcheck";
pub const ACCOUNTS_PATH: &str = "/v1/accounts";
pub const PAYMENTS_PATH: &str = "/v1/payments";
pub const TRANSFER_PATH: &str = "/v1/transfer";

/// Build the router serving `service`.
pub fn router(service: SharedService) -> Router {
    Router::new()
        .route(HEALTH_CHECK_PATH, get(handlers::health::health_check))
        .route(ACCOUNTS_PATH, get(handlers::accounts::list_accounts))
        .route(PAYMENTS_PATH, get(handlers::payments::list_payments))
        .route(TRANSFER_PATH, post(handlers::transfer::create_transfer))
        // Add distributed tracing middleware for observability
        .layer(TraceLayer::new_for_http())
        // Share the service with all handlers via State extraction
        .with_state(service)
}
