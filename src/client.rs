//! HTTP client for a remote payment system instance.
//!
//! [`HttpClient`] implements [`PaymentService`], so code written against the
//! service works the same in-process or over the network. Failed responses
//! are turned back into the typed [`AppError`] they were rendered from.

use async_trait::async_trait;
use reqwest::Response;
use serde::de::DeserializeOwned;
use url::Url;

use crate::{
    app::{ACCOUNTS_PATH, HEALTH_CHECK_PATH, PAYMENTS_PATH, TRANSFER_PATH},
    error::AppError,
    models::{
        Account, TransactionRecord, Transfer, TransferRequest,
        response::{
            AccountsResponse, ErrorResponse, HealthResponse, PaymentsResponse, TransferResponse,
        },
    },
    services::PaymentService,
};

/// Payment service living behind an HTTP endpoint.
#[derive(Debug, Clone)]
pub struct HttpClient {
    http: reqwest::Client,
    base: Url,
}

impl HttpClient {
    /// Create a client for `instance`.
    ///
    /// `instance` is usually `host:port`; `http://` is prepended when no
    /// scheme is given.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRequest` if `instance` is not a valid address.
    pub fn new(instance: &str) -> Result<Self, AppError> {
        let instance = if instance.starts_with("http") {
            instance.to_string()
        } else {
            format!("http://{instance}")
        };

        let base = Url::parse(&instance)
            .map_err(|err| AppError::InvalidRequest(format!("invalid instance address: {err}")))?;

        Ok(Self {
            http: reqwest::Client::builder().build()?,
            base,
        })
    }

    fn endpoint(&self, path: &str) -> Url {
        let mut url = self.base.clone();
        url.set_path(path);
        url
    }

    /// Decode a success body, or rebuild the error a failed response carries.
    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, AppError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<T>().await?);
        }

        let body: ErrorResponse = response.json().await?;
        Err(AppError::from_response(status.as_u16(), &body.error))
    }
}

#[async_trait]
impl PaymentService for HttpClient {
    async fn health_check(&self) -> Result<bool, AppError> {
        let response = self.http.get(self.endpoint(HEALTH_CHECK_PATH)).send().await?;
        let body: HealthResponse = Self::decode(response).await?;
        Ok(body.success)
    }

    async fn list_accounts(&self) -> Result<Vec<Account>, AppError> {
        let response = self.http.get(self.endpoint(ACCOUNTS_PATH)).send().await?;
        let body: AccountsResponse = Self::decode(response).await?;
        Ok(body.accounts)
    }

    async fn list_transactions(&self) -> Result<Vec<TransactionRecord>, AppError> {
        let response = self.http.get(self.endpoint(PAYMENTS_PATH)).send().await?;
        let body: PaymentsResponse = Self::decode(response).await?;

        body.payments
            .into_iter()
            .map(|view| {
                TransactionRecord::try_from(view).map_err(|err| AppError::Remote {
                    status: 200,
                    message: err.to_string(),
                })
            })
            .collect()
    }

    async fn transfer(&self, request: TransferRequest) -> Result<Transfer, AppError> {
        let response = self
            .http
            .post(self.endpoint(TRANSFER_PATH))
            .json(&request)
            .send()
            .await?;
        let body: TransferResponse = Self::decode(response).await?;
        Ok(body.into())
    }
}
