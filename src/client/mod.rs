//! Platform API client
//!
//! Typed JSON-over-HTTP client for the function platform.
//!
//! # Example
//!
//! ```no_run
//! use fl_e2e::client::{FunctionClient, FunctionIdentity};
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = FunctionClient::new("localhost:4000", Duration::from_secs(30))?;
//! let cancel = CancellationToken::new();
//! let identity = FunctionIdentity::new("hellojs", "helloNS");
//!
//! let created = client
//!     .create(&cancel, &identity.creation("function main() {}", "nodejs"))
//!     .await?;
//! assert_eq!(created.result.result, "hellojs");
//! # Ok(())
//! # }
//! ```
//!
//! # Tracing
//!
//! | Operation | Span Name | Attributes |
//! |-----------|-----------|------------|
//! | create | `fl.create` | function, namespace, image, status_code |
//! | invoke | `fl.invoke` | function, namespace, has_args, status_code |
//! | delete | `fl.delete` | function, namespace, status_code |
//! | list | `fl.list` | namespace, status_code |

mod models;

pub use models::{
    CreationSuccess, DeletionSuccess, FunctionCreation, FunctionDeletion, FunctionIdentity,
    FunctionInvocation, FunctionListing, InvocationSuccess, ListSuccess,
};

use crate::gate::base_url;
use crate::metrics;
use models::ErrorBody;
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// API client errors
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Request error: {0}")]
    RequestError(String),

    #[error("Platform returned {status}: {message}")]
    StatusError { status: StatusCode, message: String },

    #[error("Response error: {0}")]
    ResponseError(String),

    #[error("Request cancelled")]
    Cancelled,
}

/// Decoded body plus the HTTP details it came with
#[derive(Debug, Clone)]
pub struct ApiResponse<T> {
    pub result: T,
    pub status: StatusCode,
    pub headers: HeaderMap,
}

/// Client for the create/invoke/delete/list endpoints
#[derive(Debug, Clone)]
pub struct FunctionClient {
    base_url: String,
    http_client: reqwest::Client,
}

impl FunctionClient {
    /// Build a client for `host`; a host without scheme gets `http://`
    pub fn new(host: &str, timeout: Duration) -> Result<Self, ApiError> {
        if host.trim().is_empty() {
            return Err(ApiError::ConfigError("host cannot be empty".into()));
        }

        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::ConfigError(e.to_string()))?;

        Ok(Self {
            base_url: base_url(host),
            http_client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Create a function. The platform echoes the name back on success.
    #[tracing::instrument(
        name = "fl.create",
        skip(self, cancel, request),
        fields(
            fl.function = %request.name,
            fl.namespace = %request.namespace,
            fl.image = %request.image,
            http.status_code = tracing::field::Empty
        ),
        err
    )]
    pub async fn create(
        &self,
        cancel: &CancellationToken,
        request: &FunctionCreation,
    ) -> Result<ApiResponse<CreationSuccess>, ApiError> {
        self.post("create", "/create", request, cancel).await
    }

    /// Invoke a function. Without args the platform applies its defaults.
    #[tracing::instrument(
        name = "fl.invoke",
        skip(self, cancel, request),
        fields(
            fl.function = %request.function,
            fl.namespace = %request.namespace,
            fl.has_args = request.args.is_some(),
            http.status_code = tracing::field::Empty
        ),
        err
    )]
    pub async fn invoke(
        &self,
        cancel: &CancellationToken,
        request: &FunctionInvocation,
    ) -> Result<ApiResponse<InvocationSuccess>, ApiError> {
        self.post("invoke", "/invoke", request, cancel).await
    }

    /// Delete a function. The platform echoes the name back on success.
    #[tracing::instrument(
        name = "fl.delete",
        skip(self, cancel, request),
        fields(
            fl.function = %request.name,
            fl.namespace = %request.namespace,
            http.status_code = tracing::field::Empty
        ),
        err
    )]
    pub async fn delete(
        &self,
        cancel: &CancellationToken,
        request: &FunctionDeletion,
    ) -> Result<ApiResponse<DeletionSuccess>, ApiError> {
        self.post("delete", "/delete", request, cancel).await
    }

    /// List the functions of a namespace
    #[tracing::instrument(
        name = "fl.list",
        skip(self, cancel, request),
        fields(
            fl.namespace = %request.namespace,
            http.status_code = tracing::field::Empty
        ),
        err
    )]
    pub async fn list(
        &self,
        cancel: &CancellationToken,
        request: &FunctionListing,
    ) -> Result<ApiResponse<ListSuccess>, ApiError> {
        self.post("list", "/list", request, cancel).await
    }

    async fn post<B, T>(
        &self,
        operation: &'static str,
        path: &str,
        body: &B,
        cancel: &CancellationToken,
    ) -> Result<ApiResponse<T>, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let started = Instant::now();

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ApiError::Cancelled),
            result = self.send(path, body) => result,
        };

        metrics::record_api_request(operation, result.is_ok(), started.elapsed().as_secs_f64());
        result
    }

    async fn send<B, T>(&self, path: &str, body: &B) -> Result<ApiResponse<T>, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);

        let response = self
            .http_client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| ApiError::RequestError(e.to_string()))?;

        let status = response.status();
        let headers = response.headers().clone();
        tracing::Span::current().record("http.status_code", status.as_u16());

        let text = response
            .text()
            .await
            .map_err(|e| ApiError::ResponseError(e.to_string()))?;

        if !status.is_success() {
            return Err(ApiError::StatusError {
                status,
                message: error_message(&text),
            });
        }

        let result = serde_json::from_str(&text)
            .map_err(|e| ApiError::ResponseError(format!("{}: {}", e, text)))?;

        Ok(ApiResponse {
            result,
            status,
            headers,
        })
    }
}

/// Pull the `error` field out of a failure body, falling back to the raw text
fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody {
            error: serde_json::Value::String(message),
        }) => message,
        Ok(ErrorBody { error }) => error.to_string(),
        Err(_) => body.trim().to_string(),
    }
}
