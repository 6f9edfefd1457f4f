//! HTTP client creation and the transport seam used by the fetcher

use std::future::Future;
use std::time::Duration;

use bytes::Bytes;
use reqwest::{Client, RequestBuilder};
use thiserror::Error;

use super::urls::EndpointRequest;

/// Creates a properly configured HTTP client with connection pooling and timeout handling.
///
/// # Features
/// * Per-attempt timeout (default: 30 seconds, configurable via config/env)
/// * Connection pooling with centralized pool size configuration
/// * Retry logic lives in the fetcher, not in the client
pub fn create_http_client_with_timeout(timeout_seconds: u64) -> Result<Client, reqwest::Error> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_seconds))
        .pool_max_idle_per_host(crate::constants::HTTP_POOL_MAX_IDLE_PER_HOST)
        .build()
}

/// Failure below the HTTP status line: refused connection, DNS, timeout,
/// or a body that could not be read.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct TransportError {
    message: String,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        let kind = if e.is_timeout() {
            "timeout"
        } else if e.is_connect() {
            "connection failed"
        } else if e.is_body() || e.is_decode() {
            "body error"
        } else {
            "request error"
        };
        Self::new(format!("{kind}: {e}"))
    }
}

/// Sends one GET for an [`EndpointRequest`].
///
/// Each call builds a fresh request, so nothing carries over between attempts.
pub trait Transport: Send + Sync + 'static {
    type Response: TransportResponse;

    fn send(
        &self,
        request: &EndpointRequest,
    ) -> impl Future<Output = Result<Self::Response, TransportError>> + Send;
}

/// A received status line plus an unread body.
///
/// Dropping the value releases the underlying connection; reading the body
/// consumes it.
pub trait TransportResponse: Send {
    fn status(&self) -> u16;

    fn bytes(self) -> impl Future<Output = Result<Bytes, TransportError>> + Send;
}

/// Adds each header pair with `append`, so repeated keys become repeated lines.
pub fn apply_headers(builder: RequestBuilder, request: &EndpointRequest) -> RequestBuilder {
    request
        .headers()
        .iter()
        .fold(builder, |builder, (key, value)| {
            builder.header(key.as_str(), value.as_str())
        })
}

impl Transport for Client {
    type Response = reqwest::Response;

    fn send(
        &self,
        request: &EndpointRequest,
    ) -> impl Future<Output = Result<Self::Response, TransportError>> + Send {
        let builder = apply_headers(self.get(request.url()), request);
        async move { builder.send().await.map_err(TransportError::from) }
    }
}

impl TransportResponse for reqwest::Response {
    fn status(&self) -> u16 {
        reqwest::Response::status(self).as_u16()
    }

    fn bytes(self) -> impl Future<Output = Result<Bytes, TransportError>> + Send {
        async move {
            reqwest::Response::bytes(self)
                .await
                .map_err(TransportError::from)
        }
    }
}

/// Creates an HTTP client for testing with default timeout
#[cfg(test)]
pub fn create_test_http_client() -> Client {
    create_http_client_with_timeout(crate::constants::DEFAULT_HTTP_TIMEOUT_SECONDS)
        .expect("Failed to create test HTTP client")
}
