use async_trait::async_trait;
use reqwest::{Client, Method, Url};
use thiserror::Error;

use crate::config::HttpMethod;

/// Why a request produced no HTTP status.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("connection refused or host unreachable: {0}")]
    Connect(String),
    #[error("request timed out: {0}")]
    Timeout(String),
    #[error("malformed response: {0}")]
    Decode(String),
    #[error("request failed: {0}")]
    Other(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        let msg = e.to_string();
        if e.is_connect() {
            TransportError::Connect(msg)
        } else if e.is_timeout() {
            TransportError::Timeout(msg)
        } else if e.is_decode() || e.is_body() {
            TransportError::Decode(msg)
        } else {
            TransportError::Other(msg)
        }
    }
}

/// Issues a single request and reports the response status.
///
/// Implementations must be cheap to call concurrently; every worker of a run
/// shares one instance.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, method: HttpMethod, url: &Url) -> Result<u16, TransportError>;
}

/// [`Transport`] backed by a single shared `reqwest` client.
///
/// No per-request timeout is configured: the run's deadline is the only
/// bound on an outstanding request.
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, method: HttpMethod, url: &Url) -> Result<u16, TransportError> {
        let request = match method {
            HttpMethod::Get => self.client.request(Method::GET, url.clone()),
            // empty body
            HttpMethod::Post => self.client.request(Method::POST, url.clone()).body(""),
        };
        let response = request.send().await?;
        Ok(response.status().as_u16())
    }
}
