use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;
use verdict_contract::Submission;

/// Status and raw body bytes of a completed HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RawExchange {
    /// Response status.
    pub status: u16,
    /// Response body as received; may be empty or not JSON at all.
    pub body: Vec<u8>,
}

impl RawExchange {
    /// Creates an exchange result.
    #[must_use]
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// The exchange never produced a response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The configured timeout fired first.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    /// Connection, DNS, TLS or protocol failure.
    #[error("network error: {0}")]
    Network(String),
}

/// Sends a submission to the decision endpoint.
#[async_trait]
pub trait VerdictTransport: Send + Sync {
    /// Posts the submission and returns whatever the server answered.
    async fn exchange(&self, url: &str, submission: &Submission)
        -> Result<RawExchange, TransportError>;
}

/// reqwest-backed transport.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    timeout: Option<Duration>,
}

impl HttpTransport {
    /// Creates a transport; `None` waits indefinitely.
    pub fn new(timeout: Option<Duration>) -> Result<Self> {
        let client = Client::builder()
            .user_agent("verdict-sandbox/renderer")
            .build()
            .context("building renderer http client")?;
        Ok(Self { client, timeout })
    }

    /// Configured timeout.
    #[must_use]
    pub const fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    fn classify(&self, err: &reqwest::Error) -> TransportError {
        if err.is_timeout() {
            TransportError::Timeout(self.timeout.unwrap_or_default())
        } else {
            TransportError::Network(err.to_string())
        }
    }
}

#[async_trait]
impl VerdictTransport for HttpTransport {
    async fn exchange(
        &self,
        url: &str,
        submission: &Submission,
    ) -> Result<RawExchange, TransportError> {
        let mut request = self.client.post(url).json(submission);
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }
        let response = request.send().await.map_err(|err| self.classify(&err))?;
        let status = response.status().as_u16();
        let body = match response.bytes().await {
            Ok(bytes) => bytes.to_vec(),
            Err(err) if err.is_timeout() => return Err(self.classify(&err)),
            Err(err) => {
                debug!(status, error = %err, "response body unreadable, treating as empty");
                Vec::new()
            }
        };
        Ok(RawExchange { status, body })
    }
}
