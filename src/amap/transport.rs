//! HTTP transport for the AMap REST API.

use super::error::AmapError;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Issues GET requests against the AMap API and returns the decoded JSON body.
///
/// Every failure surfaced here is a transport failure; interpreting the
/// body's `status` field is left to the client.
#[async_trait]
pub trait AmapTransport: Send + Sync {
    async fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<Value, AmapError>;
}

/// reqwest-backed transport with a fixed per-request timeout.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    base_url: String,
    timeout: Duration,
    http: reqwest::Client,
}

impl HttpTransport {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build AMap HTTP client")?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
            http,
        })
    }

    fn transport_error(&self, path: &str, err: reqwest::Error) -> AmapError {
        let message = if err.is_timeout() {
            format!("timed out after {}s", self.timeout.as_secs())
        } else if err.is_connect() {
            format!("connection failed: {}", err)
        } else {
            err.to_string()
        };
        AmapError::Transport {
            endpoint: path.to_string(),
            message,
        }
    }
}

#[async_trait]
impl AmapTransport for HttpTransport {
    async fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<Value, AmapError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("AMap GET {}", url);

        let resp = self
            .http
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| self.transport_error(path, e))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AmapError::Transport {
                endpoint: path.to_string(),
                message: format!("HTTP {}: {}", status, body),
            });
        }

        resp.json::<Value>()
            .await
            .map_err(|e| self.transport_error(path, e))
    }
}
