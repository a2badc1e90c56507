//! `reqwest`-backed HTTP client shared by every network collaborator.

use async_trait::async_trait;
use dossier_core::error::SourceError;
use dossier_core::report::{HttpFetcher, HttpResponse};
use std::time::Duration;
use tracing::debug;

/// Plain GET fetcher with a browser-like `User-Agent`.
#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    client: reqwest::Client,
}

impl ReqwestFetcher {
    pub fn new(user_agent: &str) -> Result<Self, SourceError> {
        Ok(Self {
            client: build_client(user_agent)?,
        })
    }
}

/// Build a client; every collaborator shares the same user agent.
pub fn build_client(user_agent: &str) -> Result<reqwest::Client, SourceError> {
    reqwest::Client::builder()
        .user_agent(user_agent)
        .build()
        .map_err(|e| SourceError::Http {
            message: format!("Failed to create HTTP client: {}", e),
        })
}

/// Map a transport error, keeping timeouts distinguishable.
pub fn map_reqwest_error(err: reqwest::Error, timeout: Duration) -> SourceError {
    if err.is_timeout() {
        SourceError::Timeout {
            timeout_secs: timeout.as_secs(),
        }
    } else {
        SourceError::Http {
            message: err.to_string(),
        }
    }
}

#[async_trait]
impl HttpFetcher for ReqwestFetcher {
    async fn get(&self, url: &str, timeout: Duration) -> Result<HttpResponse, SourceError> {
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| map_reqwest_error(e, timeout))?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| map_reqwest_error(e, timeout))?;
        debug!(url, status, bytes = body.len(), "Fetched");

        Ok(HttpResponse {
            status,
            body: body.to_vec(),
        })
    }

    async fn get_text(&self, url: &str, timeout: Duration) -> Result<HttpResponse, SourceError> {
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| map_reqwest_error(e, timeout))?;

        let status = response.status().as_u16();
        // Decodes with the Content-Type charset, falling back to UTF-8.
        let text = response
            .text()
            .await
            .map_err(|e| map_reqwest_error(e, timeout))?;
        debug!(url, status, chars = text.len(), "Fetched text");

        Ok(HttpResponse {
            status,
            body: text.into_bytes(),
        })
    }
}
