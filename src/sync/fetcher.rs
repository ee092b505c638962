//! HTTP access to the remote transcript archive.
//!
//! Every request goes through the per-domain rate limiter. The fetcher
//! hands back the raw status and body and leaves success/failure decisions
//! to the caller; `Err` is reserved for request-level failures (connect
//! errors, deadline exceeded), which callers treat like a non-200.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Url;
use tracing::debug;

use crate::config::SyncConfig;

use super::error::SyncError;
use super::ratelimit::DomainRateLimiter;

/// Raw result of one archive request.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub status: u16,
    pub body: String,
}

impl FetchResponse {
    /// Whether the archive answered 200.
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

/// Interface to the remote archive.
///
/// The sync engine only talks to the archive through this trait, so tests
/// can substitute an in-process implementation.
#[async_trait]
pub trait ArchiveFetcher: Send + Sync {
    /// Fetch the external index document listing candidate ids.
    async fn fetch_index(&self) -> Result<FetchResponse, SyncError>;

    /// Fetch stream metadata for one id.
    async fn fetch_metadata(&self, id_path: &str) -> Result<FetchResponse, SyncError>;

    /// Fetch the transcript document for one id.
    async fn fetch_transcript(&self, id_path: &str) -> Result<FetchResponse, SyncError>;
}

/// Production fetcher backed by reqwest.
pub struct ArchiveClient {
    client: reqwest::Client,
    limiter: DomainRateLimiter,
    base_url: String,
    index_url: String,
}

impl ArchiveClient {
    /// Build a client from the run configuration.
    pub fn new(config: &SyncConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            limiter: DomainRateLimiter::new(config.ratelimit),
            base_url: config.archive_base_url.trim_end_matches('/').to_string(),
            index_url: config.index_url.clone(),
        })
    }

    /// Perform one rate-limited GET.
    async fn get(&self, url: &str) -> Result<FetchResponse, SyncError> {
        self.limiter.acquire(&domain_of(url)).await;
        debug!(url, "GET");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| SyncError::Request {
                url: url.to_string(),
                source,
            })?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|source| SyncError::Request {
                url: url.to_string(),
                source,
            })?;

        Ok(FetchResponse { status, body })
    }
}

#[async_trait]
impl ArchiveFetcher for ArchiveClient {
    async fn fetch_index(&self) -> Result<FetchResponse, SyncError> {
        self.get(&self.index_url).await
    }

    async fn fetch_metadata(&self, id_path: &str) -> Result<FetchResponse, SyncError> {
        self.get(&format!("{}/stream/{}", self.base_url, id_path)).await
    }

    async fn fetch_transcript(&self, id_path: &str) -> Result<FetchResponse, SyncError> {
        self.get(&format!("{}/transcript/{}", self.base_url, id_path))
            .await
    }
}

/// Rate-limit key: the host portion of the URL.
fn domain_of(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_else(|| url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_of_extracts_host() {
        assert_eq!(
            domain_of("https://archive.example.com/stream/vid1"),
            "archive.example.com"
        );
        assert_eq!(
            domain_of("https://raw.githubusercontent.com/a/b/c.txt"),
            "raw.githubusercontent.com"
        );
    }

    #[test]
    fn test_domain_of_falls_back_to_raw_input() {
        assert_eq!(domain_of("not a url"), "not a url");
    }

    #[test]
    fn test_fetch_response_is_ok() {
        let ok = FetchResponse {
            status: 200,
            body: String::new(),
        };
        let not_found = FetchResponse {
            status: 404,
            body: "gone".to_string(),
        };
        assert!(ok.is_ok());
        assert!(!not_found.is_ok());
    }
}
