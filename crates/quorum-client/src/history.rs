//! History REST collaborator.
//!
//! The paginator logic (guards, dedup, prepend) lives in `quorum-core`;
//! this module only performs the fetch. The [`HistoryFetcher`] trait is the
//! seam that lets tests substitute a scripted fetcher for the real HTTP
//! client.

use async_trait::async_trait;
use quorum_proto::HistoryPage;
use thiserror::Error;

/// History fetch errors. All recoverable: the caller clears the in-flight
/// guard and may retry with the same cursor.
#[derive(Debug, Error)]
pub enum HistoryError {
    /// The request did not complete or returned a failure status.
    #[error("history request failed: {0}")]
    Request(String),

    /// The response body was not a valid history page.
    #[error("history response invalid: {0}")]
    Decode(String),
}

/// Backward page fetches against the history endpoint.
#[async_trait]
pub trait HistoryFetcher: Send + Sync {
    /// Fetch up to `limit` messages older than `cursor` (or the newest
    /// page when no cursor is held yet).
    async fn fetch(&self, limit: u32, cursor: Option<&str>) -> Result<HistoryPage, HistoryError>;
}

/// [`HistoryFetcher`] backed by reqwest.
///
/// `GET {url}?limit=N[&cursor=C]` returning a [`HistoryPage`] body.
#[derive(Debug, Clone)]
pub struct RestHistoryFetcher {
    http: reqwest::Client,
    url: String,
}

impl RestHistoryFetcher {
    /// Fetcher for the given history endpoint.
    pub fn new(url: impl Into<String>) -> Self {
        Self { http: reqwest::Client::new(), url: url.into() }
    }
}

#[async_trait]
impl HistoryFetcher for RestHistoryFetcher {
    async fn fetch(&self, limit: u32, cursor: Option<&str>) -> Result<HistoryPage, HistoryError> {
        let mut request = self.http.get(&self.url).query(&[("limit", limit)]);
        if let Some(cursor) = cursor {
            request = request.query(&[("cursor", cursor)]);
        }

        let response = request
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| HistoryError::Request(e.to_string()))?;

        response.json::<HistoryPage>().await.map_err(|e| HistoryError::Decode(e.to_string()))
    }
}
