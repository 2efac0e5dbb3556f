//! slskd HTTP client.
//!
//! Provides communication with the slskd daemon's REST API for searches and
//! download transfers.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::service::{TransferError, TransferService};
use super::types::*;
use crate::config::SlskdSettings;

/// Header carrying the slskd API key.
const API_KEY_HEADER: &str = "X-API-Key";

/// Rounds of unchanged response count after which a search is stopped early.
const STABLE_ROUNDS_TO_STOP: u32 = 5;

/// Extra time granted to a search beyond its own timeout.
const SEARCH_GRACE: Duration = Duration::from_secs(10);

/// Client for communicating with slskd.
#[derive(Clone)]
pub struct SlskdClient {
    http_client: Client,
    base_url: String,
    api_key: String,
    search_poll_interval: Duration,
}

impl SlskdClient {
    /// Create a new SlskdClient.
    ///
    /// # Arguments
    /// * `base_url` - Base URL of slskd (e.g., "http://localhost:5030")
    /// * `api_key` - API key configured in slskd
    pub fn new(base_url: String, api_key: String) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            search_poll_interval: Duration::from_secs(1),
        }
    }

    /// Build a client from settings, failing if no API key is configured.
    pub fn from_settings(settings: &SlskdSettings) -> Result<Self, TransferError> {
        if settings.api_key.is_empty() {
            return Err(TransferError::MissingApiKey);
        }
        Ok(Self::new(settings.host.clone(), settings.api_key.clone()))
    }

    /// Get the base URL of the daemon.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v0{}", self.base_url, path)
    }

    async fn send(
        &self,
        endpoint: &str,
        request: RequestBuilder,
    ) -> Result<Response, TransferError> {
        let response = request.header(API_KEY_HEADER, &self.api_key).send().await?;
        if !response.status().is_success() {
            return Err(TransferError::Status {
                endpoint: endpoint.to_string(),
                status: response.status(),
            });
        }
        Ok(response)
    }

    // =========================================================================
    // Search Endpoints
    // =========================================================================

    /// Start a search and return its id.
    pub async fn start_search(
        &self,
        query: &str,
        timeout: Duration,
    ) -> Result<String, TransferError> {
        let body = SearchRequest {
            search_text: query.to_string(),
            search_timeout: timeout.as_millis() as u64,
        };
        let request = self.http_client.post(self.url("/searches")).json(&body);
        let state: SearchState = self.send("start search", request).await?.json().await?;
        Ok(state.id)
    }

    /// Get the current state of a search.
    pub async fn search_state(&self, search_id: &str) -> Result<SearchState, TransferError> {
        let request = self
            .http_client
            .get(self.url(&format!("/searches/{}", search_id)));
        Ok(self.send("search state", request).await?.json().await?)
    }

    /// Stop a running search, keeping the responses gathered so far.
    pub async fn stop_search(&self, search_id: &str) -> Result<(), TransferError> {
        let request = self
            .http_client
            .put(self.url(&format!("/searches/{}", search_id)));
        self.send("stop search", request).await?;
        Ok(())
    }

    /// Get the responses collected by a search.
    pub async fn search_responses(
        &self,
        search_id: &str,
    ) -> Result<Vec<SearchResponse>, TransferError> {
        let request = self
            .http_client
            .get(self.url(&format!("/searches/{}/responses", search_id)));
        Ok(self.send("search responses", request).await?.json().await?)
    }

    /// Poll a search until it completes or its response count stabilizes.
    ///
    /// slskd only returns responses once a search is done, so a search whose
    /// response count stops growing is stopped early instead of waiting for
    /// the full timeout.
    async fn wait_for_search(
        &self,
        search_id: &str,
        timeout: Duration,
    ) -> Result<(), TransferError> {
        let deadline = Instant::now()
            .checked_add(timeout)
            .and_then(|d| d.checked_add(SEARCH_GRACE));
        let mut stable_rounds = 0;
        let mut prev_count = 0;
        let mut resp_count = 0;

        while deadline.map_or(true, |deadline| Instant::now() < deadline) {
            let state = self.search_state(search_id).await?;
            resp_count = state.response_count;
            if state.is_complete {
                return Ok(());
            }
            if resp_count > 0 && resp_count == prev_count {
                stable_rounds += 1;
                if stable_rounds >= STABLE_ROUNDS_TO_STOP {
                    debug!(
                        "Responses stabilized at {}, stopping search early",
                        resp_count
                    );
                    self.stop_search(search_id).await?;
                    tokio::time::sleep(self.search_poll_interval).await;
                    return Ok(());
                }
            } else {
                stable_rounds = 0;
            }
            prev_count = resp_count;
            tokio::time::sleep(self.search_poll_interval).await;
        }

        warn!(
            "Search {} timed out ({} responses so far)",
            search_id, resp_count
        );
        Ok(())
    }
}

#[async_trait]
impl TransferService for SlskdClient {
    async fn search(
        &self,
        query: &str,
        timeout: Duration,
    ) -> Result<Vec<SearchResponse>, TransferError> {
        let search_id = self
            .start_search(query, timeout)
            .await
            .map_err(|e| TransferError::Search(format!("failed to start search: {}", e)))?;
        info!("Search started (id={}): {}", search_id, query);

        self.wait_for_search(&search_id, timeout).await?;

        let responses = self
            .search_responses(&search_id)
            .await
            .map_err(|e| TransferError::Search(format!("failed to get search results: {}", e)))?;
        info!(
            "Search returned {} responses for: {}",
            responses.len(),
            query
        );
        Ok(responses)
    }

    async fn enqueue(&self, username: &str, files: &[RemoteFile]) -> Result<(), TransferError> {
        let url = self.url(&format!(
            "/transfers/downloads/{}",
            urlencoding::encode(username)
        ));
        let request = self.http_client.post(url).json(files);
        self.send("enqueue", request)
            .await
            .map_err(|e| TransferError::Enqueue {
                username: username.to_string(),
                reason: e.to_string(),
            })?;

        info!("Enqueued {} files from {}", files.len(), username);
        Ok(())
    }

    async fn list_downloads(&self) -> Result<Vec<UserTransfers>, TransferError> {
        let request = self.http_client.get(self.url("/transfers/downloads"));
        Ok(self.send("list downloads", request).await?.json().await?)
    }
}
