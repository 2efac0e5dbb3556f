//! The transfer service seam.
//!
//! Everything the dispatcher and reconciler need from the download daemon goes
//! through [`TransferService`], so tests can script the daemon's answers.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

use super::types::{RemoteFile, SearchResponse, UserTransfers};

/// Errors returned by the transfer service.
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("slskd API key is required. Set it in config.toml or SLSKD_API_KEY env var.")]
    MissingApiKey,

    #[error("Failed to enqueue download from {username}: {reason}")]
    Enqueue { username: String, reason: String },

    #[error("Search failed: {0}")]
    Search(String),

    #[error("{endpoint} returned status {status}")]
    Status {
        endpoint: String,
        status: reqwest::StatusCode,
    },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Operations consumed from the external transfer daemon.
#[cfg_attr(feature = "mock", mockall::automock)]
#[async_trait]
pub trait TransferService: Send + Sync {
    /// Run a network search and return every peer response collected
    /// within `timeout`.
    async fn search(
        &self,
        query: &str,
        timeout: Duration,
    ) -> Result<Vec<SearchResponse>, TransferError>;

    /// Queue files for download from a peer.
    ///
    /// Any failure is reported as [`TransferError::Enqueue`].
    async fn enqueue(&self, username: &str, files: &[RemoteFile]) -> Result<(), TransferError>;

    /// Current downloads grouped by peer and directory.
    async fn list_downloads(&self) -> Result<Vec<UserTransfers>, TransferError>;
}
