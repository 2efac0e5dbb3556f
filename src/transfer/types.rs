//! slskd API types.
//!
//! Defines search responses, file records and transfer listings as returned
//! by the slskd REST API (v0).

use serde::{Deserialize, Serialize};

// =============================================================================
// Search Types
// =============================================================================

/// A file offered by a peer in a search response.
///
/// The record is sent back verbatim when enqueueing, so fields this crate does
/// not interpret are kept in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteFile {
    /// Full remote path, usually with Windows separators.
    pub filename: String,
    #[serde(default)]
    pub size: u64,
    /// Extension as reported by the peer (may be empty or carry a dot).
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub extension: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bit_rate: Option<u32>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl RemoteFile {
    pub fn new(filename: impl Into<String>, size: u64) -> Self {
        Self {
            filename: filename.into(),
            size,
            extension: String::new(),
            bit_rate: None,
            extra: serde_json::Map::new(),
        }
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    pub fn with_bit_rate(mut self, bit_rate: u32) -> Self {
        self.bit_rate = Some(bit_rate);
        self
    }
}

/// One peer's answer to a search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub username: String,
    #[serde(default)]
    pub files: Vec<RemoteFile>,
    #[serde(default)]
    pub has_free_upload_slot: bool,
    #[serde(default)]
    pub upload_speed: u64,
    #[serde(default)]
    pub queue_length: u32,
}

/// Body for `POST /api/v0/searches`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    pub search_text: String,
    /// Search timeout in milliseconds.
    pub search_timeout: u64,
}

/// Search state from `GET /api/v0/searches/{id}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchState {
    pub id: String,
    #[serde(default)]
    pub is_complete: bool,
    #[serde(default)]
    pub response_count: usize,
}

// =============================================================================
// Transfer Types
// =============================================================================

/// State of a single file transfer.
///
/// slskd reports states as strings like `"Completed, Succeeded"`. Anything
/// that is not `Completed, *` is still moving and counts as in progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TransferState {
    InProgress(String),
    Succeeded,
    Cancelled,
    TimedOut,
    Errored,
    Rejected,
    /// A `Completed, X` value this crate does not know about.
    CompletedOther(String),
}

impl TransferState {
    /// Returns true if the transfer will not change state anymore.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TransferState::InProgress(_))
    }

    /// Returns true if the file finished and arrived intact.
    pub fn is_success(&self) -> bool {
        matches!(self, TransferState::Succeeded)
    }

    pub fn as_str(&self) -> &str {
        match self {
            TransferState::InProgress(raw) => raw,
            TransferState::Succeeded => "Completed, Succeeded",
            TransferState::Cancelled => "Completed, Cancelled",
            TransferState::TimedOut => "Completed, TimedOut",
            TransferState::Errored => "Completed, Errored",
            TransferState::Rejected => "Completed, Rejected",
            TransferState::CompletedOther(raw) => raw,
        }
    }
}

impl From<String> for TransferState {
    fn from(raw: String) -> Self {
        let Some(outcome) = raw.strip_prefix("Completed, ") else {
            return TransferState::InProgress(raw);
        };
        match outcome {
            "Succeeded" => TransferState::Succeeded,
            "Cancelled" => TransferState::Cancelled,
            "TimedOut" => TransferState::TimedOut,
            "Errored" => TransferState::Errored,
            "Rejected" => TransferState::Rejected,
            _ => TransferState::CompletedOther(raw),
        }
    }
}

impl From<&str> for TransferState {
    fn from(raw: &str) -> Self {
        TransferState::from(raw.to_string())
    }
}

impl From<TransferState> for String {
    fn from(state: TransferState) -> Self {
        state.as_str().to_string()
    }
}

/// A file inside a transfer directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferFile {
    #[serde(default)]
    pub filename: String,
    pub state: TransferState,
}

/// A remote directory being downloaded from one peer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferDirectory {
    /// Remote directory path, as reported by the daemon.
    pub directory: String,
    #[serde(default)]
    pub files: Vec<TransferFile>,
}

/// All downloads from one peer, from `GET /api/v0/transfers/downloads`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserTransfers {
    pub username: String,
    #[serde(default)]
    pub directories: Vec<TransferDirectory>,
}

/// Normalize a remote path so that `A\B\C` and `A/B/C` compare equal.
pub fn normalize_remote_path(path: &str) -> String {
    path.replace('\\', "/")
}
