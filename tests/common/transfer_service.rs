//! Scripted stand-in for the slskd daemon.

use async_trait::async_trait;
use rymfetch::transfer::{
    RemoteFile, SearchResponse, TransferError, TransferService, UserTransfers,
};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

/// Transfer service answering from a script.
///
/// Each `list_downloads` call pops the next scripted poll; once the script is
/// exhausted the last successful poll is repeated. A `None` entry answers
/// with an error.
#[derive(Default)]
pub struct FakeTransferService {
    search_results: Mutex<HashMap<String, Vec<SearchResponse>>>,
    search_calls: Mutex<usize>,
    polls: Mutex<VecDeque<Option<Vec<UserTransfers>>>>,
    last_poll: Mutex<Vec<UserTransfers>>,
    refused_peers: Mutex<HashSet<String>>,
    enqueued: Mutex<Vec<(String, Vec<String>)>>,
    list_calls: Mutex<usize>,
}

#[allow(dead_code)]
impl FakeTransferService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search_results(self, query: &str, responses: Vec<SearchResponse>) -> Self {
        self.search_results
            .lock()
            .unwrap()
            .insert(query.to_string(), responses);
        self
    }

    /// Append one `list_downloads` answer to the script.
    pub fn then_report(self, transfers: Vec<UserTransfers>) -> Self {
        self.polls.lock().unwrap().push_back(Some(transfers));
        self
    }

    /// Append one failing `list_downloads` call to the script.
    pub fn then_fail(self) -> Self {
        self.polls.lock().unwrap().push_back(None);
        self
    }

    pub fn refusing(self, username: &str) -> Self {
        self.refused_peers
            .lock()
            .unwrap()
            .insert(username.to_string());
        self
    }

    /// Peers passed to `enqueue`, in call order, refused calls included.
    pub fn enqueued_peers(&self) -> Vec<String> {
        self.enqueued
            .lock()
            .unwrap()
            .iter()
            .map(|(peer, _)| peer.clone())
            .collect()
    }

    /// Filenames passed to the n-th `enqueue` call.
    pub fn enqueued_files(&self, call: usize) -> Vec<String> {
        self.enqueued.lock().unwrap()[call].1.clone()
    }

    pub fn list_calls(&self) -> usize {
        *self.list_calls.lock().unwrap()
    }

    pub fn search_calls(&self) -> usize {
        *self.search_calls.lock().unwrap()
    }
}

#[async_trait]
impl TransferService for FakeTransferService {
    async fn search(
        &self,
        query: &str,
        _timeout: Duration,
    ) -> Result<Vec<SearchResponse>, TransferError> {
        *self.search_calls.lock().unwrap() += 1;
        Ok(self
            .search_results
            .lock()
            .unwrap()
            .get(query)
            .cloned()
            .unwrap_or_default())
    }

    async fn enqueue(&self, username: &str, files: &[RemoteFile]) -> Result<(), TransferError> {
        self.enqueued.lock().unwrap().push((
            username.to_string(),
            files.iter().map(|f| f.filename.clone()).collect(),
        ));
        if self.refused_peers.lock().unwrap().contains(username) {
            return Err(TransferError::Enqueue {
                username: username.to_string(),
                reason: "User is offline".to_string(),
            });
        }
        Ok(())
    }

    async fn list_downloads(&self) -> Result<Vec<UserTransfers>, TransferError> {
        *self.list_calls.lock().unwrap() += 1;
        let mut last = self.last_poll.lock().unwrap();
        match self.polls.lock().unwrap().pop_front() {
            Some(Some(next)) => *last = next,
            Some(None) => {
                return Err(TransferError::Status {
                    endpoint: "list downloads".to_string(),
                    status: reqwest::StatusCode::BAD_GATEWAY,
                });
            }
            None => {}
        }
        Ok(last.clone())
    }
}
