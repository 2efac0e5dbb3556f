//! Search and enqueue albums through the transfer service.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::album::Album;
use crate::config::SearchSettings;
use crate::outcome::{SearchOutcome, SearchResults};
use crate::search::{filter, rank, Candidate};
use crate::transfer::TransferService;

/// Result of queueing the active alternative of every album.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub queued: usize,
    pub skipped: usize,
    /// Peers with at least one queued album.
    pub peers: HashSet<String>,
    /// Albums that had a candidate but whose enqueue failed.
    pub failed_labels: Vec<String>,
}

/// Keep the best `max_alternatives` candidates, starting with the first.
pub fn build_outcome(ranked: Vec<Candidate>, max_alternatives: usize) -> Option<SearchOutcome> {
    SearchOutcome::from_ranked(ranked, max_alternatives)
}

pub struct Dispatcher {
    service: Arc<dyn TransferService>,
    settings: SearchSettings,
}

impl Dispatcher {
    pub fn new(service: Arc<dyn TransferService>, settings: SearchSettings) -> Self {
        Self { service, settings }
    }

    /// Search the network for one album and pick its alternatives.
    pub async fn search_album(&self, album: &Album) -> Option<SearchOutcome> {
        let query = album.search_query();
        info!("Searching: {}", query);

        let responses = match self
            .service
            .search(&query, self.settings.search_timeout)
            .await
        {
            Ok(responses) => responses,
            Err(e) => {
                error!("Search failed for {}: {}", query, e);
                return None;
            }
        };

        let candidates = filter(&responses, &self.settings, Some(album));
        let ranked = rank(candidates, &self.settings);
        let Some(outcome) = build_outcome(ranked, self.settings.max_alternatives) else {
            warn!("No results for: {}", album);
            return None;
        };

        if let Some(best) = outcome.active() {
            info!(
                "Auto-selected: {} [{} {}kbps] from {}",
                album, best.format, best.bitrate, best.username
            );
        }
        Some(outcome)
    }

    /// Search every album in list order. Albums without results map to
    /// `None`; repeated albums are searched once.
    pub async fn search_all(&self, albums: &[Album]) -> SearchResults {
        let mut results = SearchResults::new();
        for album in albums {
            let label = album.label();
            if results.contains_key(&label) {
                debug!("Already searched: {}", label);
                continue;
            }
            let outcome = self.search_album(album).await;
            results.insert(label, outcome);
        }
        results
    }

    /// Enqueue the active alternative of every album.
    pub async fn enqueue_all(&self, results: &SearchResults) -> DispatchReport {
        let mut report = DispatchReport::default();

        for (label, outcome) in results {
            let Some(candidate) = outcome.as_ref().and_then(|o| o.active()) else {
                report.skipped += 1;
                continue;
            };

            match self
                .service
                .enqueue(&candidate.username, &candidate.files)
                .await
            {
                Ok(()) => {
                    info!(
                        "Queued: {} ({} files from {})",
                        label,
                        candidate.files.len(),
                        candidate.username
                    );
                    report.queued += 1;
                    report.peers.insert(candidate.username.clone());
                }
                Err(e) => {
                    error!("Failed to queue {}: {}", label, e);
                    report.skipped += 1;
                    report.failed_labels.push(label.clone());
                }
            }
        }

        info!(
            "Queued: {} from {} peers, skipped: {}",
            report.queued,
            report.peers.len(),
            report.skipped
        );
        report
    }
}
