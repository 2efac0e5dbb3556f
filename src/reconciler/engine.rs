//! The transfer reconciliation loop.
//!
//! The reconciler watches one remote directory per album. Each poll it asks
//! the transfer service for the current downloads, classifies the watched
//! directories, organizes the ones that completed and moves failed albums on
//! to their next alternative.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::classify::{classify, DirectoryVerdict};
use super::clock::{Clock, TokioClock};
use crate::config::DownloadSettings;
use crate::organizer::{OrganizeTally, Organizer};
use crate::outcome::{load_results, save_results, SearchResults};
use crate::search::Candidate;
use crate::transfer::{normalize_remote_path, TransferService};

/// Timing of the polling loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileSettings {
    /// Total wall-clock budget, measured from the start of [`Reconciler::run`].
    pub timeout: Duration,
    pub poll_interval: Duration,
}

impl From<&DownloadSettings> for ReconcileSettings {
    fn from(settings: &DownloadSettings) -> Self {
        Self {
            timeout: settings.timeout,
            poll_interval: settings.poll_interval,
        }
    }
}

/// A remote directory awaited for one album.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchedDirectory {
    pub album_label: String,
    /// Remote path as the peer reported it, separators untouched.
    pub raw_path: String,
    pub username: String,
}

pub struct Reconciler {
    service: Arc<dyn TransferService>,
    clock: Arc<dyn Clock>,
    organizer: Organizer,
    settings: ReconcileSettings,
    outcomes: SearchResults,
    /// Keyed by normalized remote path.
    watches: HashMap<String, WatchedDirectory>,
    peers: HashSet<String>,
    finalized: HashSet<String>,
    tally: OrganizeTally,
    expected: usize,
    persist_path: Option<PathBuf>,
}

impl Reconciler {
    /// Create a reconciler watching the active alternative of every album.
    ///
    /// Albums without a candidate are counted as skipped right away.
    pub fn new(
        service: Arc<dyn TransferService>,
        organizer: Organizer,
        outcomes: SearchResults,
        settings: ReconcileSettings,
    ) -> Self {
        let mut reconciler = Self {
            service,
            clock: Arc::new(TokioClock),
            organizer,
            settings,
            outcomes: SearchResults::new(),
            watches: HashMap::new(),
            peers: HashSet::new(),
            finalized: HashSet::new(),
            tally: OrganizeTally::default(),
            expected: 0,
            persist_path: None,
        };

        for (label, outcome) in &outcomes {
            match outcome.as_ref().and_then(|o| o.active()) {
                Some(candidate) => reconciler.watch(label, candidate),
                None => reconciler.finalize(label, false),
            }
        }
        reconciler.outcomes = outcomes;
        reconciler
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Rewrite the outcome file at `path` every time an album moves to its
    /// next alternative.
    pub fn with_persist_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.persist_path = Some(path.into());
        self
    }

    /// Stop watching an album whose download was never queued.
    pub fn abandon(&mut self, album_label: &str) {
        let before = self.watches.len();
        self.watches.retain(|_, w| w.album_label != album_label);
        if self.watches.len() < before {
            self.expected -= before - self.watches.len();
            self.finalize(album_label, false);
        }
    }

    pub fn watches(&self) -> impl Iterator<Item = &WatchedDirectory> {
        self.watches.values()
    }

    pub fn peers(&self) -> &HashSet<String> {
        &self.peers
    }

    pub fn outcomes(&self) -> &SearchResults {
        &self.outcomes
    }

    pub fn tally(&self) -> OrganizeTally {
        self.tally
    }

    /// Number of directories awaited so far, retries included.
    pub fn expected(&self) -> usize {
        self.expected
    }

    pub fn is_finalized(&self, album_label: &str) -> bool {
        self.finalized.contains(album_label)
    }

    pub fn is_done(&self) -> bool {
        self.watches.is_empty()
    }

    fn watch(&mut self, album_label: &str, candidate: &Candidate) {
        if candidate.directory.is_empty() {
            warn!("No directory in result for: {}", album_label);
            self.finalize(album_label, false);
            return;
        }

        let key = normalize_remote_path(&candidate.directory);
        let watch = WatchedDirectory {
            album_label: album_label.to_string(),
            raw_path: candidate.directory.clone(),
            username: candidate.username.clone(),
        };
        if let Some(previous) = self.watches.insert(key, watch) {
            warn!(
                "{} and {} share a remote directory, only {} is watched",
                previous.album_label, album_label, album_label
            );
            self.finalize(&previous.album_label, false);
        } else {
            self.expected += 1;
        }
        self.peers.insert(candidate.username.clone());
    }

    fn finalize(&mut self, album_label: &str, organized: bool) {
        if self.finalized.insert(album_label.to_string()) {
            self.tally.record(organized);
        }
    }

    fn persist(&self) {
        let Some(path) = &self.persist_path else {
            return;
        };
        if let Err(e) = save_results(path, &self.outcomes) {
            warn!("Failed to save progress: {:#}", e);
        }
    }

    /// Poll the transfer service once and act on every directory that
    /// reached a terminal state.
    pub async fn poll_once(&mut self) {
        let transfers = match self.service.list_downloads().await {
            Ok(transfers) => transfers,
            Err(e) => {
                warn!("Failed to list downloads: {}", e);
                return;
            }
        };

        let mut resolved = Vec::new();
        for user in transfers.iter().filter(|u| self.peers.contains(&u.username)) {
            for directory in &user.directories {
                let key = normalize_remote_path(&directory.directory);
                let Some(watch) = self.watches.get(&key) else {
                    continue;
                };
                if watch.username != user.username {
                    continue;
                }
                let verdict = classify(&directory.files);
                if verdict.is_terminal() {
                    resolved.push((key, verdict));
                }
            }
        }

        for (key, verdict) in resolved {
            let Some(watch) = self.watches.remove(&key) else {
                continue;
            };
            if verdict == DirectoryVerdict::Succeeded {
                let organized = self.organizer.organize(&watch.album_label, &watch.raw_path);
                self.finalize(&watch.album_label, organized);
            } else {
                self.retry(watch).await;
            }
        }
    }

    /// Enqueue the next alternative of a failed album, or give up on it.
    async fn retry(&mut self, failed: WatchedDirectory) {
        let label = failed.album_label;
        warn!("Download failed: {} (from {})", label, failed.username);

        loop {
            let next = self
                .outcomes
                .get_mut(&label)
                .and_then(|outcome| outcome.as_mut())
                .and_then(|outcome| outcome.advance())
                .cloned();
            let Some(next) = next else {
                warn!("No alternatives left for: {}", label);
                self.finalize(&label, false);
                return;
            };
            self.persist();
            if next.directory.is_empty() {
                warn!("No directory in alternative from {} for: {}", next.username, label);
                continue;
            }

            match self.service.enqueue(&next.username, &next.files).await {
                Ok(()) => {
                    info!(
                        "Retrying {} with {} ({} files)",
                        label,
                        next.username,
                        next.files.len()
                    );
                    self.watch(&label, &next);
                    return;
                }
                Err(e) => warn!("{}", e),
            }
        }
    }

    /// Poll until every watch is resolved, the deadline passes, or
    /// `shutdown` is cancelled. Unresolved albums are counted as skipped.
    pub async fn run(mut self, shutdown: CancellationToken) -> OrganizeTally {
        // A timeout too large to represent never expires
        let deadline = self.clock.now().checked_add(self.settings.timeout);
        info!(
            "Waiting for {} downloads from {} peers",
            self.watches.len(),
            self.peers.len()
        );

        loop {
            self.poll_once().await;
            if self.watches.is_empty() {
                info!("All downloads resolved");
                break;
            }
            debug!("{} downloads pending", self.watches.len());

            if deadline.is_some_and(|deadline| self.clock.now() >= deadline) {
                warn!(
                    "Timed out with {} downloads unresolved",
                    self.watches.len()
                );
                break;
            }

            tokio::select! {
                _ = self.clock.sleep(self.settings.poll_interval) => {}
                _ = shutdown.cancelled() => {
                    info!("Reconciliation cancelled");
                    break;
                }
            }
        }

        let unresolved: Vec<String> = self
            .watches
            .drain()
            .map(|(_, watch)| watch.album_label)
            .collect();
        for label in unresolved {
            self.finalize(&label, false);
        }
        self.tally
    }
}

/// Wait for the downloads of a result file and organize each completed album.
///
/// `abandoned` lists albums whose initial enqueue failed; they are never
/// watched. Progress is written back to `results_path`.
pub async fn wait_and_organize(
    service: Arc<dyn TransferService>,
    results_path: &Path,
    downloads_root: &Path,
    settings: ReconcileSettings,
    abandoned: &[String],
    shutdown: CancellationToken,
) -> Result<OrganizeTally> {
    let outcomes = load_results(results_path)?;
    let mut reconciler = Reconciler::new(
        service,
        Organizer::new(downloads_root),
        outcomes,
        settings,
    )
    .with_persist_path(results_path);
    for label in abandoned {
        reconciler.abandon(label);
    }

    Ok(reconciler.run(shutdown).await)
}
