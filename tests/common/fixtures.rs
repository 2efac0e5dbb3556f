//! Test fixtures: a temporary downloads root, result files and transfer
//! reports.

use async_trait::async_trait;
use rymfetch::outcome::{save_results, SearchOutcome, SearchResults};
use rymfetch::reconciler::Clock;
use rymfetch::search::Candidate;
use rymfetch::transfer::{RemoteFile, TransferDirectory, TransferFile, UserTransfers};
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;
use tempfile::TempDir;
use tokio::time::Instant;

/// A downloads root and a results file inside a temporary directory.
pub struct TestLibrary {
    _dir: TempDir,
    pub root: PathBuf,
    pub results_path: PathBuf,
}

impl TestLibrary {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let root = dir.path().join("downloads");
        fs::create_dir_all(&root).expect("Failed to create downloads root");
        let results_path = dir.path().join("results.json");
        Self {
            _dir: dir,
            root,
            results_path,
        }
    }

    /// Simulate slskd writing a finished download into `root/<folder>`.
    pub fn add_download(&self, folder: &str, tracks: &[&str]) -> PathBuf {
        let path = self.root.join(folder);
        fs::create_dir_all(&path).expect("Failed to create download folder");
        for track in tracks {
            fs::write(path.join(track), format!("audio of {}", track))
                .expect("Failed to write track");
        }
        path
    }

    pub fn write_results(&self, results: &SearchResults) {
        save_results(&self.results_path, results).expect("Failed to write results");
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }

    pub fn exists(&self, relative: &str) -> bool {
        self.path(relative).exists()
    }

    pub fn read(&self, relative: &str) -> String {
        fs::read_to_string(self.path(relative)).expect("Failed to read file")
    }
}

/// A FLAC candidate with two tracks below `remote_dir`.
pub fn candidate(username: &str, remote_dir: &str) -> Candidate {
    let files = ["01 - Intro.flac", "02 - Outro.flac"]
        .iter()
        .map(|name| {
            RemoteFile::new(format!("{}\\{}", remote_dir, name), 20_000_000).with_extension("flac")
        })
        .collect();
    Candidate {
        username: username.to_string(),
        directory: remote_dir.to_string(),
        files,
        format: "flac".to_string(),
        bitrate: 0,
        upload_speed: 0,
        has_free_slot: true,
        queue_length: 0,
    }
}

/// Results with the given alternatives per album, first alternative active.
pub fn results(entries: Vec<(&str, Vec<Candidate>)>) -> SearchResults {
    entries
        .into_iter()
        .map(|(label, ranked)| (label.to_string(), SearchOutcome::from_ranked(ranked, 3)))
        .collect()
}

/// A `GET /transfers/downloads` entry for one directory of one peer.
pub fn directory_report(username: &str, directory: &str, states: &[&str]) -> UserTransfers {
    UserTransfers {
        username: username.to_string(),
        directories: vec![TransferDirectory {
            directory: directory.to_string(),
            files: states
                .iter()
                .enumerate()
                .map(|(i, state)| TransferFile {
                    filename: format!("{}\\{:02}.flac", directory, i + 1),
                    state: (*state).into(),
                })
                .collect(),
        }],
    }
}

/// Clock whose sleep advances time instantly.
pub struct ManualClock {
    now: Mutex<Instant>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Mutex::new(Instant::now()),
        }
    }

    pub fn elapsed_since(&self, start: Instant) -> Duration {
        self.now() - start
    }
}

#[async_trait]
impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock().unwrap()
    }

    async fn sleep(&self, duration: Duration) {
        *self.now.lock().unwrap() += duration;
    }
}
