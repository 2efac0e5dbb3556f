//! Post-download organization into `Artist/Title (Year)` directories.
//!
//! slskd writes every download into a folder named after the last component
//! of the remote directory. The organizer moves that folder under the
//! album's artist, renamed to the canonical title.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::album::{Album, AlbumParseError};
use crate::outcome::SearchResults;
use crate::transfer::normalize_remote_path;

/// Errors that can occur while organizing one album.
#[derive(Debug, Error)]
pub enum OrganizeError {
    #[error("Source not found: {0:?}")]
    SourceMissing(PathBuf),

    #[error("Cannot parse album: {0}")]
    InvalidLabel(#[from] AlbumParseError),

    #[error("Target already exists: {0:?}")]
    TargetExists(PathBuf),

    #[error("Failed to move {from:?} -> {to:?}: {source}")]
    Io {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// What a successful organize call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Organized {
    Moved,
    /// The album was already in its canonical place; nothing was touched.
    AlreadyInPlace,
}

/// Counters over a set of albums.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OrganizeTally {
    pub moved: usize,
    pub skipped: usize,
}

impl OrganizeTally {
    pub fn record(&mut self, organized: bool) {
        if organized {
            self.moved += 1;
        } else {
            self.skipped += 1;
        }
    }
}

/// Canonical directory for an album: `root/Artist/Title (Year)`.
pub fn album_target_dir(album: &Album, root: &Path) -> PathBuf {
    let folder = if album.year.is_empty() {
        album.title.clone()
    } else {
        format!("{} ({})", album.title, album.year)
    };
    root.join(&album.artist).join(folder)
}

/// Folder name slskd uses for a remote directory: its last component.
///
/// `@@fknkb\Library\Artist\Album (2023)` becomes `Album (2023)`.
pub fn source_dir_name(remote_dir: &str) -> String {
    let normalized = normalize_remote_path(remote_dir);
    normalized
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .to_string()
}

/// Moves completed downloads below a downloads root.
#[derive(Debug, Clone)]
pub struct Organizer {
    root: PathBuf,
}

impl Organizer {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Move one downloaded album into place.
    ///
    /// Never overwrites or merges into an existing target. Calling it again
    /// after a successful move is a no-op that still succeeds.
    pub fn try_organize(
        &self,
        album_label: &str,
        remote_dir: &str,
    ) -> Result<Organized, OrganizeError> {
        let source = self.root.join(source_dir_name(remote_dir));
        let album = Album::from_label(album_label)?;
        let target = album_target_dir(&album, &self.root);

        if !source.exists() {
            if target.is_dir() {
                return Ok(Organized::AlreadyInPlace);
            }
            return Err(OrganizeError::SourceMissing(source));
        }

        if source == target {
            return Ok(Organized::AlreadyInPlace);
        }

        if target.exists() {
            return Err(OrganizeError::TargetExists(target));
        }

        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent).map_err(|e| OrganizeError::Io {
                from: source.clone(),
                to: target.clone(),
                source: e,
            })?;
        }
        std::fs::rename(&source, &target).map_err(|e| OrganizeError::Io {
            from: source.clone(),
            to: target.clone(),
            source: e,
        })?;

        Ok(Organized::Moved)
    }

    /// Organize one album, logging the result.
    ///
    /// Returns true if the album is now in its canonical place.
    pub fn organize(&self, album_label: &str, remote_dir: &str) -> bool {
        match self.try_organize(album_label, remote_dir) {
            Ok(Organized::Moved) => {
                info!(
                    "Moved: {} -> {}",
                    source_dir_name(remote_dir),
                    album_label
                );
                true
            }
            Ok(Organized::AlreadyInPlace) => {
                debug!("Already organized: {}", album_label);
                true
            }
            Err(e) => {
                warn!("Not organized {}: {}", album_label, e);
                false
            }
        }
    }

    /// Organize every album of a result set.
    ///
    /// Albums with no candidate, or whose candidate has no directory, are
    /// counted as skipped.
    pub fn organize_all(&self, results: &SearchResults) -> OrganizeTally {
        let mut tally = OrganizeTally::default();

        for (label, outcome) in results {
            let Some(candidate) = outcome.as_ref().and_then(|o| o.active()) else {
                tally.skipped += 1;
                continue;
            };
            if candidate.directory.is_empty() {
                warn!("No directory in result for: {}", label);
                tally.skipped += 1;
                continue;
            }
            tally.record(self.organize(label, &candidate.directory));
        }

        tally
    }
}
