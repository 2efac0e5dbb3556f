//! Album identity and its canonical label.
//!
//! The label (`"Artist - Title (Year)"`) is the key used for albums in every
//! persisted result file, so parsing and formatting must round-trip.

use anyhow::Context;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;
use tracing::warn;

lazy_static! {
    static ref YEAR_SUFFIX: Regex = Regex::new(r"^(?P<title>.+?) \((?P<year>\d{4})\)$").unwrap();
}

/// Errors produced when an album label cannot be turned back into an [`Album`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AlbumParseError {
    #[error("Missing \" - \" separator in album label: {0:?}")]
    MissingSeparator(String),
}

/// An album requested for download.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Album {
    pub artist: String,
    pub title: String,
    /// Release year, empty when unknown.
    pub year: String,
}

impl Album {
    pub fn new(
        artist: impl Into<String>,
        title: impl Into<String>,
        year: impl Into<String>,
    ) -> Self {
        Self {
            artist: artist.into(),
            title: title.into(),
            year: year.into(),
        }
    }

    /// Parse a label of the form `Artist - Title (Year)`.
    ///
    /// The artist ends at the first `" - "`. A trailing four digit year in
    /// parentheses is split off the title; anything else stays in the title.
    pub fn from_label(label: &str) -> Result<Self, AlbumParseError> {
        let trimmed = label.trim();
        let (artist, rest) = trimmed
            .split_once(" - ")
            .ok_or_else(|| AlbumParseError::MissingSeparator(label.to_string()))?;

        let (title, year) = match YEAR_SUFFIX.captures(rest) {
            Some(caps) => (caps["title"].to_string(), caps["year"].to_string()),
            None => (rest.to_string(), String::new()),
        };

        Ok(Self::new(artist.trim(), title.trim(), year))
    }

    /// The canonical label used as lookup key in persisted state.
    pub fn label(&self) -> String {
        self.to_string()
    }

    /// Soulseek query for this album: artist and title, no year.
    pub fn search_query(&self) -> String {
        format!("{} {}", self.artist, self.title)
    }
}

impl fmt::Display for Album {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.year.is_empty() {
            write!(f, "{} - {}", self.artist, self.title)
        } else {
            write!(f, "{} - {} ({})", self.artist, self.title, self.year)
        }
    }
}

impl FromStr for Album {
    type Err = AlbumParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Album::from_label(s)
    }
}

/// Read an album list file, one label per line.
///
/// Blank lines are ignored; lines that do not parse are logged and skipped.
pub fn load_album_list(path: &Path) -> anyhow::Result<Vec<Album>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read album list: {:?}", path))?;

    let mut albums = Vec::new();
    for line in content.lines().map(str::trim).filter(|l| !l.is_empty()) {
        match Album::from_label(line) {
            Ok(album) => albums.push(album),
            Err(e) => warn!("Skipping album line: {}", e),
        }
    }
    Ok(albums)
}
