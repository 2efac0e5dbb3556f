//! Filtering and ranking of Soulseek search responses.
//!
//! Raw peer responses are reduced to [`Candidate`]s holding only the files in
//! an accepted format, then ordered best-first.

use std::cmp::Reverse;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::album::Album;
use crate::config::{normalize_format, SearchSettings};
use crate::transfer::{normalize_remote_path, RemoteFile, SearchResponse};

/// Formats accepted regardless of their reported bitrate.
pub const LOSSLESS_FORMATS: &[&str] = &["flac", "wav", "alac", "ape", "wv"];

/// Title words too common to tell albums apart.
const STOP_WORDS: &[&str] = &[
    "a", "an", "the", "of", "in", "on", "at", "to", "and", "or", "for", "by", "is", "it", "no",
];

/// One peer's offer for an album.
///
/// Only `username`, `directory`, `files`, `format` and `bitrate` are
/// persisted; the ranking inputs are meaningful only while ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub username: String,
    /// Remote directory holding the files, with `/` separators.
    pub directory: String,
    pub files: Vec<RemoteFile>,
    /// Dominant extension among `files`.
    #[serde(default)]
    pub format: String,
    /// Average bitrate in kbps, 0 when no file reported one.
    #[serde(default)]
    pub bitrate: u32,
    #[serde(default, skip_serializing)]
    pub upload_speed: u64,
    #[serde(default, skip_serializing)]
    pub has_free_slot: bool,
    #[serde(default, skip_serializing)]
    pub queue_length: u32,
}

/// Extension of a file, from its `extension` field or else its filename.
fn file_ext(file: &RemoteFile) -> String {
    let ext = normalize_format(&file.extension);
    if !ext.is_empty() {
        return ext;
    }
    match file.filename.rsplit_once('.') {
        Some((_, suffix)) => normalize_format(suffix),
        None => String::new(),
    }
}

/// Most frequent extension; ties go to the one seen first.
fn dominant_format(files: &[RemoteFile]) -> String {
    let mut counts: Vec<(String, usize)> = Vec::new();
    for ext in files.iter().map(file_ext).filter(|e| !e.is_empty()) {
        match counts.iter_mut().find(|(seen, _)| *seen == ext) {
            Some((_, count)) => *count += 1,
            None => counts.push((ext, 1)),
        }
    }

    let mut best: Option<&(String, usize)> = None;
    for entry in &counts {
        if best.map_or(true, |b| entry.1 > b.1) {
            best = Some(entry);
        }
    }
    best.map(|(ext, _)| ext.clone()).unwrap_or_default()
}

/// Mean bitrate over the files that report one.
fn average_bitrate(files: &[RemoteFile]) -> u32 {
    let rates: Vec<u64> = files
        .iter()
        .filter_map(|f| f.bit_rate)
        .filter(|&rate| rate > 0)
        .map(u64::from)
        .collect();
    if rates.is_empty() {
        return 0;
    }
    (rates.iter().sum::<u64>() / rates.len() as u64) as u32
}

/// Parent directory of a remote filename, `/`-separated.
fn parent_directory(filename: &str) -> String {
    let normalized = normalize_remote_path(filename);
    match normalized.rsplit_once('/') {
        Some((parent, _)) if !parent.is_empty() => parent.to_string(),
        Some(_) => "/".to_string(),
        None => ".".to_string(),
    }
}

/// Check that every significant title word appears in the directory path.
fn matches_album(directory: &str, album: &Album) -> bool {
    let path_lower = directory.to_lowercase();
    let title_lower = album.title.to_lowercase();
    title_lower
        .split_whitespace()
        .filter(|w| w.chars().count() > 2 && !STOP_WORDS.contains(w))
        .all(|w| path_lower.contains(w))
}

/// Filter raw search responses into acceptable candidates.
///
/// A response is kept when it has at least `min_files` files in a preferred
/// format, is lossless or meets `min_bitrate`, and (when `album` is given)
/// its directory mentions every significant word of the album title.
pub fn filter(
    responses: &[SearchResponse],
    settings: &SearchSettings,
    album: Option<&Album>,
) -> Vec<Candidate> {
    let mut candidates = Vec::new();

    for resp in responses {
        let files: Vec<RemoteFile> = resp
            .files
            .iter()
            .filter(|f| settings.preferred_formats.contains(&file_ext(f)))
            .cloned()
            .collect();

        if files.len() < settings.min_files {
            debug!(
                "Rejected {}: {}/{} files match formats {:?} (need {})",
                resp.username,
                files.len(),
                resp.files.len(),
                settings.preferred_formats,
                settings.min_files
            );
            continue;
        }

        let format = dominant_format(&files);
        let bitrate = average_bitrate(&files);

        if !LOSSLESS_FORMATS.contains(&format.as_str()) && bitrate < settings.min_bitrate {
            debug!(
                "Rejected {}: {} {}kbps < min {}kbps",
                resp.username, format, bitrate, settings.min_bitrate
            );
            continue;
        }

        // min_files may be 0, in which case there is nothing to download
        let Some(first) = files.first() else {
            debug!("Rejected {}: no files in preferred formats", resp.username);
            continue;
        };
        let directory = parent_directory(&first.filename);

        if let Some(album) = album {
            if !matches_album(&directory, album) {
                debug!(
                    "Rejected {}: directory {:?} does not match album {:?}",
                    resp.username, directory, album.title
                );
                continue;
            }
        }

        candidates.push(Candidate {
            username: resp.username.clone(),
            directory,
            files,
            format,
            bitrate,
            upload_speed: resp.upload_speed,
            has_free_slot: resp.has_free_upload_slot,
            queue_length: resp.queue_length,
        });
    }

    candidates
}

/// Order candidates best-first.
///
/// Keys, most significant first: position of the format in the preference
/// list, free upload slot, higher bitrate, faster upload, shorter queue.
/// The sort is stable.
pub fn rank(mut candidates: Vec<Candidate>, settings: &SearchSettings) -> Vec<Candidate> {
    let unknown_format = settings.preferred_formats.len();
    candidates.sort_by_key(|c| {
        (
            settings
                .preferred_formats
                .iter()
                .position(|f| *f == c.format)
                .unwrap_or(unknown_format),
            if c.has_free_slot { 0 } else { 1 },
            Reverse(c.bitrate),
            Reverse(c.upload_speed),
            c.queue_length,
        )
    });
    candidates
}
