//! Persisted search outcomes.
//!
//! The result file maps each album label to `null` (nothing found) or to the
//! candidates chosen for it. Two shapes exist on disk: the current one with an
//! ordered list of alternatives and the index of the one in use, and a legacy
//! flat shape holding a single candidate. Both are normalized into
//! [`SearchOutcome`] when loaded. Albums keep the order of the album list.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::warn;

use crate::search::Candidate;

/// Search results keyed by album label. `None` means no usable candidate.
pub type SearchResults = IndexMap<String, Option<SearchOutcome>>;

/// The candidates selected for one album.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SearchOutcome {
    WithAlternatives {
        /// Index of the alternative currently enqueued. Only ever advances.
        #[serde(rename = "selected", default)]
        active_index: usize,
        alternatives: Vec<Candidate>,
    },
    /// Legacy shape: a single candidate, implicitly selected.
    Flat(Candidate),
}

impl SearchOutcome {
    /// Build an outcome from ranked candidates, starting at the best one.
    ///
    /// Returns `None` when there is nothing to choose from.
    pub fn from_ranked(ranked: Vec<Candidate>, max_alternatives: usize) -> Option<Self> {
        if ranked.is_empty() {
            return None;
        }
        let alternatives = ranked.into_iter().take(max_alternatives.max(1)).collect();
        Some(SearchOutcome::WithAlternatives {
            active_index: 0,
            alternatives,
        })
    }

    pub fn active_index(&self) -> usize {
        match self {
            SearchOutcome::WithAlternatives { active_index, .. } => *active_index,
            SearchOutcome::Flat(_) => 0,
        }
    }

    pub fn alternatives(&self) -> &[Candidate] {
        match self {
            SearchOutcome::WithAlternatives { alternatives, .. } => alternatives,
            SearchOutcome::Flat(candidate) => std::slice::from_ref(candidate),
        }
    }

    /// The alternative currently in use.
    pub fn active(&self) -> Option<&Candidate> {
        self.alternatives().get(self.active_index())
    }

    /// Returns true if another alternative remains after the active one.
    pub fn has_next(&self) -> bool {
        self.active_index() + 1 < self.alternatives().len()
    }

    /// Move to the next alternative and return it.
    ///
    /// Returns `None`, leaving the outcome untouched, when alternatives are
    /// exhausted.
    pub fn advance(&mut self) -> Option<&Candidate> {
        if !self.has_next() {
            return None;
        }
        match self {
            SearchOutcome::WithAlternatives {
                active_index,
                alternatives,
            } => {
                *active_index += 1;
                alternatives.get(*active_index)
            }
            SearchOutcome::Flat(_) => None,
        }
    }

    /// Check that the active index points into a non-empty alternative list.
    fn is_valid(&self) -> bool {
        self.active().is_some()
    }
}

/// Load a result file.
///
/// Outcomes whose `selected` index does not point to an alternative are
/// logged and treated as "nothing found".
pub fn load_results(path: &Path) -> Result<SearchResults> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read results file: {:?}", path))?;
    let mut results: SearchResults = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse results file: {:?}", path))?;

    for (label, outcome) in results.iter_mut() {
        if outcome.as_ref().is_some_and(|o| !o.is_valid()) {
            warn!("Ignoring invalid selection for: {}", label);
            *outcome = None;
        }
    }
    Ok(results)
}

/// Write a result file, pretty-printed.
///
/// The content goes to a temporary file next to `path` which then replaces
/// it, so an interrupted write leaves the previous file intact.
pub fn save_results(path: &Path, results: &SearchResults) -> Result<()> {
    let mut json = serde_json::to_string_pretty(results)?;
    json.push('\n');

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut file = NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temporary file in {:?}", dir))?;
    file.write_all(json.as_bytes())
        .and_then(|()| file.as_file().sync_all())
        .with_context(|| format!("Failed to write results file: {:?}", path))?;
    file.persist(path)
        .with_context(|| format!("Failed to replace results file: {:?}", path))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn candidate(username: &str, directory: &str) -> Candidate {
        Candidate {
            username: username.to_string(),
            directory: directory.to_string(),
            files: vec![],
            format: "flac".to_string(),
            bitrate: 0,
            upload_speed: 0,
            has_free_slot: true,
            queue_length: 0,
        }
    }

    #[test]
    fn test_parse_new_shape() {
        let json = r#"{
            "selected": 1,
            "alternatives": [
                {"username": "u1", "directory": "A/B", "files": [], "format": "flac", "bitrate": 0},
                {"username": "u2", "directory": "C/D", "files": [], "format": "mp3", "bitrate": 320}
            ]
        }"#;
        let outcome: SearchOutcome = serde_json::from_str(json).unwrap();
        assert_eq!(outcome.active_index(), 1);
        assert_eq!(outcome.alternatives().len(), 2);
        assert_eq!(outcome.active().unwrap().username, "u2");
        assert!(!outcome.has_next());
    }

    #[test]
    fn test_parse_legacy_shape() {
        let json = r#"{
            "username": "u1", "directory": "Music\\Album", "files": [], "format": "flac", "bitrate": 0
        }"#;
        let outcome: SearchOutcome = serde_json::from_str(json).unwrap();
        assert!(matches!(outcome, SearchOutcome::Flat(_)));
        assert_eq!(outcome.active_index(), 0);
        assert_eq!(outcome.alternatives().len(), 1);
        assert_eq!(outcome.active().unwrap().directory, "Music\\Album");
    }

    #[test]
    fn test_advance_moves_forward_until_exhausted() {
        let mut outcome = SearchOutcome::from_ranked(
            vec![candidate("u1", "a"), candidate("u2", "b"), candidate("u3", "c")],
            3,
        )
        .unwrap();

        assert_eq!(outcome.advance().unwrap().username, "u2");
        assert_eq!(outcome.advance().unwrap().username, "u3");
        assert!(outcome.advance().is_none());
        assert_eq!(outcome.active_index(), 2);
    }

    #[test]
    fn test_flat_never_advances() {
        let mut outcome = SearchOutcome::Flat(candidate("u1", "a"));
        assert!(!outcome.has_next());
        assert!(outcome.advance().is_none());
        assert_eq!(outcome.active().unwrap().username, "u1");
    }

    #[test]
    fn test_from_ranked_keeps_top_n() {
        let ranked = (0..5).map(|i| candidate(&format!("u{}", i), "d")).collect();
        let outcome = SearchOutcome::from_ranked(ranked, 3).unwrap();
        assert_eq!(outcome.alternatives().len(), 3);
        assert_eq!(outcome.active_index(), 0);
        assert_eq!(outcome.active().unwrap().username, "u0");

        assert!(SearchOutcome::from_ranked(vec![], 3).is_none());
    }

    #[test]
    fn test_load_results_mixed_shapes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("results.json");
        std::fs::write(
            &path,
            r#"{
                "A - Missing (2000)": null,
                "B - Legacy": {
                    "username": "u1", "directory": "x", "files": [], "format": "flac", "bitrate": 0
                },
                "C - New (2020)": {"selected": 0, "alternatives": [
                    {"username": "u2", "directory": "y", "files": [], "format": "flac"}
                ]},
                "D - Broken": {"selected": 4, "alternatives": [
                    {"username": "u3", "directory": "z", "files": [], "format": "flac"}
                ]}
            }"#,
        )
        .unwrap();

        let results = load_results(&path).unwrap();
        assert_eq!(results.len(), 4);
        assert!(results["A - Missing (2000)"].is_none());
        assert!(matches!(results["B - Legacy"], Some(SearchOutcome::Flat(_))));
        assert_eq!(
            results["C - New (2020)"].as_ref().unwrap().active().unwrap().username,
            "u2"
        );
        assert!(results["D - Broken"].is_none());
    }

    #[test]
    fn test_save_then_load_keeps_selection() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("results.json");

        let mut outcome =
            SearchOutcome::from_ranked(vec![candidate("u1", "a"), candidate("u2", "b")], 3)
                .unwrap();
        outcome.advance();
        let mut results = SearchResults::new();
        results.insert("A - B".to_string(), Some(outcome));
        results.insert("C - D".to_string(), None);

        save_results(&path, &results).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("\"selected\": 1"));

        let loaded = load_results(&path).unwrap();
        assert_eq!(loaded["A - B"].as_ref().unwrap().active_index(), 1);
        assert!(loaded["C - D"].is_none());
    }

    #[test]
    fn test_save_keeps_album_order() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("results.json");

        let mut results = SearchResults::new();
        results.insert("Zyklon - Last".to_string(), None);
        results.insert("Agoraphobic Nosebleed - First".to_string(), None);
        save_results(&path, &results).unwrap();

        let loaded = load_results(&path).unwrap();
        let labels: Vec<&str> = loaded.keys().map(String::as_str).collect();
        assert_eq!(labels, vec!["Zyklon - Last", "Agoraphobic Nosebleed - First"]);
    }

    #[test]
    fn test_failed_save_leaves_no_partial_file() {
        let dir = TempDir::new().unwrap();
        // A directory in place of the file makes the final rename fail
        let path = dir.path().join("results.json");
        std::fs::create_dir(&path).unwrap();

        let mut results = SearchResults::new();
        results.insert("A - B".to_string(), None);
        assert!(save_results(&path, &results).is_err());

        let entries: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("results.json")]);
        assert!(path.is_dir());
    }

    #[cfg(unix)]
    #[test]
    fn test_failed_save_keeps_previous_file() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("results.json");
        let mut results = SearchResults::new();
        results.insert(
            "A - B".to_string(),
            SearchOutcome::from_ranked(vec![candidate("u1", "a"), candidate("u2", "b")], 3),
        );
        save_results(&path, &results).unwrap();
        let before = std::fs::read_to_string(&path).unwrap();

        std::fs::set_permissions(dir.path(), std::fs::Permissions::from_mode(0o555)).unwrap();
        // Privileged users write through read-only directories
        let writable = NamedTempFile::new_in(dir.path()).is_ok();
        if !writable {
            results.insert("C - D".to_string(), None);
            assert!(save_results(&path, &results).is_err());
        }
        std::fs::set_permissions(dir.path(), std::fs::Permissions::from_mode(0o755)).unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
        let loaded = load_results(&path).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded["A - B"].as_ref().unwrap().alternatives().len(), 2);
    }
}
