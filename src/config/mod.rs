mod file_config;

pub use file_config::{DownloadConfig, FileConfig, SearchConfig, SlskdConfig};

use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_SLSKD_HOST: &str = "http://localhost:5030";

/// CLI flags that override any other configuration source.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    /// Single accepted format, replacing the configured preference list.
    pub format: Option<String>,
    pub min_bitrate: Option<u32>,
    pub min_files: Option<usize>,
    pub downloads_dir: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct AppSettings {
    pub slskd: SlskdSettings,
    pub search: SearchSettings,
    pub download: DownloadSettings,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlskdSettings {
    pub host: String,
    pub api_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchSettings {
    /// Accepted extensions, lower-case without dot, most preferred first.
    pub preferred_formats: Vec<String>,
    /// Minimum average bitrate (kbps) for lossy results.
    pub min_bitrate: u32,
    /// Minimum number of files in an accepted format per result.
    pub min_files: usize,
    pub search_timeout: Duration,
    /// How many ranked candidates are kept as fallbacks per album.
    pub max_alternatives: usize,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            preferred_formats: vec!["flac".to_string(), "mp3".to_string()],
            min_bitrate: 320,
            min_files: 1,
            search_timeout: Duration::from_secs(30),
            max_alternatives: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadSettings {
    /// Directory slskd writes completed downloads to.
    pub output_dir: PathBuf,
    /// How long to wait for all transfers before giving up.
    pub timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for DownloadSettings {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("downloads"),
            timeout: Duration::from_secs(86400), // 24 hours
            poll_interval: Duration::from_secs(10),
        }
    }
}

impl AppSettings {
    /// Resolve settings from CLI flags, the TOML file and the process
    /// environment.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Self {
        Self::resolve_with_env(cli, file_config, |key| std::env::var(key).ok())
    }

    /// Resolve settings with an explicit environment lookup.
    ///
    /// Priority: CLI flags > env vars > TOML file > defaults.
    pub fn resolve_with_env<F>(cli: &CliConfig, file_config: Option<FileConfig>, env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let file = file_config.unwrap_or_default();

        let slskd_file = file.slskd.unwrap_or_default();
        let host = env("SLSKD_HOST")
            .or(slskd_file.host)
            .unwrap_or_else(|| DEFAULT_SLSKD_HOST.to_string());
        let api_key = env("SLSKD_API_KEY")
            .or(slskd_file.api_key)
            .unwrap_or_default();

        let search_file = file.search.unwrap_or_default();
        let defaults = SearchSettings::default();
        let preferred_formats = match &cli.format {
            Some(format) => vec![normalize_format(format)],
            None => search_file
                .preferred_formats
                .map(|formats| formats.iter().map(|f| normalize_format(f)).collect())
                .unwrap_or(defaults.preferred_formats),
        };
        let search = SearchSettings {
            preferred_formats,
            min_bitrate: cli
                .min_bitrate
                .or(search_file.min_bitrate)
                .unwrap_or(defaults.min_bitrate),
            min_files: cli
                .min_files
                .or(search_file.min_files)
                .unwrap_or(defaults.min_files),
            search_timeout: search_file
                .search_timeout
                .map(Duration::from_secs)
                .unwrap_or(defaults.search_timeout),
            max_alternatives: search_file
                .max_alternatives
                .unwrap_or(defaults.max_alternatives)
                .max(1),
        };

        let download_file = file.download.unwrap_or_default();
        let defaults = DownloadSettings::default();
        let download = DownloadSettings {
            output_dir: cli
                .downloads_dir
                .clone()
                .or_else(|| download_file.output_dir.map(|dir| expand_tilde(&dir)))
                .unwrap_or(defaults.output_dir),
            timeout: download_file
                .timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
            poll_interval: download_file
                .poll_interval_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.poll_interval),
        };

        Self {
            slskd: SlskdSettings { host, api_key },
            search,
            download,
        }
    }
}

/// Default config file location: `~/.config/rymfetch/config.toml`.
pub fn default_config_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("rymfetch")
        .join("config.toml")
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &str) -> PathBuf {
    match (path.strip_prefix('~'), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest.trim_start_matches(['/', '\\'])),
        _ => Path::new(path).to_path_buf(),
    }
}

/// Lower-case a format name and strip a leading dot.
pub fn normalize_format(raw: &str) -> String {
    raw.trim().trim_start_matches('.').to_lowercase()
}
