use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod cli_style;

use rymfetch::album::load_album_list;
use rymfetch::config::{default_config_path, AppSettings, CliConfig, FileConfig};
use rymfetch::dispatcher::Dispatcher;
use rymfetch::organizer::Organizer;
use rymfetch::outcome::{load_results, save_results};
use rymfetch::reconciler::{wait_and_organize, ReconcileSettings};
use rymfetch::transfer::{SlskdClient, TransferService};

fn parse_path(s: &str) -> Result<PathBuf> {
    let path = PathBuf::from(s);
    if path.is_absolute() {
        return Ok(path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(path))
}

#[derive(Parser, Debug)]
#[command(name = "rymfetch", version, styles = cli_style::get_styles())]
struct CliArgs {
    /// Enable debug logging.
    #[clap(short, long, global = true)]
    pub verbose: bool,

    /// Path to the TOML config file. Defaults to ~/.config/rymfetch/config.toml.
    #[clap(long, global = true, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Search Soulseek for every album of a list and save the best matches.
    Search {
        /// Album list, one "Artist - Title (Year)" per line.
        #[clap(value_parser = parse_path)]
        file: PathBuf,

        /// Output JSON path. Defaults to the input with a .json extension.
        #[clap(short, long, value_parser = parse_path)]
        output: Option<PathBuf>,

        /// Accept only this format (e.g. flac).
        #[clap(long)]
        format: Option<String>,

        /// Minimum bitrate in kbps for lossy formats.
        #[clap(long)]
        min_bitrate: Option<u32>,

        /// Minimum number of matching files per result.
        #[clap(long)]
        min_files: Option<usize>,
    },

    /// Queue the selected results, wait for them and organize the albums.
    Download {
        /// Search results JSON.
        #[clap(value_parser = parse_path)]
        file: PathBuf,

        /// Directory slskd downloads into.
        #[clap(long, value_parser = parse_path)]
        downloads_dir: Option<PathBuf>,
    },

    /// Move already downloaded albums into Artist/Title (Year).
    Organize {
        /// Search results JSON.
        #[clap(value_parser = parse_path)]
        file: PathBuf,

        /// Directory slskd downloads into.
        #[clap(long, value_parser = parse_path)]
        downloads_dir: Option<PathBuf>,
    },
}

impl Command {
    fn cli_config(&self) -> CliConfig {
        match self {
            Command::Search {
                format,
                min_bitrate,
                min_files,
                ..
            } => CliConfig {
                format: format.clone(),
                min_bitrate: *min_bitrate,
                min_files: *min_files,
                downloads_dir: None,
            },
            Command::Download { downloads_dir, .. } | Command::Organize { downloads_dir, .. } => {
                CliConfig {
                    downloads_dir: downloads_dir.clone(),
                    ..Default::default()
                }
            }
        }
    }
}

fn connect(settings: &AppSettings) -> Result<Arc<dyn TransferService>> {
    let client = SlskdClient::from_settings(&settings.slskd)?;
    info!("Using slskd at {}", client.base_url());
    Ok(Arc::new(client))
}

/// Cancel the returned token on Ctrl+C.
fn shutdown_on_ctrl_c() -> CancellationToken {
    let token = CancellationToken::new();
    let child = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received Ctrl+C, stopping");
            child.cancel();
        }
    });
    token
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    let default_level = if cli_args.verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(default_level.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .context("Failed to initialize logging")?;

    let config_path = cli_args.config.clone().unwrap_or_else(default_config_path);
    let file_config = FileConfig::load_if_exists(&config_path)?;
    let settings = AppSettings::resolve(&cli_args.command.cli_config(), Some(file_config));

    match cli_args.command {
        Command::Search { file, output, .. } => {
            let albums = load_album_list(&file)?;
            if albums.is_empty() {
                bail!("No albums in {:?}", file);
            }

            let dispatcher = Dispatcher::new(connect(&settings)?, settings.search.clone());
            let results = dispatcher.search_all(&albums).await;

            let output_path = output.unwrap_or_else(|| file.with_extension("json"));
            save_results(&output_path, &results)?;

            let found = results.values().filter(|o| o.is_some()).count();
            cli_style::print_search_summary(&results);
            info!(
                "Search done: {}/{} found. Results: {:?}",
                found,
                results.len(),
                output_path
            );
        }
        Command::Download { file, .. } => {
            let results = load_results(&file)?;
            let service = connect(&settings)?;

            let report = Dispatcher::new(service.clone(), settings.search.clone())
                .enqueue_all(&results)
                .await;
            if report.queued == 0 {
                cli_style::print_warning("Nothing was queued");
                return Ok(());
            }

            let tally = wait_and_organize(
                service,
                &file,
                &settings.download.output_dir,
                ReconcileSettings::from(&settings.download),
                &report.failed_labels,
                shutdown_on_ctrl_c(),
            )
            .await?;
            cli_style::print_tally(&tally);
        }
        Command::Organize { file, .. } => {
            let results = load_results(&file)?;
            let tally = Organizer::new(&settings.download.output_dir).organize_all(&results);
            cli_style::print_tally(&tally);
        }
    }

    Ok(())
}
