//! # Magazine Search CLI (`magsearch`)
//!
//! ## Usage
//!
//! ```bash
//! magsearch --config ./config/magsearch.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `magsearch serve` | Start the HTTP API |
//! | `magsearch search "<query>"` | Run one search and print the results |
//! | `magsearch sync` | Download issues missing from the local cache |
//!
//! Log verbosity follows `RUST_LOG` (default `info`).

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use magazine_search::search::SearchMode;
use magazine_search::{cache, config, search, server};

/// Keyword search over PDF magazine issues.
#[derive(Parser)]
#[command(name = "magsearch", version, about)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Credentials are read from the environment, not this file:
    /// `FIREBASE_AUTH_TOKEN`, `APPWRITE_API_KEY`.
    #[arg(long, global = true, default_value = "./config/magsearch.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API on `[server].bind`.
    Serve,

    /// Search the magazine corpus.
    ///
    /// `page` mode downloads every issue from storage and returns ranked
    /// matches; `line` mode scans the local cache (run `sync` first) and
    /// returns every matching line.
    Search {
        /// The search query (matched literally, case-insensitively).
        query: String,

        #[arg(long, value_enum, default_value_t = Mode::Page)]
        mode: Mode,

        /// Maximum number of results (page mode only).
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Download issues that are not yet in the local cache.
    Sync,
}

#[derive(Clone, Copy, ValueEnum)]
enum Mode {
    Page,
    Line,
}

impl From<Mode> for SearchMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Page => SearchMode::Page,
            Mode::Line => SearchMode::Line,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
        Commands::Search { query, mode, limit } => {
            search::run_search(&cfg, &query, mode.into(), limit).await?;
        }
        Commands::Sync => {
            cache::run_sync(&cfg).await?;
        }
    }

    Ok(())
}
