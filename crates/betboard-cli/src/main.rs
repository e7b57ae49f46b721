//! Betboard CLI - Command-line interface for the gamble board indexer

use alloy_primitives::Address;
use anyhow::{Context, Result};
use betboard::IndexerConfig;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(name = "betboard")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to the SQLite database (overrides BETBOARD_DB_PATH)
    #[arg(short, long, global = true)]
    db_path: Option<PathBuf>,

    /// JSON indexer config file; environment variables are used otherwise
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Project a log file once and exit
    Replay(IngestArgs),

    /// Project a log file and keep following it until Ctrl+C
    Follow(IngestArgs),

    /// Projection cursor and entity counts
    Status,

    /// Print a bet as JSON
    Bet {
        /// Bet id, decimal or 0x-prefixed hex
        id: String,
    },

    /// Print a fixture and its bets as JSON
    Fixture {
        /// Fixture key: description|country|category|league|day
        key: String,
    },

    /// Print a league and its fixtures as JSON
    League {
        /// League key: country|category|league
        key: String,
    },

    /// Dead letter queue commands
    #[command(subcommand)]
    Dlq(DlqCommands),
}

#[derive(Args)]
pub struct IngestArgs {
    /// Newline-delimited JSON logs
    #[arg(long)]
    logs: PathBuf,

    /// Contract state history (JSON)
    #[arg(long)]
    state: PathBuf,

    /// Only accept logs emitted by this board contract
    #[arg(long)]
    contract: Option<Address>,

    /// Dead-letter permanent failures instead of stopping
    #[arg(long)]
    dead_letter: bool,
}

#[derive(Subcommand)]
pub enum DlqCommands {
    /// List failed logs, most recent first
    List {
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },

    /// Remove all failed logs
    Clear,
}

fn load_config(cli: &Cli) -> Result<IndexerConfig> {
    let mut config = match &cli.config {
        Some(path) => IndexerConfig::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => IndexerConfig::from_env().context("Invalid BETBOARD_* environment")?,
    };
    if let Some(path) = &cli.db_path {
        config.store.path = path.clone();
    }
    Ok(config)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .init();

    let config = load_config(&cli)?;

    // Execute command
    match cli.command {
        Commands::Replay(args) => commands::replay::execute(config, args, false)?,
        Commands::Follow(args) => commands::replay::execute(config, args, true)?,
        Commands::Status => commands::status::execute(config)?,
        Commands::Bet { id } => commands::query::bet(config, &id)?,
        Commands::Fixture { key } => commands::query::fixture(config, &key)?,
        Commands::League { key } => commands::query::league(config, &key)?,
        Commands::Dlq(dlq_cmd) => commands::dlq::execute(config, dlq_cmd)?,
    }

    Ok(())
}
