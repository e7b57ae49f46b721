//! Status command implementation

use anyhow::{Context, Result};
use betboard::prelude::*;

pub fn execute(config: IndexerConfig) -> Result<()> {
    tracing::info!("Checking database status: {}", config.store.path.display());

    let board = BetBoard::open_with_config(config).context("Failed to open database")?;
    let status = board.status().context("Failed to read status")?;

    println!("\nDatabase Status");
    println!("{}", "=".repeat(60));
    println!("Path: {}", board.store().path().display());

    let schema_version = board
        .store()
        .schema_version()
        .context("Failed to get schema version")?;
    println!("Schema Version: {}", schema_version);
    if let Some(contract) = board.config().contract_address {
        println!("Board Contract: {}", contract);
    }

    println!("\nProjection:");
    match status.cursor {
        Some(position) => println!("  Last Applied Log: {}", position),
        None => println!("  Last Applied Log: none"),
    }
    println!("  Bets: {}", status.counts.bets);
    println!("  Fixtures: {}", status.counts.fixtures);
    println!("  Leagues: {}", status.counts.leagues);

    if status.dead_letters > 0 {
        println!(
            "\n⚠️  {} log(s) in the dead letter queue",
            status.dead_letters
        );
        println!("Run 'betboard dlq list' to inspect them");
    } else {
        println!("\n✓ No failed logs");
    }

    Ok(())
}
