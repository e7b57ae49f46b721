//! Dead letter queue commands

use crate::DlqCommands;
use anyhow::{Context, Result};
use betboard::prelude::*;

pub fn execute(config: IndexerConfig, cmd: DlqCommands) -> Result<()> {
    let board = BetBoard::open_with_config(config).context("Failed to open database")?;
    let dlq = board.dead_letter_queue();

    match cmd {
        DlqCommands::List { limit } => {
            let failed = dlq.list(limit).context("Failed to list dead letters")?;
            if failed.is_empty() {
                println!("Dead letter queue is empty");
                return Ok(());
            }
            println!("{}", serde_json::to_string_pretty(&failed)?);
            println!("{} of {} shown", failed.len(), dlq.count()?);
        }
        DlqCommands::Clear => {
            let count = dlq.count()?;
            dlq.clear().context("Failed to clear dead letter queue")?;
            println!("✓ Removed {} failed log(s)", count);
        }
    }

    Ok(())
}
