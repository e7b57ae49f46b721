//! Replay and follow command implementation

use crate::IngestArgs;
use anyhow::{Context, Result};
use betboard::prelude::*;

pub fn execute(mut config: IndexerConfig, args: IngestArgs, follow: bool) -> Result<()> {
    if let Some(contract) = args.contract {
        config = config.with_contract_address(contract);
    }
    if args.dead_letter {
        config = config.with_error_policy(ErrorPolicy::DeadLetter);
    }

    let board = BetBoard::open_with_config(config).context("Failed to open database")?;
    let state = MemoryContractState::from_file(&args.state)
        .with_context(|| format!("Failed to load contract state {}", args.state.display()))?;
    let mut source = JsonLinesSource::open(&args.logs)
        .with_context(|| format!("Failed to open log file {}", args.logs.display()))?;
    if follow {
        source = source.following();
    }

    let mut processor = board
        .processor(Arc::new(state), source)
        .build()
        .context("Invalid processor configuration")?;

    if follow {
        println!("Following {}... (Press Ctrl+C to stop)", args.logs.display());

        let runtime = tokio::runtime::Runtime::new().context("Failed to start runtime")?;
        runtime.block_on(async {
            let shutdown = processor.shutdown_handle();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::info!("Ctrl+C received, shutting down");
                    shutdown.shutdown();
                }
            });
            processor.run().await
        })
        .context("Processor failed")?;
    } else {
        println!("Replaying {}...", args.logs.display());
        processor.drain().context("Processor failed")?;
    }

    let stats = processor.stats();
    println!(
        "✓ Applied {} events ({} skipped, {} dead-lettered)",
        stats.applied, stats.skipped, stats.dead_lettered
    );
    if let Some(position) = board.status()?.cursor {
        println!("Cursor: {}", position);
    }

    Ok(())
}
