//! Unified indexer interface
//!
//! Bundles the SQLite projection store and the dead letter queue, which
//! share one database file, and builds processors over them.

use crate::dead_letter_queue::DeadLetterQueue;
use crate::event_processor::{EventProcessor, EventProcessorBuilder};
use crate::source::LogSource;
use betboard_core::{
    ContractReader, EntityCounts, EntityStore, EventPosition, IndexerConfig, Result, StoreConfig,
};
use betboard_sqlite::SqliteEntityStore;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

/// Cursor and size of the projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BoardStatus {
    pub cursor: Option<EventPosition>,
    pub counts: EntityCounts,
    pub dead_letters: usize,
}

pub struct BetBoard {
    store: Arc<SqliteEntityStore>,
    dlq: Arc<DeadLetterQueue>,
    config: IndexerConfig,
}

impl BetBoard {
    /// Open the board database at `path` with default settings
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config =
            IndexerConfig::default().with_store(StoreConfig::new(path.as_ref().to_path_buf()));
        Self::open_with_config(config)
    }

    pub fn open_with_config(config: IndexerConfig) -> Result<Self> {
        config.validate()?;
        let store = Arc::new(SqliteEntityStore::open(config.store.clone())?);
        let dlq = Arc::new(DeadLetterQueue::new(store.conn().clone())?);
        tracing::info!("Opened board database at {}", store.path().display());
        Ok(Self { store, dlq, config })
    }

    pub fn store(&self) -> &Arc<SqliteEntityStore> {
        &self.store
    }

    pub fn dead_letter_queue(&self) -> &Arc<DeadLetterQueue> {
        &self.dlq
    }

    pub fn config(&self) -> &IndexerConfig {
        &self.config
    }

    /// Processor builder over this board's store, configured from the
    /// board's settings. The dead letter queue is always attached.
    pub fn processor(
        &self,
        reader: Arc<dyn ContractReader>,
        source: impl LogSource + 'static,
    ) -> EventProcessorBuilder {
        EventProcessor::builder(self.store.clone(), reader, source)
            .with_config(&self.config)
            .with_dead_letter_queue(self.dlq.clone())
    }

    pub fn status(&self) -> Result<BoardStatus> {
        Ok(BoardStatus {
            cursor: self.store.cursor()?,
            counts: self.store.counts()?,
            dead_letters: self.dlq.count()?,
        })
    }
}
