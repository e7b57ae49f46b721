//! Continuous Event Processor
//!
//! Pulls raw logs from a [`LogSource`], decodes them, routes them to the
//! handler registry and commits each event's writes together with its
//! position. Logs at or before the store cursor are skipped, so restarting
//! over the same log stream is a no-op.

use crate::decoder::LogDecoder;
use crate::dead_letter_queue::DeadLetterQueue;
use crate::event_handler::EventHandlerRegistry;
use crate::source::{LogSource, SourceItem};
use alloy_primitives::Address;
use betboard_core::{
    observe, BoardError, ChangeSet, ContractReader, EntityStore, ErrorPolicy, EventPosition,
    IndexerConfig, Result,
};
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Error handling strategy for failed logs
#[allow(clippy::type_complexity)]
pub enum ErrorStrategy {
    /// Fail fast - stop processing on first error
    FailFast,
    /// Send permanent failures to the dead letter queue and continue; stop
    /// on transient ones without moving the cursor
    DeadLetter,
    /// Custom handler - call a custom function to decide what to do
    Custom(Arc<dyn Fn(&BoardError, &SourceItem) -> ErrorAction + Send + Sync>),
}

impl From<ErrorPolicy> for ErrorStrategy {
    fn from(policy: ErrorPolicy) -> Self {
        match policy {
            ErrorPolicy::FailFast => ErrorStrategy::FailFast,
            ErrorPolicy::DeadLetter => ErrorStrategy::DeadLetter,
        }
    }
}

/// Action to take after an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorAction {
    /// Stop processing; the log is retried on the next run
    Stop,
    /// Skip this log and continue
    Skip,
    /// Retry this log on the next batch
    Retry,
    /// Send to dead letter queue and continue
    DeadLetter,
}

/// Counters for processed logs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProcessorStats {
    pub applied: usize,
    /// Already applied, or skipped by the error strategy
    pub skipped: usize,
    pub dead_lettered: usize,
}

impl ProcessorStats {
    pub fn total(&self) -> usize {
        self.applied + self.skipped + self.dead_lettered
    }

    pub fn merge(&mut self, other: ProcessorStats) {
        self.applied += other.applied;
        self.skipped += other.skipped;
        self.dead_lettered += other.dead_lettered;
    }
}

enum Processed {
    Applied(&'static str),
    AlreadyApplied,
}

/// Builder for event processors
///
/// # Example
///
/// ```ignore
/// let mut processor = EventProcessor::builder(store, state, JsonLinesSource::open("logs.jsonl")?)
///     .with_contract(board)
///     .with_error_strategy(ErrorStrategy::DeadLetter)
///     .with_dead_letter_queue(dlq)
///     .build()?;
///
/// let stats = processor.drain()?;
/// ```
pub struct EventProcessorBuilder {
    store: Arc<dyn EntityStore>,
    reader: Arc<dyn ContractReader>,
    source: Box<dyn LogSource>,
    registry: EventHandlerRegistry,
    decoder: LogDecoder,
    poll_interval: Duration,
    batch_size: usize,
    error_strategy: ErrorStrategy,
    dlq: Option<Arc<DeadLetterQueue>>,
}

impl EventProcessorBuilder {
    pub fn new(
        store: Arc<dyn EntityStore>,
        reader: Arc<dyn ContractReader>,
        source: impl LogSource + 'static,
    ) -> Self {
        Self {
            store,
            reader,
            source: Box::new(source),
            registry: EventHandlerRegistry::gamble_board(),
            decoder: LogDecoder::new(),
            poll_interval: Duration::from_millis(500),
            batch_size: 500,
            error_strategy: ErrorStrategy::FailFast,
            dlq: None,
        }
    }

    /// Apply contract address, batch size, poll interval and error policy
    pub fn with_config(mut self, config: &IndexerConfig) -> Self {
        if let Some(contract) = config.contract_address {
            self.decoder = LogDecoder::for_contract(contract);
        }
        self.batch_size = config.batch_size;
        self.poll_interval = Duration::from_millis(config.poll_interval_ms);
        self.error_strategy = config.error_policy.into();
        self
    }

    /// Replace the handler registry
    pub fn with_registry(mut self, registry: EventHandlerRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Only accept logs emitted by `contract`
    pub fn with_contract(mut self, contract: Address) -> Self {
        self.decoder = LogDecoder::for_contract(contract);
        self
    }

    /// Set the poll interval (how often to check for new logs)
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Set the batch size (how many logs to fetch at once)
    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size;
        self
    }

    /// Set the error handling strategy
    pub fn with_error_strategy(mut self, strategy: ErrorStrategy) -> Self {
        self.error_strategy = strategy;
        self
    }

    /// Enable dead letter queue
    pub fn with_dead_letter_queue(mut self, dlq: Arc<DeadLetterQueue>) -> Self {
        self.dlq = Some(dlq);
        self
    }

    /// Build the event processor
    pub fn build(self) -> Result<EventProcessor> {
        if self.batch_size == 0 {
            return Err(BoardError::Config("batch_size must be greater than 0".into()));
        }
        if matches!(self.error_strategy, ErrorStrategy::DeadLetter) && self.dlq.is_none() {
            return Err(BoardError::Config(
                "DeadLetter strategy requires a dead letter queue".into(),
            ));
        }

        Ok(EventProcessor {
            store: self.store,
            reader: self.reader,
            source: self.source,
            registry: Arc::new(self.registry),
            decoder: self.decoder,
            poll_interval: self.poll_interval,
            batch_size: self.batch_size,
            error_strategy: self.error_strategy,
            dlq: self.dlq,
            shutdown: Arc::new(AtomicBool::new(false)),
            pending: VecDeque::new(),
            last_position: None,
            stats: ProcessorStats::default(),
        })
    }
}

/// Continuous event processor
///
/// Processes one log at a time. Each applied event commits atomically with
/// its position; a log that fails is either retried, skipped or
/// dead-lettered according to the [`ErrorStrategy`].
pub struct EventProcessor {
    store: Arc<dyn EntityStore>,
    reader: Arc<dyn ContractReader>,
    source: Box<dyn LogSource>,
    registry: Arc<EventHandlerRegistry>,
    decoder: LogDecoder,
    poll_interval: Duration,
    batch_size: usize,
    error_strategy: ErrorStrategy,
    dlq: Option<Arc<DeadLetterQueue>>,
    shutdown: Arc<AtomicBool>,
    /// Fetched but not yet processed; a failed log stays at the front.
    pending: VecDeque<SourceItem>,
    last_position: Option<EventPosition>,
    stats: ProcessorStats,
}

impl EventProcessor {
    /// Create a new builder
    pub fn builder(
        store: Arc<dyn EntityStore>,
        reader: Arc<dyn ContractReader>,
        source: impl LogSource + 'static,
    ) -> EventProcessorBuilder {
        EventProcessorBuilder::new(store, reader, source)
    }

    /// Run the processor until shutdown is signaled
    pub async fn run(&mut self) -> Result<()> {
        tracing::info!("Event processor started");

        while !self.shutdown.load(Ordering::SeqCst) {
            let batch = self.process_batch()?;

            if batch.total() == 0 {
                tokio::time::sleep(self.poll_interval).await;
            }
        }

        tracing::info!(stats = ?self.stats, "Event processor shutdown");
        Ok(())
    }

    /// Run the processor synchronously (blocking)
    pub fn run_blocking(&mut self) -> Result<()> {
        tracing::info!("Event processor started (blocking mode)");

        while !self.shutdown.load(Ordering::SeqCst) {
            let batch = self.process_batch()?;

            if batch.total() == 0 {
                std::thread::sleep(self.poll_interval);
            }
        }

        tracing::info!(stats = ?self.stats, "Event processor shutdown");
        Ok(())
    }

    /// Process batches until the source has nothing more to give
    pub fn drain(&mut self) -> Result<ProcessorStats> {
        let mut total = ProcessorStats::default();
        loop {
            let batch = self.process_batch()?;
            if batch.total() == 0 {
                break;
            }
            total.merge(batch);
        }
        Ok(total)
    }

    /// Process a single batch of logs
    pub fn process_batch(&mut self) -> Result<ProcessorStats> {
        if self.pending.is_empty() {
            let fetched = self.source.fetch(self.batch_size)?;
            self.pending.extend(fetched);
        }

        let mut batch = ProcessorStats::default();
        while let Some(item) = self.pending.pop_front() {
            let started = Instant::now();
            match self.process_item(&item) {
                Ok(Processed::Applied(event)) => {
                    observe::record_event_applied(event, started.elapsed());
                    batch.applied += 1;
                }
                Ok(Processed::AlreadyApplied) => {
                    observe::record_event_skipped();
                    batch.skipped += 1;
                }
                Err(e) => {
                    observe::record_event_failed(e.kind());
                    match self.handle_error(&e, &item) {
                        ErrorAction::Stop => {
                            self.pending.push_front(item);
                            self.stats.merge(batch);
                            return Err(e);
                        }
                        ErrorAction::Retry => {
                            tracing::info!(
                                position = ?item.position(),
                                "Will retry log on next batch: {}",
                                e
                            );
                            self.pending.push_front(item);
                            break;
                        }
                        action @ (ErrorAction::Skip | ErrorAction::DeadLetter) => {
                            let passed = if action == ErrorAction::Skip {
                                tracing::warn!(
                                    position = ?item.position(),
                                    "Skipping log due to error: {}",
                                    e
                                );
                                self.advance_past(&item)
                            } else {
                                self.dead_letter(&item, &e)
                            };
                            if let Err(err) = passed {
                                self.pending.push_front(item);
                                self.stats.merge(batch);
                                return Err(err);
                            }
                            if action == ErrorAction::Skip {
                                batch.skipped += 1;
                            } else {
                                batch.dead_lettered += 1;
                            }
                        }
                    }
                }
            }
        }

        if batch.total() > 0 {
            tracing::debug!(
                applied = batch.applied,
                skipped = batch.skipped,
                dead_lettered = batch.dead_lettered,
                cursor = ?self.last_position,
                "Processed batch"
            );
        }
        self.stats.merge(batch);
        Ok(batch)
    }

    fn process_item(&mut self, item: &SourceItem) -> Result<Processed> {
        let log = match item {
            SourceItem::Log(log) => log,
            SourceItem::Malformed { reason, .. } => {
                return Err(BoardError::Decode(reason.clone()));
            }
        };

        let position = log.position();
        if let Some(last) = self.last_position {
            if position <= last {
                tracing::warn!(
                    %position,
                    %last,
                    "Log position regressed, skipping as already applied"
                );
                return Ok(Processed::AlreadyApplied);
            }
        }
        if let Some(cursor) = self.store.cursor()? {
            if position <= cursor {
                tracing::debug!(%position, %cursor, "Log already applied");
                return Ok(Processed::AlreadyApplied);
            }
        }

        let decoded = self.decoder.decode(log)?;
        let event = decoded.event.name();
        let changes = self
            .registry
            .apply(self.store.as_ref(), self.reader.as_ref(), &decoded)?;
        tracing::debug!(%position, event, writes = changes.len(), "Applied event");
        self.last_position = Some(position);
        Ok(Processed::Applied(event))
    }

    /// Move the cursor past a log that will not be applied.
    fn advance_past(&mut self, item: &SourceItem) -> Result<()> {
        let Some(position) = item.position() else {
            return Ok(());
        };
        let behind = self.store.cursor()?.map_or(true, |cursor| position > cursor);
        if behind {
            self.store.commit(ChangeSet::new(position))?;
        }
        self.last_position = Some(self.last_position.map_or(position, |p| p.max(position)));
        Ok(())
    }

    fn dead_letter(&mut self, item: &SourceItem, error: &BoardError) -> Result<()> {
        let Some(dlq) = self.dlq.clone() else {
            tracing::error!("DeadLetter action requested but no DLQ configured");
            return Err(BoardError::Config("No dead letter queue configured".into()));
        };

        let id = dlq.add(item.position(), &item.payload()?, error)?;
        tracing::error!(
            position = ?item.position(),
            dlq_id = id,
            kind = error.kind(),
            "Log sent to dead letter queue: {}",
            error
        );
        observe::record_dead_letter(error.kind());
        self.advance_past(item)
    }

    /// Handle an error according to the configured strategy
    fn handle_error(&self, error: &BoardError, item: &SourceItem) -> ErrorAction {
        match &self.error_strategy {
            ErrorStrategy::FailFast => {
                tracing::error!(position = ?item.position(), "Error processing log: {}", error);
                ErrorAction::Stop
            }
            ErrorStrategy::DeadLetter if error.is_transient() => {
                tracing::warn!(
                    position = ?item.position(),
                    "Transient error, stopping until the log can be retried: {}",
                    error
                );
                ErrorAction::Stop
            }
            ErrorStrategy::DeadLetter => ErrorAction::DeadLetter,
            ErrorStrategy::Custom(handler) => handler(error, item),
        }
    }

    /// Signal graceful shutdown
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }

    /// Get a handle for shutting down the processor
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            shutdown: self.shutdown.clone(),
        }
    }

    /// Position of the last log applied or passed over in this run
    pub fn last_position(&self) -> Option<EventPosition> {
        self.last_position
    }

    /// Totals since the processor was built
    pub fn stats(&self) -> ProcessorStats {
        self.stats
    }

    /// Logs fetched but not yet processed
    pub fn pending(&self) -> usize {
        self.pending.len()
    }
}

/// Handle for shutting down an event processor
#[derive(Clone)]
pub struct ShutdownHandle {
    shutdown: Arc<AtomicBool>,
}

impl ShutdownHandle {
    /// Signal shutdown
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }
}
