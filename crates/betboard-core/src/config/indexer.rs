use super::store::{default_store_path, StoreConfig};
use crate::error::{BoardError, Result};
use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

/// What the processor does with an event that fails permanently.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPolicy {
    /// Stop on the first error.
    #[default]
    FailFast,
    /// Record decode and missing-entity failures in the dead-letter queue and
    /// move on. Contract read failures still stop processing.
    DeadLetter,
}

impl FromStr for ErrorPolicy {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "fail_fast" | "fail-fast" => Ok(ErrorPolicy::FailFast),
            "dead_letter" | "dead-letter" => Ok(ErrorPolicy::DeadLetter),
            other => Err(BoardError::Config(format!("Unknown error policy '{}'", other))),
        }
    }
}

/// Configuration for the indexer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexerConfig {
    /// Gamble board contract. When set, logs from any other address are
    /// rejected as undecodable.
    #[serde(default)]
    pub contract_address: Option<Address>,

    /// Maximum number of logs pulled from the source per batch
    /// Default: 500
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Poll interval when the source is drained (milliseconds)
    /// Default: 500ms
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    #[serde(default)]
    pub error_policy: ErrorPolicy,

    #[serde(default)]
    pub store: StoreConfig,
}

fn default_batch_size() -> usize {
    500
}

fn default_poll_interval_ms() -> u64 {
    500
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            contract_address: None,
            batch_size: default_batch_size(),
            poll_interval_ms: default_poll_interval_ms(),
            error_policy: ErrorPolicy::default(),
            store: StoreConfig::default(),
        }
    }
}

impl IndexerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create config from environment variables
    ///
    /// Looks for:
    /// - BETBOARD_CONTRACT_ADDRESS
    /// - BETBOARD_DB_PATH
    /// - BETBOARD_BATCH_SIZE
    /// - BETBOARD_POLL_INTERVAL_MS
    /// - BETBOARD_ERROR_POLICY (`fail_fast` or `dead_letter`)
    pub fn from_env() -> Result<Self> {
        use std::env;

        let mut config = Self::default();

        if let Ok(address) = env::var("BETBOARD_CONTRACT_ADDRESS") {
            config.contract_address = Some(
                address
                    .parse()
                    .map_err(|e| BoardError::Config(format!("Invalid contract address: {}", e)))?,
            );
        }

        config.store.path = env::var("BETBOARD_DB_PATH")
            .map(Into::into)
            .unwrap_or_else(|_| default_store_path());

        if let Ok(size) = env::var("BETBOARD_BATCH_SIZE") {
            config.batch_size = size
                .parse()
                .map_err(|e| BoardError::Config(format!("Invalid batch size: {}", e)))?;
        }

        if let Ok(interval) = env::var("BETBOARD_POLL_INTERVAL_MS") {
            config.poll_interval_ms = interval
                .parse()
                .map_err(|e| BoardError::Config(format!("Invalid poll interval: {}", e)))?;
        }

        if let Ok(policy) = env::var("BETBOARD_ERROR_POLICY") {
            config.error_policy = policy.parse()?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Load config from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = std::fs::read(path.as_ref())?;
        let config: Self = serde_json::from_slice(&bytes)
            .map_err(|e| BoardError::Config(format!("Invalid config file: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(BoardError::Config("batch_size must be at least 1".into()));
        }
        Ok(())
    }

    pub fn with_contract_address(mut self, address: Address) -> Self {
        self.contract_address = Some(address);
        self
    }

    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size;
        self
    }

    pub fn with_poll_interval_ms(mut self, ms: u64) -> Self {
        self.poll_interval_ms = ms;
        self
    }

    pub fn with_error_policy(mut self, policy: ErrorPolicy) -> Self {
        self.error_policy = policy;
        self
    }

    pub fn with_store(mut self, store: StoreConfig) -> Self {
        self.store = store;
        self
    }
}
