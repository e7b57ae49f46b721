use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BoardError {
    /// Malformed log, unknown event signature or out-of-range parameter.
    #[error("Decode error: {0}")]
    Decode(String),

    /// A handler required an entity that the store does not hold.
    #[error("Missing {kind} entity: {id}")]
    MissingEntity { kind: &'static str, id: String },

    /// A point-in-time contract read failed.
    #[error("Contract read error at block {block}: {message}")]
    ContractRead { block: u64, message: String },

    #[error("Store error: {0}")]
    Store(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

impl BoardError {
    pub fn missing_bet(id: impl Into<String>) -> Self {
        Self::MissingEntity {
            kind: "bet",
            id: id.into(),
        }
    }

    pub fn contract_read(block: u64, message: impl Into<String>) -> Self {
        Self::ContractRead {
            block,
            message: message.into(),
        }
    }

    /// Transient infrastructure faults are eligible for retry by the
    /// ingestion pipeline. Everything else is permanent for the event.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::ContractRead { .. })
    }

    /// Short label used for dead-letter records and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Decode(_) => "decode",
            Self::MissingEntity { .. } => "missing_entity",
            Self::ContractRead { .. } => "contract_read",
            Self::Store(_) => "store",
            Self::Io(_) => "io",
            Self::Serialization(_) => "serialization",
            Self::Config(_) => "config",
            Self::InvalidState(_) => "invalid_state",
            Self::Other(_) => "other",
        }
    }
}

impl From<serde_json::Error> for BoardError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, BoardError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_contract_reads_are_transient() {
        assert!(BoardError::contract_read(7, "timeout").is_transient());
        assert!(!BoardError::missing_bet("0x1").is_transient());
        assert!(!BoardError::Decode("bad topic".into()).is_transient());
        assert!(!BoardError::Store("locked".into()).is_transient());
    }

    #[test]
    fn test_display_names_the_entity() {
        let err = BoardError::missing_bet("0x2a");
        assert_eq!(err.to_string(), "Missing bet entity: 0x2a");
        assert_eq!(err.kind(), "missing_entity");
    }
}
