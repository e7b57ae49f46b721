pub mod dlq;
pub mod query;
pub mod replay;
pub mod status;
