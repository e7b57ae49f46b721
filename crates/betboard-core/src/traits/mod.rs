pub mod reader;
pub mod store;

pub use reader::{ContractReader, ContractSnapshot};
pub use store::{ChangeSet, EntityCounts, EntityStore};
