pub mod indexer;
pub mod store;

pub use indexer::{ErrorPolicy, IndexerConfig};
pub use store::{StoreConfig, SynchronousMode};
