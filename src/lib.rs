// ============================================================================
// cartretry Library
// ============================================================================

pub mod core;
pub mod config;
pub mod facade;
pub mod interface;
pub mod retry;
pub mod storage;

// Re-export main types for convenience
pub use crate::core::{CartItem, InsertError, ItemId, Result, SERIALIZATION_FAILURE, WriteError};
pub use facade::CartService;
pub use interface::StorageWriter;
pub use retry::{
    AttemptState, InsertReport, RetryAll, RetryClass, RetryClassifier, RetryPolicy,
    RetryingInserter, SerializationConflicts,
};
pub use storage::{FlakyWriter, InMemoryCartItemStore};
