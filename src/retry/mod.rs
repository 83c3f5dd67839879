//! Bounded retry with exponential backoff around a single storage write.

pub mod classify;
pub mod inserter;
pub mod policy;

pub use classify::{RetryAll, RetryClass, RetryClassifier, SerializationConflicts};
pub use inserter::{AttemptState, InsertReport, RetryingInserter};
pub use policy::RetryPolicy;
