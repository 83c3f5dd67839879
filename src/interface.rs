use async_trait::async_trait;
use crate::core::WriteError;
use std::sync::Arc;

/// A storage capability that persists a single item and returns its identifier.
///
/// This is the only collaborator of the retrying inserter. Implement it for a
/// DAO over a real database driver, or use `InMemoryCartItemStore` for tests
/// and demos. Every failure is reported as a `WriteError`; whether it is worth
/// retrying is decided by the caller's classifier, not by the writer.
#[async_trait]
pub trait StorageWriter: Send + Sync {
    type Item: Send + Sync;
    type Id: Send;

    /// Persist `item` and return the generated identifier.
    async fn insert(&self, item: &Self::Item) -> Result<Self::Id, WriteError>;
}

#[async_trait]
impl<W: StorageWriter + ?Sized> StorageWriter for Arc<W> {
    type Item = W::Item;
    type Id = W::Id;

    async fn insert(&self, item: &Self::Item) -> Result<Self::Id, WriteError> {
        (**self).insert(item).await
    }
}
