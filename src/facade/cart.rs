use crate::core::{CartItem, ItemId, Result};
use crate::interface::StorageWriter;
use crate::retry::{RetryAll, RetryClassifier, RetryPolicy, RetryingInserter};
use std::future::Future;

/// Shopping cart operations with retried writes.
///
/// # Examples
///
/// ```
/// # use cartretry::{CartItem, CartService, InMemoryCartItemStore, RetryPolicy};
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let store = InMemoryCartItemStore::new();
/// let service = CartService::new(store.clone(), RetryPolicy::default())?;
///
/// let cart = uuid::Uuid::new_v4();
/// let id = service.add_item_to_cart(CartItem::new(cart, "sku-42", 2)).await?;
///
/// assert!(store.get(&id).await.is_some());
/// # Ok(())
/// # }
/// ```
pub struct CartService<W, C = RetryAll> {
    inserter: RetryingInserter<W, C>,
}

impl<W> CartService<W>
where
    W: StorageWriter<Item = CartItem, Id = ItemId>,
{
    pub fn new(writer: W, policy: RetryPolicy) -> Result<Self> {
        Ok(Self {
            inserter: RetryingInserter::new(writer, policy)?,
        })
    }
}

impl<W, C> CartService<W, C>
where
    W: StorageWriter<Item = CartItem, Id = ItemId>,
    C: RetryClassifier,
{
    pub fn from_inserter(inserter: RetryingInserter<W, C>) -> Self {
        Self { inserter }
    }

    /// Add `item` to its cart, retrying the insert on failure.
    pub async fn add_item_to_cart(&self, item: CartItem) -> Result<ItemId> {
        self.inserter.insert(&item).await
    }

    /// Same as `add_item_to_cart`, abandoning pending retries once `shutdown` fires.
    pub async fn add_item_to_cart_until<F>(&self, item: CartItem, shutdown: F) -> Result<ItemId>
    where
        F: Future<Output = ()>,
    {
        self.inserter.insert_with_cancel(&item, shutdown).await
    }

    pub fn inserter(&self) -> &RetryingInserter<W, C> {
        &self.inserter
    }
}
