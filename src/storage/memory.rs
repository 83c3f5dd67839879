use crate::core::{CartItem, ItemId, WriteError};
use crate::interface::StorageWriter;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Cart item DAO backed by an in-memory table.
///
/// Cloning is cheap and clones share the same table, so a test can keep a
/// handle while the inserter owns another.
#[derive(Clone, Default)]
pub struct InMemoryCartItemStore {
    items: Arc<RwLock<HashMap<ItemId, CartItem>>>,
}

impl InMemoryCartItemStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a row and return its generated id
    pub async fn insert_item(&self, item: &CartItem) -> Result<ItemId, WriteError> {
        if item.product_id.trim().is_empty() {
            return Err(WriteError::ConstraintViolation(
                "Column 'product_id' cannot be empty".to_string(),
            ));
        }

        if item.quantity == 0 {
            return Err(WriteError::ConstraintViolation(
                "Column 'quantity' must be > 0".to_string(),
            ));
        }

        let id = ItemId::new();
        self.items.write().await.insert(id, item.clone());
        Ok(id)
    }

    pub async fn get(&self, id: &ItemId) -> Option<CartItem> {
        self.items.read().await.get(id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.items.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.items.read().await.is_empty()
    }

    /// All items of one cart, oldest first
    pub async fn items_in_cart(&self, cart_id: Uuid) -> Vec<(ItemId, CartItem)> {
        let items = self.items.read().await;
        let mut rows: Vec<_> = items
            .iter()
            .filter(|(_, item)| item.cart_id == cart_id)
            .map(|(id, item)| (*id, item.clone()))
            .collect();
        rows.sort_by_key(|(_, item)| item.added_at);
        rows
    }
}

#[async_trait]
impl StorageWriter for InMemoryCartItemStore {
    type Item = CartItem;
    type Id = ItemId;

    async fn insert(&self, item: &CartItem) -> Result<ItemId, WriteError> {
        self.insert_item(item).await
    }
}
