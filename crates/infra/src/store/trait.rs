use thiserror::Error;

use labtrack_core::ItemId;
use labtrack_inventory::{InventoryItem, ItemDraft};

use crate::changes::ChangeFeed;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("item {0} not found")]
    NotFound(ItemId),

    #[error("storage backend error: {0}")]
    Backend(String),

    #[error("invalid stored row: {0}")]
    Decode(String),
}

/// CRUD over inventory rows.
///
/// Implementations assign `id`, `created_at` and `updated_at`, and publish an
/// [`crate::changes::ItemChange`] on [`ItemStore::changes`] after every
/// successful mutation.
#[async_trait::async_trait]
pub trait ItemStore: Send + Sync {
    /// Every row, newest first.
    async fn list(&self) -> Result<Vec<InventoryItem>, StoreError>;

    async fn get(&self, id: ItemId) -> Result<InventoryItem, StoreError>;

    /// Insert a new row; `quantity_original` starts equal to the current quantity.
    async fn insert(&self, draft: ItemDraft) -> Result<InventoryItem, StoreError>;

    /// Overwrite the editable fields of an existing row.
    async fn update(&self, id: ItemId, draft: ItemDraft) -> Result<InventoryItem, StoreError>;

    async fn delete(&self, id: ItemId) -> Result<(), StoreError>;

    fn changes(&self) -> &ChangeFeed;
}
