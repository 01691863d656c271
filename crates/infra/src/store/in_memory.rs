use std::collections::HashMap;
use std::sync::RwLock;

use chrono::Utc;

use labtrack_core::ItemId;
use labtrack_inventory::{InventoryItem, ItemDraft};

use super::r#trait::{ItemStore, StoreError};
use crate::changes::{ChangeFeed, ItemChange};

/// Process-local item store.
///
/// Used when no database is configured, and by tests.
#[derive(Debug, Default)]
pub struct InMemoryItemStore {
    rows: RwLock<HashMap<ItemId, InventoryItem>>,
    feed: ChangeFeed,
}

impl InMemoryItemStore {
    pub fn new(feed: ChangeFeed) -> Self {
        Self {
            rows: RwLock::new(HashMap::new()),
            feed,
        }
    }
}

fn poisoned() -> StoreError {
    StoreError::Backend("in-memory store lock poisoned".to_string())
}

#[async_trait::async_trait]
impl ItemStore for InMemoryItemStore {
    async fn list(&self) -> Result<Vec<InventoryItem>, StoreError> {
        let rows = self.rows.read().map_err(|_| poisoned())?;
        let mut items: Vec<_> = rows.values().cloned().collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(items)
    }

    async fn get(&self, id: ItemId) -> Result<InventoryItem, StoreError> {
        let rows = self.rows.read().map_err(|_| poisoned())?;
        rows.get(&id).cloned().ok_or(StoreError::NotFound(id))
    }

    async fn insert(&self, draft: ItemDraft) -> Result<InventoryItem, StoreError> {
        let item = InventoryItem::from_draft(ItemId::new(), draft, Utc::now());
        {
            let mut rows = self.rows.write().map_err(|_| poisoned())?;
            rows.insert(item.id, item.clone());
        }
        self.feed.publish(ItemChange::Inserted { item: item.clone() });
        Ok(item)
    }

    async fn update(&self, id: ItemId, draft: ItemDraft) -> Result<InventoryItem, StoreError> {
        let item = {
            let mut rows = self.rows.write().map_err(|_| poisoned())?;
            let row = rows.get_mut(&id).ok_or(StoreError::NotFound(id))?;
            row.apply_update(draft, Utc::now());
            row.clone()
        };
        self.feed.publish(ItemChange::Updated { item: item.clone() });
        Ok(item)
    }

    async fn delete(&self, id: ItemId) -> Result<(), StoreError> {
        let removed = {
            let mut rows = self.rows.write().map_err(|_| poisoned())?;
            rows.remove(&id)
        };
        if removed.is_none() {
            return Err(StoreError::NotFound(id));
        }
        self.feed.publish(ItemChange::Deleted { id });
        Ok(())
    }

    fn changes(&self) -> &ChangeFeed {
        &self.feed
    }
}
