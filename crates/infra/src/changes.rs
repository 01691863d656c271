//! Row-change notifications.
//!
//! Stores publish one [`ItemChange`] after every successful mutation. Delivery
//! is lossy: a slow subscriber sees `Lagged` and is expected to re-fetch.

use serde::Serialize;
use tokio::sync::broadcast;

use labtrack_core::ItemId;
use labtrack_inventory::InventoryItem;

pub const CHANGE_FEED_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ItemChange {
    Inserted { item: InventoryItem },
    Updated { item: InventoryItem },
    Deleted { id: ItemId },
}

impl ItemChange {
    pub fn item_id(&self) -> ItemId {
        match self {
            ItemChange::Inserted { item } | ItemChange::Updated { item } => item.id,
            ItemChange::Deleted { id } => *id,
        }
    }

    /// SSE event name.
    pub fn topic(&self) -> &'static str {
        match self {
            ItemChange::Inserted { .. } => "item.inserted",
            ItemChange::Updated { .. } => "item.updated",
            ItemChange::Deleted { .. } => "item.deleted",
        }
    }
}

/// Broadcast handle shared by the store, the live listing and SSE clients.
#[derive(Debug, Clone)]
pub struct ChangeFeed {
    tx: broadcast::Sender<ItemChange>,
}

impl ChangeFeed {
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(CHANGE_FEED_CAPACITY);
        Self { tx }
    }

    /// Publish without waiting; having no subscribers is fine.
    pub fn publish(&self, change: ItemChange) {
        tracing::debug!(topic = change.topic(), item_id = %change.item_id(), "item change");
        let _ = self.tx.send(change);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ItemChange> {
        self.tx.subscribe()
    }
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_receive_changes_published_after_subscribing() {
        let feed = ChangeFeed::new();
        feed.publish(ItemChange::Deleted { id: ItemId::new() });

        let mut rx = feed.subscribe();
        let id = ItemId::new();
        feed.publish(ItemChange::Deleted { id });

        let change = rx.recv().await.unwrap();
        assert_eq!(change.item_id(), id);
        assert_eq!(change.topic(), "item.deleted");
    }

    #[test]
    fn serializes_with_a_type_tag() {
        let id = ItemId::new();
        let json = serde_json::to_value(ItemChange::Deleted { id }).unwrap();
        assert_eq!(json["type"], "deleted");
        assert_eq!(json["id"], id.to_string());
    }
}
