//! Live listing: the in-memory row set behind the listing view.
//!
//! One background task follows the change feed. Deletions take effect at once
//! and leave a tombstone; inserts and updates are applied at once and also
//! schedule a full re-fetch, debounced so that bursts coalesce into one fetch.
//!
//! A fetch that started before a local change may return stale data. Every
//! local change is stamped with an epoch and replayed over any fetch that
//! started earlier, so a deleted row never comes back and a fresh row never
//! disappears.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use labtrack_core::ItemId;
use labtrack_inventory::{InventoryItem, ItemFilter, ItemSort};

use crate::changes::ItemChange;
use crate::store::{ItemStore, StoreError};

#[derive(Debug, Default)]
struct ListingState {
    rows: Vec<InventoryItem>,
    epoch: u64,
    /// Deleted ids, stamped with the epoch of the deletion.
    tombstones: HashMap<ItemId, u64>,
    /// Rows written locally, stamped with the epoch of the write.
    fresh: HashMap<ItemId, (u64, InventoryItem)>,
}

impl ListingState {
    fn apply(&mut self, change: &ItemChange) {
        self.epoch += 1;
        match change {
            ItemChange::Deleted { id } => {
                self.rows.retain(|r| r.id != *id);
                self.fresh.remove(id);
                self.tombstones.insert(*id, self.epoch);
            }
            ItemChange::Inserted { item } | ItemChange::Updated { item } => {
                if self.tombstones.contains_key(&item.id) {
                    return;
                }
                upsert(&mut self.rows, item.clone());
                self.fresh.insert(item.id, (self.epoch, item.clone()));
            }
        }
    }

    /// Replace the row set with a fetch that started at `started`.
    fn replace(&mut self, mut rows: Vec<InventoryItem>, started: u64) {
        rows.retain(|r| !self.tombstones.contains_key(&r.id));
        for (_, item) in self.fresh.values().filter(|(at, _)| *at > started) {
            upsert(&mut rows, item.clone());
        }
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        self.rows = rows;

        // Anything recorded before the fetch began is reflected in its result.
        self.tombstones.retain(|_, at| *at > started);
        self.fresh.retain(|_, (at, _)| *at > started);
    }
}

fn upsert(rows: &mut Vec<InventoryItem>, item: InventoryItem) {
    match rows.iter_mut().find(|r| r.id == item.id) {
        Some(slot) => *slot = item,
        None => rows.push(item),
    }
}

struct Shared {
    store: Arc<dyn ItemStore>,
    state: RwLock<ListingState>,
}

impl Shared {
    fn apply(&self, change: &ItemChange) {
        self.state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .apply(change);
    }

    async fn refresh(&self) -> Result<(), StoreError> {
        let started = self
            .state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .epoch;
        let rows = self.store.list().await?;
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.replace(rows, started);
        tracing::debug!(rows = state.rows.len(), "listing refreshed");
        Ok(())
    }

    async fn refresh_logged(&self) {
        if let Err(e) = self.refresh().await {
            tracing::warn!(error = %e, "listing refresh failed; keeping previous rows");
        }
    }
}

/// Shared, continuously updated listing.
pub struct LiveListing {
    shared: Arc<Shared>,
    task: JoinHandle<()>,
}

impl LiveListing {
    /// Load the initial rows and start following the store's change feed.
    pub async fn start(store: Arc<dyn ItemStore>, debounce: Duration) -> Result<Self, StoreError> {
        // Subscribe first so nothing published during the initial fetch is missed.
        let rx = store.changes().subscribe();
        let shared = Arc::new(Shared {
            store,
            state: RwLock::new(ListingState::default()),
        });
        shared.refresh().await?;

        let task = tokio::spawn(follow(shared.clone(), rx, debounce));
        Ok(Self { shared, task })
    }

    /// Apply a change this process just made, ahead of its feed delivery.
    ///
    /// Applying the same change twice is harmless.
    pub fn apply(&self, change: &ItemChange) {
        self.shared.apply(change);
    }

    /// Re-fetch every row now.
    pub async fn refresh(&self) -> Result<(), StoreError> {
        self.shared.refresh().await
    }

    /// All rows, newest first.
    pub fn rows(&self) -> Vec<InventoryItem> {
        self.shared
            .state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .rows
            .clone()
    }

    /// Filtered and sorted view of the current rows.
    pub fn view(&self, filter: &ItemFilter, sort: ItemSort, now: DateTime<Utc>) -> Vec<InventoryItem> {
        let state = self.shared.state.read().unwrap_or_else(PoisonError::into_inner);
        let mut rows = filter.apply(&state.rows, now);
        drop(state);
        sort.sort(&mut rows);
        rows
    }

    pub fn get(&self, id: ItemId) -> Option<InventoryItem> {
        self.shared
            .state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .rows
            .iter()
            .find(|r| r.id == id)
            .cloned()
    }

    pub fn locations(&self) -> Vec<String> {
        let state = self.shared.state.read().unwrap_or_else(PoisonError::into_inner);
        labtrack_inventory::locations(&state.rows)
    }
}

impl Drop for LiveListing {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn follow(shared: Arc<Shared>, mut rx: broadcast::Receiver<ItemChange>, debounce: Duration) {
    loop {
        match rx.recv().await {
            Ok(change) => {
                shared.apply(&change);
                if !matches!(change, ItemChange::Deleted { .. }) {
                    let open = settle(&shared, &mut rx, debounce).await;
                    shared.refresh_logged().await;
                    if !open {
                        return;
                    }
                }
            }
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "listing fell behind the change feed; re-fetching");
                shared.refresh_logged().await;
            }
            Err(RecvError::Closed) => return,
        }
    }
}

/// Absorb further changes until `debounce` passes without an insert or update.
///
/// Returns `false` once the feed has closed.
async fn settle(
    shared: &Shared,
    rx: &mut broadcast::Receiver<ItemChange>,
    debounce: Duration,
) -> bool {
    let mut deadline = Instant::now() + debounce;
    loop {
        tokio::select! {
            _ = tokio::time::sleep_until(deadline) => return true,
            msg = rx.recv() => match msg {
                Ok(change) => {
                    shared.apply(&change);
                    if !matches!(change, ItemChange::Deleted { .. }) {
                        deadline = Instant::now() + debounce;
                    }
                }
                Err(RecvError::Lagged(_)) => {}
                Err(RecvError::Closed) => return false,
            },
        }
    }
}
