//! Inventory domain module.
//!
//! Business rules for laboratory stock rows, implemented purely as
//! deterministic domain logic (no IO, no HTTP, no storage): form validation,
//! expiry classification, and the in-memory filter/sort derivation used by the
//! listing view.

pub mod expiry;
pub mod filter;
pub mod item;

pub use expiry::{ExpiryBadge, ExpiryFilter, days_until_expiry, expiry_instant};
pub use filter::{ItemFilter, ItemSort, SortKey, SortOrder, locations};
pub use item::{InventoryItem, ItemDraft, ItemForm};
