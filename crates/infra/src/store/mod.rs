//! Item storage: the single seam between handlers and the backing database.

pub mod in_memory;
pub mod postgres;
pub mod r#trait;

pub use in_memory::InMemoryItemStore;
pub use postgres::PostgresItemStore;
pub use r#trait::{ItemStore, StoreError};
