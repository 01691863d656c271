//! Infrastructure layer: config, storage, change feed, exports, external services.

pub mod changes;
pub mod config;
pub mod export;
pub mod external;
pub mod listing;
pub mod prediction;
pub mod store;

pub use changes::{ChangeFeed, ItemChange};
pub use config::{Config, ConfigError, PredictionBackend};
pub use export::{ExportError, ExportFormat, ExportRow};
pub use listing::LiveListing;
pub use prediction::{ExpiryPredictor, GeminiPredictor, HeuristicPredictor, predictor_from_config};
pub use store::{InMemoryItemStore, ItemStore, PostgresItemStore, StoreError};
