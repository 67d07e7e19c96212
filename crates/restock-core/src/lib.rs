// Core business logic lives here - the brain of the operation
pub mod classify;
pub mod error;
pub mod gateway;
pub mod models;
pub mod prefs;
pub mod providers;
pub mod store;
pub mod suggest;
pub mod sync;

pub use classify::{classify, Buckets};
pub use error::Error;
pub use gateway::ListGateway;
pub use models::{normalize_name, Item, ItemChange, ItemsSnapshot, ListRef, DEFAULT_RARE_DAYS};
pub use prefs::UiPrefs;
pub use suggest::{suggest, Badge, Suggestion};
pub use sync::{AddOutcome, SyncController};

/// Result type alias because typing Result<T, Error> everywhere is tedious
pub type Result<T> = std::result::Result<T, Error>;
