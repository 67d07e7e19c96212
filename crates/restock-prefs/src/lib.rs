// Persisted UI preference storage - tiny key-value layer
pub mod memory;
pub mod sqlite;

pub use memory::MemoryPrefs;
pub use sqlite::SqlitePrefs;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PrefsError {
    #[error("preference storage failed: {0}")]
    Storage(#[from] rusqlite::Error),
}

pub type Result<T> = std::result::Result<T, PrefsError>;

/// Key-value provider the engine reads UI preferences through.
///
/// The engine never touches storage directly; it gets one of these
/// injected, which keeps unit tests fully deterministic with the
/// in-memory implementation.
///
/// `get` is deliberately infallible: an unreadable value and a missing
/// value are the same thing to the caller, which falls back to defaults
/// either way.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
}
