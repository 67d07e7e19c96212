use std::collections::HashMap;
use std::sync::Mutex;

use crate::{KeyValueStore, Result};

/// In-memory preference store for tests and `--memory-prefs` runs.
#[derive(Debug, Default)]
pub struct MemoryPrefs {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryPrefs {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryPrefs {
    fn get(&self, key: &str) -> Option<String> {
        self.values
            .lock()
            .expect("prefs lock poisoned")
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.values
            .lock()
            .expect("prefs lock poisoned")
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}
