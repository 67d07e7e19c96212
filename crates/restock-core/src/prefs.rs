use serde::{Deserialize, Serialize};
use tracing::debug;

use restock_prefs::KeyValueStore;

use crate::models::DEFAULT_RARE_DAYS;

/// Storage key for the section-visibility flags.
pub const SECTIONS_KEY: &str = "restock.sections";
/// Storage key for the optional local recent/rare threshold override.
pub const RARE_DAYS_KEY: &str = "restock.rare_days";

/// Which display sections start expanded.
///
/// Purely a display preference: not part of item identity and never sent
/// to the hub. Fields default individually so a value written by an
/// older build that lacked one of them still loads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionVisibility {
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default = "default_true")]
    pub recent: bool,
    #[serde(default)]
    pub rare: bool,
}

fn default_true() -> bool {
    true
}

impl Default for SectionVisibility {
    fn default() -> Self {
        Self {
            active: true,
            recent: true,
            rare: false,
        }
    }
}

/// Persisted UI preferences, merged with defaults.
///
/// Two independent keys. A stored value wins for its key; a missing or
/// malformed value silently falls back to the default for that key, so
/// a corrupted prefs database never surfaces as an error.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UiPrefs {
    pub sections: SectionVisibility,
    /// Locally overridden threshold, if the user ever set one. The hub's
    /// value still wins once a fetch supplies it.
    pub rare_days_override: Option<i64>,
}

impl UiPrefs {
    /// Read both keys once and merge with defaults.
    pub fn load(store: &dyn KeyValueStore) -> Self {
        let sections = match store.get(SECTIONS_KEY) {
            Some(raw) => match serde_json::from_str(&raw) {
                Ok(sections) => sections,
                Err(err) => {
                    debug!("stored section visibility unreadable ({}), using defaults", err);
                    SectionVisibility::default()
                }
            },
            None => SectionVisibility::default(),
        };

        let rare_days_override = store.get(RARE_DAYS_KEY).and_then(|raw| {
            match raw.trim().parse::<i64>() {
                Ok(days) if days > 0 => Some(days),
                Ok(days) => {
                    debug!("stored threshold {} is not positive, ignoring", days);
                    None
                }
                Err(err) => {
                    debug!("stored threshold unreadable ({}), ignoring", err);
                    None
                }
            }
        });

        Self {
            sections,
            rare_days_override,
        }
    }

    /// Threshold to seed the engine with before the first fetch.
    pub fn initial_rare_days(&self) -> i64 {
        self.rare_days_override.unwrap_or(DEFAULT_RARE_DAYS)
    }

    pub fn save_sections(
        store: &dyn KeyValueStore,
        sections: &SectionVisibility,
    ) -> restock_prefs::Result<()> {
        let raw = serde_json::to_string(sections).expect("section flags serialize");
        store.set(SECTIONS_KEY, &raw)
    }

    pub fn save_rare_days(store: &dyn KeyValueStore, days: i64) -> restock_prefs::Result<()> {
        store.set(RARE_DAYS_KEY, &days.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use restock_prefs::MemoryPrefs;

    #[test]
    fn test_empty_store_yields_defaults() {
        let store = MemoryPrefs::new();
        let prefs = UiPrefs::load(&store);

        assert_eq!(prefs.sections, SectionVisibility::default());
        assert!(prefs.sections.active);
        assert!(prefs.sections.recent);
        assert!(!prefs.sections.rare);
        assert!(prefs.rare_days_override.is_none());
        assert_eq!(prefs.initial_rare_days(), DEFAULT_RARE_DAYS);
    }

    #[test]
    fn test_stored_values_win_per_key() {
        let store = MemoryPrefs::new();
        store
            .set(
                SECTIONS_KEY,
                r#"{"active":false,"recent":true,"rare":true}"#,
            )
            .unwrap();

        let prefs = UiPrefs::load(&store);
        assert!(!prefs.sections.active);
        assert!(prefs.sections.rare);
        // The other key stays at its default
        assert!(prefs.rare_days_override.is_none());
    }

    #[test]
    fn test_partial_sections_merge_field_defaults() {
        let store = MemoryPrefs::new();
        store.set(SECTIONS_KEY, r#"{"rare":true}"#).unwrap();

        let prefs = UiPrefs::load(&store);
        assert!(prefs.sections.active);
        assert!(prefs.sections.recent);
        assert!(prefs.sections.rare);
    }

    #[test]
    fn test_malformed_sections_fall_back_silently() {
        let store = MemoryPrefs::new();
        store.set(SECTIONS_KEY, "{not json").unwrap();

        let prefs = UiPrefs::load(&store);
        assert_eq!(prefs.sections, SectionVisibility::default());
    }

    #[test]
    fn test_threshold_override_parses() {
        let store = MemoryPrefs::new();
        store.set(RARE_DAYS_KEY, "90").unwrap();

        let prefs = UiPrefs::load(&store);
        assert_eq!(prefs.rare_days_override, Some(90));
        assert_eq!(prefs.initial_rare_days(), 90);
    }

    #[test]
    fn test_bad_threshold_values_are_ignored() {
        let store = MemoryPrefs::new();

        for bad in ["banana", "-3", "0", ""] {
            store.set(RARE_DAYS_KEY, bad).unwrap();
            let prefs = UiPrefs::load(&store);
            assert!(prefs.rare_days_override.is_none(), "accepted {:?}", bad);
        }
    }

    #[test]
    fn test_save_round_trips() {
        let store = MemoryPrefs::new();
        let sections = SectionVisibility {
            active: false,
            recent: true,
            rare: true,
        };

        UiPrefs::save_sections(&store, &sections).unwrap();
        UiPrefs::save_rare_days(&store, 365).unwrap();

        let prefs = UiPrefs::load(&store);
        assert_eq!(prefs.sections, sections);
        assert_eq!(prefs.rare_days_override, Some(365));
    }
}
