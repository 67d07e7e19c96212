use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Fallback recent/rare threshold when neither the hub nor a local
/// preference supplies one.
pub const DEFAULT_RARE_DAYS: i64 = 180;

/// Checklist item - the star of the show
///
/// `id` is assigned by the hub, never by the client. `counter` and
/// `last_updated` move together and only on an incomplete→complete
/// transition; unchecking an item clears neither.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Item {
    pub id: String,
    pub name: String,
    pub complete: bool,
    pub counter: u32,
    pub last_updated: Option<DateTime<Utc>>,
}

/// Descriptor for one remote list
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ListRef {
    pub id: String,
    pub name: String,
}

/// Fields of an item being changed. Unset fields are left untouched by
/// the hub (field-level last-writer-wins on its side).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemChange {
    pub name: Option<String>,
    pub complete: Option<bool>,
}

/// One full fetch result: the item snapshot plus the hub's threshold,
/// when it sends one.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemsSnapshot {
    pub items: Vec<Item>,
    pub rare_days: Option<i64>,
}

/// Canonical display form of an item name: first letter uppercase,
/// remainder lowercase. Applied before anything is sent to the hub or
/// compared against the store.
pub fn normalize_name(raw: &str) -> String {
    let trimmed = raw.trim();
    let mut chars = trimmed.chars();

    match chars.next() {
        Some(first) => format!("{}{}", first.to_uppercase(), chars.as_str().to_lowercase()),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_capitalizes_first_letter() {
        assert_eq!(normalize_name("milk"), "Milk");
        assert_eq!(normalize_name("MILK"), "Milk");
        assert_eq!(normalize_name("mIlK"), "Milk");
    }

    #[test]
    fn test_normalize_trims_whitespace() {
        assert_eq!(normalize_name("  latte Macchiato  "), "Latte macchiato");
    }

    #[test]
    fn test_normalize_empty_and_blank() {
        assert_eq!(normalize_name(""), "");
        assert_eq!(normalize_name("   "), "");
    }

    #[test]
    fn test_normalize_handles_accents() {
        assert_eq!(normalize_name("über"), "Über");
    }
}
