use chrono::{DateTime, Utc};

use crate::classify::within_threshold;
use crate::models::Item;

/// Queries shorter than this yield no suggestions at all. Single
/// characters match half the list and help nobody.
pub const MIN_QUERY_CHARS: usize = 2;

/// Status badge shown next to a suggestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Badge {
    /// Item is on the list and still needed
    ToBuy,
    /// Bought within the threshold
    Recent,
    /// Bought past the threshold (or at an unknown time)
    Rare,
}

impl Badge {
    pub fn label(&self) -> &'static str {
        match self {
            Badge::ToBuy => "DA COMPRARE",
            Badge::Recent => "RECENTE",
            Badge::Rare => "RARO",
        }
    }
}

impl std::fmt::Display for Badge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.label())
    }
}

/// One search hit with its status badge.
#[derive(Debug, Clone, PartialEq)]
pub struct Suggestion {
    pub item: Item,
    pub badge: Badge,
}

/// Case-insensitive substring search over item names.
///
/// Hits come back in store order - stable output for identical input,
/// no relevance re-ranking. The badge uses the same recency comparison
/// as the classifier so the dropdown and the sections never disagree.
pub fn suggest(
    items: &[Item],
    query: &str,
    threshold_days: i64,
    now: DateTime<Utc>,
) -> Vec<Suggestion> {
    let needle = query.trim().to_lowercase();
    if needle.chars().count() < MIN_QUERY_CHARS {
        return Vec::new();
    }

    items
        .iter()
        .filter(|item| item.name.to_lowercase().contains(&needle))
        .map(|item| {
            let badge = if !item.complete {
                Badge::ToBuy
            } else if within_threshold(item.last_updated, threshold_days, now) {
                Badge::Recent
            } else {
                Badge::Rare
            };

            Suggestion {
                item: item.clone(),
                badge,
            }
        })
        .collect()
}
