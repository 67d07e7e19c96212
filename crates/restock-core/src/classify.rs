use chrono::{DateTime, Duration, Utc};

use crate::models::Item;

/// The three display buckets, each already in display order.
///
/// Buckets are pairwise disjoint and together cover the classified
/// input exactly. A bucket with no members is still present, just
/// empty - consumers decide whether to render it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Buckets {
    /// Still needed, longest-unattended first
    pub active: Vec<Item>,
    /// Bought within the threshold, most frequently bought first
    pub recent: Vec<Item>,
    /// Bought long ago (or at an unknown time), most frequently bought first
    pub rare: Vec<Item>,
}

/// Whether a completion stamp falls within `threshold_days` of `now`.
///
/// The comparison is `<=` on the actual time difference, so an item
/// completed exactly on the boundary still counts as recent, and a
/// non-positive threshold degenerates cleanly instead of erroring. A
/// missing stamp is never within the threshold.
pub fn within_threshold(
    last_updated: Option<DateTime<Utc>>,
    threshold_days: i64,
    now: DateTime<Utc>,
) -> bool {
    match last_updated {
        Some(stamp) => stamp >= now - Duration::days(threshold_days),
        None => false,
    }
}

/// Partition items into display buckets against a threshold.
///
/// Pure and deterministic: same input, same output, input untouched.
///
/// - active: not complete; ascending `last_updated` with missing stamps
///   sorting first (the longest-unattended needs surface at the top)
/// - recent: complete with a stamp within the threshold
/// - rare: complete with a stamp past the threshold, or complete with no
///   stamp at all ("bought so long ago nobody remembers when")
///
/// recent and rare order by descending `counter`, ties broken by the
/// most recent `last_updated`.
pub fn classify(items: &[Item], threshold_days: i64, now: DateTime<Utc>) -> Buckets {
    let mut buckets = Buckets::default();

    for item in items {
        if !item.complete {
            buckets.active.push(item.clone());
        } else if within_threshold(item.last_updated, threshold_days, now) {
            buckets.recent.push(item.clone());
        } else {
            buckets.rare.push(item.clone());
        }
    }

    fn stamp_or_epoch(item: &Item) -> DateTime<Utc> {
        item.last_updated.unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
    }

    fn bought_order(a: &Item, b: &Item) -> std::cmp::Ordering {
        b.counter
            .cmp(&a.counter)
            .then_with(|| stamp_or_epoch(b).cmp(&stamp_or_epoch(a)))
    }

    buckets.active.sort_by_key(stamp_or_epoch);
    buckets.recent.sort_by(bought_order);
    buckets.rare.sort_by(bought_order);

    buckets
}
