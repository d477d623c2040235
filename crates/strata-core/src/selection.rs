//! Diversity-capped selection over the queue.
//!
//! All functions are pure: they take a snapshot of queue rows and return a
//! decision. Persisting the decision (moving rows to `selected`) is the
//! caller's job, so a balanced selection can be previewed without side
//! effects.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use crate::entities::QueueItem;
use crate::enums::QueueStatus;
use crate::responses::{SelectableItem, SourceDistribution};

/// Maximum picks per source in one run: `ceil(max_items * fraction)`.
///
/// Never zero while `max_items > 0`, so a tiny fraction still admits one
/// item per source.
#[must_use]
pub fn source_cap(max_items: usize, cap_fraction: f64) -> usize {
    if max_items == 0 {
        return 0;
    }
    let fraction = if cap_fraction.is_finite() {
        cap_fraction.clamp(0.0, 1.0)
    } else {
        1.0
    };
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    let cap = (max_items as f64 * fraction).ceil() as usize;
    cap.clamp(1, max_items)
}

/// Selection priority: higher `total_score` first, then earlier `queued_at`,
/// then ID so the order is total.
#[must_use]
pub fn priority_order(a: &QueueItem, b: &QueueItem) -> Ordering {
    b.total_score
        .total_cmp(&a.total_score)
        .then_with(|| a.queued_at.cmp(&b.queued_at))
        .then_with(|| a.id.cmp(&b.id))
}

/// Greedy top-k selection with a per-source cap.
///
/// Pending items are visited in [`priority_order`]; an item is taken unless
/// its source already has `source_cap(max_items, cap_fraction)` picks in this
/// run. Items passed over stay untouched (still pending). Stops at
/// `max_items` or when the pool runs out. Non-pending rows are ignored.
#[must_use]
pub fn balanced_selection(
    items: &[QueueItem],
    max_items: usize,
    cap_fraction: f64,
) -> Vec<QueueItem> {
    let cap = source_cap(max_items, cap_fraction);
    let mut pool: Vec<&QueueItem> = items
        .iter()
        .filter(|item| item.status == QueueStatus::Pending)
        .collect();
    pool.sort_by(|a, b| priority_order(a, b));

    let mut per_source: HashMap<&str, usize> = HashMap::new();
    let mut picked = Vec::with_capacity(max_items.min(pool.len()));

    for item in pool {
        if picked.len() >= max_items {
            break;
        }
        let taken = per_source.entry(item.source_identifier.as_str()).or_insert(0);
        if *taken >= cap {
            continue;
        }
        *taken += 1;
        picked.push(item.clone());
    }
    picked
}

/// Aggregate the queue by source, largest sources first.
#[must_use]
pub fn source_distribution(items: &[QueueItem]) -> Vec<SourceDistribution> {
    let mut by_source: BTreeMap<&str, SourceDistribution> = BTreeMap::new();
    for item in items {
        let entry = by_source
            .entry(item.source_identifier.as_str())
            .or_insert_with(|| SourceDistribution {
                source_identifier: item.source_identifier.clone(),
                item_count: 0,
                pending_count: 0,
                selected_count: 0,
                used_count: 0,
                pct_of_total: 0.0,
            });
        entry.item_count += 1;
        match item.status {
            QueueStatus::Pending => entry.pending_count += 1,
            QueueStatus::Selected => entry.selected_count += 1,
            QueueStatus::Used => entry.used_count += 1,
            QueueStatus::Expired | QueueStatus::Skipped => {}
        }
    }

    let total = items.len();
    let mut rows: Vec<SourceDistribution> = by_source
        .into_values()
        .map(|mut row| {
            row.pct_of_total = percentage(row.item_count, total);
            row
        })
        .collect();
    rows.sort_by(|a, b| {
        b.item_count
            .cmp(&a.item_count)
            .then_with(|| a.source_identifier.cmp(&b.source_identifier))
    });
    rows
}

#[allow(clippy::cast_precision_loss)]
fn percentage(count: u64, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let pct = count as f64 * 100.0 / total as f64;
    (pct * 100.0).round() / 100.0
}

/// Annotate every pending item with how many items its source already has
/// committed (selected or used) and whether that is under `source_quota`.
#[must_use]
pub fn selectable_items(items: &[QueueItem], source_quota: u64) -> Vec<SelectableItem> {
    let mut committed: HashMap<&str, u64> = HashMap::new();
    for item in items.iter().filter(|item| item.status.is_committed()) {
        *committed.entry(item.source_identifier.as_str()).or_insert(0) += 1;
    }

    let mut pending: Vec<&QueueItem> = items
        .iter()
        .filter(|item| item.status == QueueStatus::Pending)
        .collect();
    pending.sort_by(|a, b| priority_order(a, b));

    pending
        .into_iter()
        .map(|item| {
            let source_committed_count = committed
                .get(item.source_identifier.as_str())
                .copied()
                .unwrap_or(0);
            SelectableItem {
                item: item.clone(),
                source_committed_count,
                within_source_limit: source_committed_count < source_quota,
            }
        })
        .collect()
}
