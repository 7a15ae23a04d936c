//! Gap-threshold clustering of the chronological item sequence.
//!
//! A single left-to-right pass over items already sorted by timestamp:
//! items failing the tag predicate are skipped, and a new cluster opens
//! whenever the gap to the last *surviving* item exceeds one hour. Gaps are
//! therefore measured on the filtered sequence, not the raw one: filtering
//! items out can merge clusters that were only separated by the excluded
//! items, which is the intended reading of a filtered timeline.

use crate::models::{Cluster, MediaItem};
use crate::timeline::filter::TagFilter;

/// Maximum timestamp delta, in milliseconds, between consecutive items of
/// one cluster (one hour).
pub const GAP_THRESHOLD_MS: i64 = 3_600_000;

/// Groups `items` (sorted by ascending timestamp) into clusters.
///
/// Deterministic and O(n) in the number of surviving items. Empty input,
/// or input where every item is filtered out, yields an empty cluster list.
pub fn cluster_items(items: &[MediaItem], filter: &TagFilter) -> Vec<Cluster> {
    let mut result = Vec::new();
    let mut open: Option<Cluster> = None;
    let mut last_ms = i64::MIN;

    for item in items {
        if !filter.matches(item) {
            continue;
        }

        let starts_new = match open {
            None => true,
            Some(_) => item.timestamp_ms - last_ms > GAP_THRESHOLD_MS,
        };

        if starts_new {
            if let Some(done) = open.take() {
                result.push(done);
            }
            open = Some(Cluster::new(item.clone()));
        } else if let Some(cluster) = open.as_mut() {
            cluster.push(item.clone());
        }

        last_ms = item.timestamp_ms;
    }

    if let Some(done) = open {
        result.push(done);
    }

    result
}
