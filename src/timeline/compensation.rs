//! Scroll compensation around expand/collapse transitions.
//!
//! When the expanded cluster changes, the cluster that sits further left in
//! the strip changes width, and everything to its right (including whatever
//! the user is looking at) would shift sideways. The fix is a two-phase
//! measurement: decide which cluster to watch, read its rendered width
//! before the new state is applied, read it again once layout has settled,
//! and move the scroll position by exactly the difference, all within one
//! visual update.
//!
//! The decision table, for the watched cluster (the left one of the pair):
//! - it is expanding and the newly active cluster is the left one: content
//!   grows left of the anchor, scroll right by the growth;
//! - it is collapsing and the newly active cluster is the right one:
//!   content shrinks left of the anchor, scroll left by the shrinkage;
//! - anything else: no compensation.
//!
//! Measurements must come from the real rendered extent: cluster width
//! depends on item counts and aspect ratios, so cached sizes are never
//! trusted.

use tracing::debug;

use crate::timeline::index::TimelineIndex;
use crate::timeline::selection::{Transition, TransitionKind};

/// A pre-commit width capture for the watched cluster. Produced by
/// [`begin`], consumed by [`corrective_delta`] after layout settles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingMeasure {
    pub cluster: usize,
    pub pre_extent: f64,
}

/// Picks the cluster whose width change must be compensated for this
/// transition, or `None` when nothing (safely) can be.
pub fn watched_cluster(transition: &Transition, index: &TimelineIndex) -> Option<usize> {
    let (cluster_new, cluster_old) = match transition.kind {
        TransitionKind::Selection => (
            transition.current.selected_cluster(index),
            transition.previous.selected_cluster(index),
        ),
        TransitionKind::Focus => (
            transition.current.focused_cluster,
            transition.previous.focused_cluster,
        ),
        TransitionKind::Unclassified => {
            if transition.previous != transition.current {
                debug!("unclassifiable transition, skipping compensation");
            }
            return None;
        }
    };

    // Without both endpoints there is no before/after pair to reason about.
    let (cluster_new, cluster_old) = (cluster_new?, cluster_old?);
    if cluster_new == cluster_old {
        return None;
    }

    let watched = cluster_new.min(cluster_old);
    let was_expanded = transition.previous.is_expanded(watched, index);
    let now_expanded = transition.current.is_expanded(watched, index);

    should_compensate(was_expanded, now_expanded, cluster_new, cluster_old).then_some(watched)
}

/// The raw decision: given the watched cluster's expand flip and the
/// relative order of the newly and previously active clusters, does the
/// flip displace content at or after the anchor?
pub fn should_compensate(
    was_expanded: bool,
    now_expanded: bool,
    cluster_new: usize,
    cluster_old: usize,
) -> bool {
    if was_expanded == now_expanded {
        return false;
    }
    if now_expanded {
        // Expanding: only matters when growth happens left of the anchor.
        cluster_new < cluster_old
    } else {
        // Collapsing: only matters when shrinkage happens left of the anchor.
        cluster_new > cluster_old
    }
}

/// First phase: record the watched cluster's rendered extent before the
/// layout-affecting state commits.
pub fn begin(cluster: usize, pre_extent: f64) -> PendingMeasure {
    PendingMeasure {
        cluster,
        pre_extent,
    }
}

/// Second phase: after layout settles, the corrective scroll offset is
/// exactly the measured growth (positive) or shrinkage (negative).
pub fn corrective_delta(pending: PendingMeasure, post_extent: f64) -> f64 {
    post_extent - pending.pre_extent
}

/// When to center the newly selected item, relative to compensation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CenterTiming {
    /// Center in this settle pass (after any corrective scroll).
    Immediate,
    /// Defer one settle pass, so a pending compensation lands first and the
    /// view does not jump twice.
    Deferred,
    /// Selection did not change (or nothing is selected): leave the scroll
    /// position alone.
    NotNeeded,
}

/// Centering decision for a processed transition. Re-selection within one
/// cluster centers right away, as does a cross-cluster move whose
/// compensation already ran this pass; an uncompensated cross-cluster move
/// waits one pass.
pub fn centering(transition: &Transition, compensated: bool) -> CenterTiming {
    if !transition.selection_changed || transition.current.selected.is_none() {
        return CenterTiming::NotNeeded;
    }
    if !transition.selected_cluster_changed || compensated {
        CenterTiming::Immediate
    } else {
        CenterTiming::Deferred
    }
}

/// The deferred-centering register. A newer selection supersedes a pending
/// request rather than queuing behind it: the flag is single-slot and the
/// eventual centering always targets the current selection.
#[derive(Debug, Default)]
pub struct DeferredCenter {
    pending: bool,
}

impl DeferredCenter {
    pub fn set(&mut self) {
        self.pending = true;
    }

    pub fn take(&mut self) -> bool {
        std::mem::take(&mut self.pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MediaItem, MediaKind};
    use crate::timeline::clusterer::cluster_items;
    use crate::timeline::filter::TagFilter;
    use crate::timeline::selection::SelectionState;
    use std::collections::BTreeSet;

    fn make_item(index: usize, timestamp_ms: i64) -> MediaItem {
        MediaItem {
            index,
            timestamp_ms,
            identity: format!("{index}.jpg"),
            kind: MediaKind::Image,
            width: 1600,
            height: 1200,
            tags: BTreeSet::new(),
        }
    }

    /// Three clusters: {0.jpg, 1.jpg}, {2.jpg}, {3.jpg, 4.jpg}.
    fn sample_index() -> TimelineIndex {
        let items: Vec<MediaItem> = [0, 1000, 4_000_000, 8_000_000, 8_000_500]
            .iter()
            .enumerate()
            .map(|(i, &ts)| make_item(i, ts))
            .collect();
        TimelineIndex::build(&cluster_items(&items, &TagFilter::default()))
    }

    #[test]
    fn test_decision_table() {
        // Expanding on the left of the anchor: compensate.
        assert!(should_compensate(false, true, 0, 2));
        // Collapsing on the left of the anchor: compensate.
        assert!(should_compensate(true, false, 2, 0));
        // Expanding on the right: the anchor is unaffected.
        assert!(!should_compensate(false, true, 2, 0));
        // Collapsing on the right: likewise.
        assert!(!should_compensate(true, false, 0, 2));
        // No flip at all.
        assert!(!should_compensate(true, true, 0, 2));
        assert!(!should_compensate(false, false, 2, 0));
    }

    #[test]
    fn test_select_away_from_expanded_left_cluster_compensates() {
        // Cluster 0 is expanded (selection + focus coincide there); selecting
        // an item in cluster 2 collapses it on the left of the new anchor.
        let index = sample_index();
        let mut state = SelectionState::new(Some("0.jpg".into()));
        state.focus_item("1.jpg", &index);

        let transition = state.select(Some("3.jpg"), &index);
        let watched = watched_cluster(&transition, &index);
        assert_eq!(watched, Some(0));

        let pending = begin(0, 200.0);
        assert_eq!(corrective_delta(pending, 80.0), -120.0);
    }

    #[test]
    fn test_focus_move_right_collapses_left_cluster() {
        let index = sample_index();
        let mut state = SelectionState::new(None);
        state.focus_item("0.jpg", &index);

        let transition = state.focus_item("3.jpg", &index).unwrap();
        assert_eq!(watched_cluster(&transition, &index), Some(0));
    }

    #[test]
    fn test_select_toward_left_cluster_compensates_its_growth() {
        let index = sample_index();
        let mut state = SelectionState::new(Some("3.jpg".into()));

        let transition = state.select(Some("0.jpg"), &index);
        // Cluster 0 expands and sits left of the old anchor.
        assert_eq!(watched_cluster(&transition, &index), Some(0));

        let pending = begin(0, 24.0);
        assert_eq!(corrective_delta(pending, 310.0), 286.0);
    }

    #[test]
    fn test_no_prior_selection_no_compensation() {
        let index = sample_index();
        let mut state = SelectionState::new(None);
        let transition = state.select(Some("3.jpg"), &index);
        assert_eq!(watched_cluster(&transition, &index), None);
    }

    #[test]
    fn test_focus_into_already_expanded_cluster_no_compensation() {
        // Cluster 0 stays expanded through the move (selection holds it
        // open), so the watched cluster never flips.
        let index = sample_index();
        let mut state = SelectionState::new(Some("0.jpg".into()));
        state.focus_item("3.jpg", &index);

        let transition = state.focus_item("0.jpg", &index).unwrap();
        assert_eq!(watched_cluster(&transition, &index), None);
    }

    #[test]
    fn test_same_cluster_reselect_no_compensation() {
        let index = sample_index();
        let mut state = SelectionState::new(Some("3.jpg".into()));
        let transition = state.select(Some("4.jpg"), &index);
        assert_eq!(watched_cluster(&transition, &index), None);
    }

    #[test]
    fn test_centering_same_cluster_is_immediate() {
        let index = sample_index();
        let mut state = SelectionState::new(Some("3.jpg".into()));
        let transition = state.select(Some("4.jpg"), &index);
        assert_eq!(centering(&transition, false), CenterTiming::Immediate);
    }

    #[test]
    fn test_centering_with_compensation_is_immediate() {
        let index = sample_index();
        let mut state = SelectionState::new(Some("0.jpg".into()));
        let transition = state.select(Some("3.jpg"), &index);
        assert!(watched_cluster(&transition, &index).is_some());
        assert_eq!(centering(&transition, true), CenterTiming::Immediate);
    }

    #[test]
    fn test_centering_uncompensated_cross_cluster_defers() {
        let index = sample_index();
        let mut state = SelectionState::new(None);
        let transition = state.select(Some("3.jpg"), &index);
        assert_eq!(centering(&transition, false), CenterTiming::Deferred);
    }

    #[test]
    fn test_centering_not_needed_without_selection_change() {
        let index = sample_index();
        let mut state = SelectionState::new(Some("0.jpg".into()));
        let transition = state.focus_item("3.jpg", &index).unwrap();
        assert_eq!(centering(&transition, false), CenterTiming::NotNeeded);

        let cleared = state.select(None, &index);
        assert_eq!(centering(&cleared, false), CenterTiming::NotNeeded);
    }

    #[test]
    fn test_deferred_center_is_single_slot() {
        let mut deferred = DeferredCenter::default();
        assert!(!deferred.take());
        deferred.set();
        deferred.set();
        assert!(deferred.take());
        assert!(!deferred.take());
    }
}
