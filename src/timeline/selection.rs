//! Selection and focus state for the timeline.
//!
//! A cluster renders expanded when it holds the selected item or when input
//! focus sits inside it. Selection is externally driven (the router hands
//! the current identity in); focus is internally driven by focus-in events
//! and is only ever superseded, either by the next focus-in or by a
//! selection landing in a different cluster. The state keeps a one-step
//! history so each change can be classified and, when needed, compensated.

use crate::timeline::index::TimelineIndex;

/// A point-in-time view of (selected identity, focused cluster).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSnapshot {
    pub selected: Option<String>,
    pub focused_cluster: Option<usize>,
}

impl SelectionSnapshot {
    /// Cluster the selected identity lives in. A stale identity (removed by
    /// a filter change) resolves to `None`, degrading to "nothing selected".
    pub fn selected_cluster(&self, index: &TimelineIndex) -> Option<usize> {
        self.selected
            .as_deref()
            .and_then(|identity| index.cluster_of(identity))
    }

    /// The expand predicate: a cluster is expanded when it is the selected
    /// item's cluster or the focused cluster (possibly both).
    pub fn is_expanded(&self, cluster: usize, index: &TimelineIndex) -> bool {
        self.selected_cluster(index) == Some(cluster) || self.focused_cluster == Some(cluster)
    }
}

/// What drove a state change, judged on cluster-level effects: a change of
/// the selected cluster wins over a change of the focused cluster; anything
/// else is unclassified and treated as not compensable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionKind {
    Selection,
    Focus,
    Unclassified,
}

/// One processed state change, with the snapshots on both sides.
#[derive(Debug, Clone)]
pub struct Transition {
    pub kind: TransitionKind,
    pub previous: SelectionSnapshot,
    pub current: SelectionSnapshot,
    /// The selected identity itself changed (even within one cluster).
    pub selection_changed: bool,
    /// The selected identity's cluster changed.
    pub selected_cluster_changed: bool,
}

#[derive(Debug, Default)]
pub struct SelectionState {
    current: SelectionSnapshot,
    /// One-step history, retained until the next transition is processed.
    previous: SelectionSnapshot,
}

impl SelectionState {
    pub fn new(selected: Option<String>) -> Self {
        let snapshot = SelectionSnapshot {
            selected,
            focused_cluster: None,
        };
        Self {
            current: snapshot.clone(),
            previous: snapshot,
        }
    }

    pub fn snapshot(&self) -> &SelectionSnapshot {
        &self.current
    }

    pub fn selected(&self) -> Option<&str> {
        self.current.selected.as_deref()
    }

    pub fn focused_cluster(&self) -> Option<usize> {
        self.current.focused_cluster
    }

    pub fn is_cluster_expanded(&self, cluster: usize, index: &TimelineIndex) -> bool {
        self.current.is_expanded(cluster, index)
    }

    pub fn is_item_selected(&self, cluster: usize, position: usize, index: &TimelineIndex) -> bool {
        self.current
            .selected
            .as_deref()
            .and_then(|identity| index.lookup(identity))
            == Some((cluster, position))
    }

    /// External selection change. Clears focus when the new selection lands
    /// in a different cluster than the focused one, so at most one cluster
    /// is expanded per driver.
    pub fn select(&mut self, identity: Option<&str>, index: &TimelineIndex) -> Transition {
        let previous = self.current.clone();

        self.current.selected = identity.map(str::to_owned);
        let new_cluster = self.current.selected_cluster(index);
        if let (Some(focused), Some(selected)) = (self.current.focused_cluster, new_cluster) {
            if focused != selected {
                self.current.focused_cluster = None;
            }
        }

        self.finish_transition(previous, index)
    }

    /// Focus-in on an item. Only a move into a *different* cluster is a
    /// transition; focus settling within the focused cluster is a no-op.
    /// Unknown identities (stale widgets mid-rebuild) are ignored.
    pub fn focus_item(&mut self, identity: &str, index: &TimelineIndex) -> Option<Transition> {
        let cluster = index.cluster_of(identity)?;
        if self.current.focused_cluster == Some(cluster) {
            return None;
        }

        let previous = self.current.clone();
        self.current.focused_cluster = Some(cluster);
        Some(self.finish_transition(previous, index))
    }

    /// Called when clusters were recomputed: cluster indices from the old
    /// layout are meaningless, so focus and history are dropped while the
    /// selected identity is kept (it degrades on its own if filtered out).
    pub fn on_clusters_rebuilt(&mut self) {
        self.current.focused_cluster = None;
        self.previous = self.current.clone();
    }

    fn finish_transition(&mut self, previous: SelectionSnapshot, index: &TimelineIndex) -> Transition {
        let current = self.current.clone();

        let prev_cluster = previous.selected_cluster(index);
        let new_cluster = current.selected_cluster(index);
        let selected_cluster_changed = prev_cluster != new_cluster;
        let focus_changed = previous.focused_cluster != current.focused_cluster;

        let kind = if selected_cluster_changed {
            TransitionKind::Selection
        } else if focus_changed {
            TransitionKind::Focus
        } else {
            TransitionKind::Unclassified
        };

        let transition = Transition {
            kind,
            selection_changed: previous.selected != current.selected,
            selected_cluster_changed,
            previous: previous.clone(),
            current,
        };

        self.previous = previous;
        transition
    }
}
