//! Derived lookup structures over the cluster set.
//!
//! `TimelineIndex` bundles the reverse lookup (identity → cluster/position),
//! the flat chronological sequence used for step navigation, and the
//! identity → flat-position map. All three are produced by one constructor
//! from one cluster set, so a caller can never observe views that disagree
//! with each other. The index is rebuilt from scratch whenever clusters are
//! recomputed; it is never patched in place.

use std::collections::HashMap;

use crate::models::Cluster;

/// One entry of the flat sequence: an identity plus its chronological rank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatEntry {
    pub identity: String,
    pub index: usize,
}

#[derive(Debug, Default)]
pub struct TimelineIndex {
    reverse: HashMap<String, (usize, usize)>,
    flat: Vec<FlatEntry>,
    flat_pos: HashMap<String, usize>,
}

impl TimelineIndex {
    pub fn build(clusters: &[Cluster]) -> Self {
        let total: usize = clusters.iter().map(|c| c.len()).sum();
        let mut reverse = HashMap::with_capacity(total);
        let mut flat = Vec::with_capacity(total);

        for (cluster_idx, cluster) in clusters.iter().enumerate() {
            for (item_idx, item) in cluster.items.iter().enumerate() {
                reverse.insert(item.identity.clone(), (cluster_idx, item_idx));
                flat.push(FlatEntry {
                    identity: item.identity.clone(),
                    index: item.index,
                });
            }
        }

        flat.sort_by_key(|entry| entry.index);

        let flat_pos = flat
            .iter()
            .enumerate()
            .map(|(pos, entry)| (entry.identity.clone(), pos))
            .collect();

        Self {
            reverse,
            flat,
            flat_pos,
        }
    }

    /// (clusterIndex, indexWithinCluster) for an identity, if present.
    pub fn lookup(&self, identity: &str) -> Option<(usize, usize)> {
        self.reverse.get(identity).copied()
    }

    /// Cluster index an identity lives in, if present.
    pub fn cluster_of(&self, identity: &str) -> Option<usize> {
        self.lookup(identity).map(|(cluster, _)| cluster)
    }

    pub fn flat(&self) -> &[FlatEntry] {
        &self.flat
    }

    /// Position of an identity in the flat sequence, if present.
    pub fn flat_position(&self, identity: &str) -> Option<usize> {
        self.flat_pos.get(identity).copied()
    }

    pub fn identity_at(&self, position: usize) -> Option<&str> {
        self.flat.get(position).map(|entry| entry.identity.as_str())
    }

    pub fn len(&self) -> usize {
        self.flat.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flat.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MediaItem, MediaKind};
    use crate::timeline::clusterer::cluster_items;
    use crate::timeline::filter::TagFilter;
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

    fn sample_clusters() -> Vec<Cluster> {
        let items: Vec<MediaItem> = [0, 1000, 4_000_000, 4_000_500, 9_000_000]
            .iter()
            .enumerate()
            .map(|(i, &ts)| make_item(i, ts))
            .collect();
        cluster_items(&items, &TagFilter::default())
    }

    #[test]
    fn test_empty_clusters() {
        let index = TimelineIndex::build(&[]);
        assert!(index.is_empty());
        assert_eq!(index.lookup("0.jpg"), None);
        assert_eq!(index.flat_position("0.jpg"), None);
        assert_eq!(index.identity_at(0), None);
    }

    #[test]
    fn test_reverse_matches_every_position() {
        let clusters = sample_clusters();
        let index = TimelineIndex::build(&clusters);

        let mut seen = 0;
        for (ci, cluster) in clusters.iter().enumerate() {
            for (ii, item) in cluster.items.iter().enumerate() {
                assert_eq!(index.lookup(&item.identity), Some((ci, ii)));
                seen += 1;
            }
        }
        assert_eq!(index.len(), seen);
    }

    #[test]
    fn test_flat_strictly_increasing() {
        let clusters = sample_clusters();
        let index = TimelineIndex::build(&clusters);
        for pair in index.flat().windows(2) {
            assert!(pair[0].index < pair[1].index);
        }
    }

    #[test]
    fn test_flat_pos_agrees_with_flat() {
        let clusters = sample_clusters();
        let index = TimelineIndex::build(&clusters);
        for (pos, entry) in index.flat().iter().enumerate() {
            assert_eq!(index.flat_position(&entry.identity), Some(pos));
            assert_eq!(index.identity_at(pos), Some(entry.identity.as_str()));
        }
    }

    #[test]
    fn test_unknown_identity_degrades_to_none() {
        let index = TimelineIndex::build(&sample_clusters());
        assert_eq!(index.lookup("gone.jpg"), None);
        assert_eq!(index.cluster_of("gone.jpg"), None);
        assert_eq!(index.flat_position("gone.jpg"), None);
    }
}
