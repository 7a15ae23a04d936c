use crate::models::MediaItem;

/// A contiguous run of chronologically ordered items with no internal gap
/// exceeding the clustering threshold.
///
/// Invariants upheld by the clusterer: `items` is non-empty and ordered by
/// ascending `index`; `timestamp_ms` is the timestamp of the first item.
#[derive(Debug, Clone)]
pub struct Cluster {
    pub timestamp_ms: i64,
    pub items: Vec<MediaItem>,
}

impl Cluster {
    pub fn new(first: MediaItem) -> Self {
        Self {
            timestamp_ms: first.timestamp_ms,
            items: vec![first],
        }
    }

    pub fn push(&mut self, item: MediaItem) {
        self.items.push(item);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Timestamp of the last item in the cluster.
    pub fn last_timestamp_ms(&self) -> i64 {
        self.items.last().map(|i| i.timestamp_ms).unwrap_or(self.timestamp_ms)
    }
}
