//! Metadata feed parsing.
//!
//! The feed is a plain text file with one whitespace-separated record per
//! line: `timestamp identity width height [tag]*`, timestamp in epoch
//! seconds (scaled to milliseconds on ingestion). Parsing is per-record
//! tolerant: a malformed record is counted and dropped, never fatal for the
//! batch. Identities without a recognized media extension are dropped too,
//! since feeds routinely list sidecar files next to the media.

use std::path::Path;

use thiserror::Error;
use tracing::{debug, warn};

use crate::models::{MediaItem, MediaKind};

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("failed to read feed file: {0}")]
    Io(#[from] std::io::Error),
}

/// Counters for one parse run, reported to the status line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedStats {
    pub total_records: usize,
    pub parsed: usize,
    pub dropped_malformed: usize,
    pub dropped_extension: usize,
}

/// Parsed items (sorted by timestamp, ranks assigned) plus parse counters.
#[derive(Debug, Clone, Default)]
pub struct FeedOutcome {
    pub items: Vec<MediaItem>,
    pub stats: FeedStats,
}

/// Parses the full feed text. Items come back sorted by ascending
/// timestamp, with `index` holding each item's chronological rank.
pub fn parse_feed(text: &str) -> FeedOutcome {
    let mut items = Vec::new();
    let mut stats = FeedStats::default();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        stats.total_records += 1;

        match parse_record(line) {
            Ok(item) => items.push(item),
            Err(RecordError::Malformed) => {
                stats.dropped_malformed += 1;
                warn!("dropping malformed feed record: {line:?}");
            }
            Err(RecordError::UnknownExtension) => {
                stats.dropped_extension += 1;
                debug!("dropping non-media feed record: {line:?}");
            }
        }
    }

    // Stable sort keeps feed order for identical timestamps; ranks are
    // assigned after sorting so they are the chronological order.
    items.sort_by_key(|item| item.timestamp_ms);
    for (rank, item) in items.iter_mut().enumerate() {
        item.index = rank;
    }

    stats.parsed = items.len();
    FeedOutcome { items, stats }
}

/// Reads and parses a feed file.
pub fn read_feed(path: &Path) -> Result<FeedOutcome, FeedError> {
    let text = std::fs::read_to_string(path)?;
    Ok(parse_feed(&text))
}

enum RecordError {
    Malformed,
    UnknownExtension,
}

fn parse_record(line: &str) -> Result<MediaItem, RecordError> {
    let mut fields = line.split_whitespace();

    let timestamp_s: i64 = fields
        .next()
        .and_then(|f| f.parse().ok())
        .ok_or(RecordError::Malformed)?;
    let identity = fields.next().ok_or(RecordError::Malformed)?;
    let width: u32 = fields
        .next()
        .and_then(|f| f.parse().ok())
        .ok_or(RecordError::Malformed)?;
    let height: u32 = fields
        .next()
        .and_then(|f| f.parse().ok())
        .ok_or(RecordError::Malformed)?;
    let tags = fields.map(str::to_owned).collect();

    let kind = MediaKind::from_identity(identity).ok_or(RecordError::UnknownExtension)?;

    Ok(MediaItem {
        // Rank is assigned after the whole feed is sorted.
        index: 0,
        timestamp_ms: timestamp_s * 1000,
        identity: identity.to_string(),
        kind,
        width,
        height,
        tags,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic_records() {
        let outcome = parse_feed(
            "1546300800 2019/a.jpg 4000 3000 beach cat\n\
             1546300805 2019/b.mp4 1920 1080\n",
        );
        assert_eq!(outcome.items.len(), 2);
        assert_eq!(outcome.stats.parsed, 2);

        let a = &outcome.items[0];
        assert_eq!(a.identity, "2019/a.jpg");
        assert_eq!(a.timestamp_ms, 1_546_300_800_000);
        assert_eq!(a.width, 4000);
        assert_eq!(a.height, 3000);
        assert!(a.has_tag("beach") && a.has_tag("cat"));
        assert_eq!(a.kind, MediaKind::Image);

        assert_eq!(outcome.items[1].kind, MediaKind::Video);
        assert!(outcome.items[1].tags.is_empty());
    }

    #[test]
    fn test_records_sorted_and_ranked() {
        let outcome = parse_feed(
            "300 c.jpg 10 10\n\
             100 a.jpg 10 10\n\
             200 b.jpg 10 10\n",
        );
        let ids: Vec<_> = outcome.items.iter().map(|i| i.identity.as_str()).collect();
        assert_eq!(ids, vec!["a.jpg", "b.jpg", "c.jpg"]);
        let ranks: Vec<_> = outcome.items.iter().map(|i| i.index).collect();
        assert_eq!(ranks, vec![0, 1, 2]);
    }

    #[test]
    fn test_malformed_records_dropped() {
        let outcome = parse_feed(
            "100 a.jpg 10 10\n\
             not-a-timestamp b.jpg 10 10\n\
             200 c.jpg 10\n\
             300 d.jpg ten 10\n\
             400\n",
        );
        assert_eq!(outcome.items.len(), 1);
        assert_eq!(outcome.stats.dropped_malformed, 4);
        assert_eq!(outcome.stats.total_records, 5);
    }

    #[test]
    fn test_non_media_extensions_dropped() {
        let outcome = parse_feed(
            "100 a.jpg 10 10\n\
             200 a.jpg.xmp 0 0\n\
             300 notes.txt 0 0\n",
        );
        assert_eq!(outcome.items.len(), 1);
        assert_eq!(outcome.stats.dropped_extension, 2);
    }

    #[test]
    fn test_empty_feed() {
        let outcome = parse_feed("");
        assert!(outcome.items.is_empty());
        assert_eq!(outcome.stats, FeedStats::default());

        let outcome = parse_feed("\n\n   \n");
        assert!(outcome.items.is_empty());
        assert_eq!(outcome.stats.total_records, 0);
    }

    #[test]
    fn test_equal_timestamps_keep_feed_order() {
        let outcome = parse_feed(
            "100 a.jpg 10 10\n\
             100 b.jpg 10 10\n\
             100 c.jpg 10 10\n",
        );
        let ids: Vec<_> = outcome.items.iter().map(|i| i.identity.as_str()).collect();
        assert_eq!(ids, vec!["a.jpg", "b.jpg", "c.jpg"]);
    }

    #[test]
    fn test_read_feed_from_disk() {
        use std::io::Write;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "100 a.jpg 10 10 cat").unwrap();
        writeln!(file, "garbage").unwrap();
        file.flush().unwrap();

        let outcome = read_feed(file.path()).unwrap();
        assert_eq!(outcome.items.len(), 1);
        assert_eq!(outcome.stats.dropped_malformed, 1);
    }

    #[test]
    fn test_read_feed_missing_file() {
        let err = read_feed(Path::new("/nonexistent/meta.txt"));
        assert!(matches!(err, Err(FeedError::Io(_))));
    }
}
