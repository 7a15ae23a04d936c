pub mod loader;
pub mod parser;

pub use loader::{resolve_feed_path, spawn_load, FEED_FILE_NAME};
pub use parser::{parse_feed, read_feed, FeedError, FeedOutcome, FeedStats};
