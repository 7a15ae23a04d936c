//! Background loading of the metadata feed.
//!
//! The GTK main thread never blocks on disk: a dedicated thread owns a
//! current-thread tokio runtime, runs the blocking read + parse there, and
//! hands the outcome back over an async channel the main context can await.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::runtime::Builder as TokioRuntimeBuilder;
use tokio::task;
use tracing::info;

use crate::feed::parser::{read_feed, FeedOutcome};

/// Name of the feed file inside a library directory.
pub const FEED_FILE_NAME: &str = "meta.txt";

/// Resolves a library argument to its feed file: a directory means
/// `<dir>/meta.txt`, anything else is taken as the feed file itself.
pub fn resolve_feed_path(library: &Path) -> PathBuf {
    if library.is_dir() {
        library.join(FEED_FILE_NAME)
    } else {
        library.to_path_buf()
    }
}

/// Reads and parses the feed without blocking the calling runtime.
pub async fn load_feed(path: PathBuf) -> Result<FeedOutcome> {
    let shown = path.clone();
    let outcome = task::spawn_blocking(move || read_feed(&path))
        .await
        .context("feed load task panicked")?
        .with_context(|| format!("failed to load feed from {shown:?}"))?;

    info!(
        path = %shown.display(),
        parsed = outcome.stats.parsed,
        dropped = outcome.stats.dropped_malformed + outcome.stats.dropped_extension,
        "loaded metadata feed"
    );
    Ok(outcome)
}

/// Spawns the load on its own thread and returns the channel the result
/// arrives on. The receiver side is meant for `MainContext::spawn_local`.
pub fn spawn_load(library: PathBuf) -> async_channel::Receiver<Result<FeedOutcome>> {
    let (tx, rx) = async_channel::bounded(1);

    std::thread::spawn(move || {
        let result = TokioRuntimeBuilder::new_current_thread()
            .enable_all()
            .build()
            .context("failed to build feed loader runtime")
            .and_then(|runtime| runtime.block_on(load_feed(resolve_feed_path(&library))));
        let _ = tx.send_blocking(result);
    });

    rx
}
