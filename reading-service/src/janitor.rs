use std::{
    path::{Path, PathBuf},
    time::{Duration, SystemTime},
};

use futures::StreamExt;
use tokio_stream::wrappers::ReadDirStream;

/// Delete regular files in `dir` last modified more than `ttl` before `now`.
///
/// Per-file failures are logged and skipped. Returns how many files were
/// removed.
pub async fn sweep_expired(dir: &Path, ttl: Duration, now: SystemTime) -> std::io::Result<usize> {
    let mut entries = ReadDirStream::new(tokio::fs::read_dir(dir).await?);
    let mut removed = 0;

    while let Some(entry) = entries.next().await {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                tracing::warn!(error = %e, "failed to read image directory entry");
                continue;
            }
        };

        let path = entry.path();
        let modified = match entry.metadata().await {
            Ok(meta) if meta.is_file() => meta.modified(),
            Ok(_) => continue,
            Err(e) => Err(e),
        };
        let modified = match modified {
            Ok(m) => m,
            Err(e) => {
                tracing::warn!(error = %e, path = %path.display(), "failed to stat image");
                continue;
            }
        };

        // Files with an mtime in the future are not expired.
        let expired = now.duration_since(modified).map(|age| age > ttl).unwrap_or(false);
        if !expired {
            continue;
        }

        match tokio::fs::remove_file(&path).await {
            Ok(()) => removed += 1,
            Err(e) => tracing::warn!(error = %e, path = %path.display(), "failed to delete expired image"),
        }
    }

    Ok(removed)
}

/// Run `sweep_expired` every `interval` on a background task.
///
/// Not coordinated with uploads: a link handed out just before a sweep can
/// point at a deleted file once the TTL has passed.
pub fn spawn(dir: PathBuf, interval: Duration, ttl: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            match sweep_expired(&dir, ttl, SystemTime::now()).await {
                Ok(0) => {}
                Ok(removed) => {
                    metrics::counter!(crate::metrics_server::IMAGES_SWEPT_TOTAL).increment(removed as u64);
                    tracing::info!(removed, dir = %dir.display(), "expired images deleted");
                }
                Err(e) => {
                    tracing::error!(error = %e, dir = %dir.display(), "image sweep failed");
                }
            }
        }
    })
}
