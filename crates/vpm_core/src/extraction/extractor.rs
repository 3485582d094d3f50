//! Batch metadata extraction with bounded concurrency.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::{self, StreamExt};

use super::probe::{read_file_stats, FileProber};
use super::types::ExtractionError;
use crate::config::Settings;
use crate::models::{MediaItem, MediaStatus};

/// Turns file paths into media items.
///
/// At most `max_workers` probes run at once. A file that cannot be probed
/// still produces an item, in `Error` status with the reason recorded.
#[derive(Clone)]
pub struct MetadataExtractor {
    prober: Arc<dyn FileProber>,
    max_workers: usize,
    probe_timeout: Duration,
}

impl MetadataExtractor {
    /// Create an extractor with explicit limits.
    pub fn new(prober: Arc<dyn FileProber>, max_workers: usize, probe_timeout: Duration) -> Self {
        Self {
            prober,
            max_workers: max_workers.max(1),
            probe_timeout,
        }
    }

    /// Create an extractor from settings.
    ///
    /// Shares the worker count with batch processing.
    pub fn from_settings(prober: Arc<dyn FileProber>, settings: &Settings) -> Self {
        Self::new(
            prober,
            settings.processing.max_workers,
            Duration::from_secs(settings.extraction.probe_timeout_secs),
        )
    }

    /// Number of concurrent probes.
    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    /// Extract metadata for every path.
    ///
    /// Results come back in input order, one per path.
    pub async fn extract(&self, paths: &[PathBuf]) -> Vec<MediaItem> {
        tracing::info!(
            "Extracting metadata for {} files ({} workers)",
            paths.len(),
            self.max_workers
        );

        let mut indexed: Vec<(usize, MediaItem)> = stream::iter(paths.iter().enumerate())
            .map(|(index, path)| async move { (index, self.extract_one(path).await) })
            .buffer_unordered(self.max_workers)
            .collect()
            .await;

        indexed.sort_by_key(|(index, _)| *index);

        let items: Vec<MediaItem> = indexed.into_iter().map(|(_, item)| item).collect();
        let failed = items.iter().filter(|i| i.status == MediaStatus::Error).count();
        if failed > 0 {
            tracing::warn!("{} of {} files could not be probed", failed, items.len());
        }
        items
    }

    /// Extract metadata for a single path.
    pub async fn extract_one(&self, path: &Path) -> MediaItem {
        let mut item = MediaItem::from_path(path)
            .unwrap_or_else(|| MediaItem::new(path.display().to_string(), path));

        let probed = match tokio::time::timeout(self.probe_timeout, self.prober.probe(path)).await {
            Ok(result) => result,
            Err(_) => Err(ExtractionError::Timeout {
                path: path.to_path_buf(),
                secs: self.probe_timeout.as_secs(),
            }),
        };

        match probed {
            Ok(probe) => {
                item.created_at = Some(probe.created_at);
                item.size = probe.size;
                item.duration_secs = probe.duration_secs;
                item.device = probe.device;
            }
            Err(e) => {
                tracing::warn!("Probe failed for {}: {}", path.display(), e);

                // Keep whatever the file system can still tell us.
                if let Ok((created_at, size)) = read_file_stats(path).await {
                    item.created_at = Some(created_at);
                    item.size = size;
                }
                item.duration_secs = None;
                item.mark_error(e.to_string());
            }
        }

        item
    }
}
