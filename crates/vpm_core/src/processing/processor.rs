//! Bounded-concurrency batch runner.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::{self, StreamExt};

use super::transform::MediaTransform;
use super::types::{BatchReport, ProcessedItem, ProcessingError};
use crate::config::ProcessingSettings;
use crate::models::MediaItem;

/// Runs a transform over a batch of items.
///
/// Each item runs in its own task with its own timeout, so a failing,
/// hanging or panicking item never affects its siblings. Results are keyed
/// by item id regardless of completion order.
#[derive(Clone)]
pub struct BatchProcessor {
    transform: Arc<dyn MediaTransform>,
    max_workers: usize,
    item_timeout: Duration,
}

impl BatchProcessor {
    pub fn new(transform: Arc<dyn MediaTransform>, max_workers: usize, item_timeout: Duration) -> Self {
        Self {
            transform,
            max_workers: max_workers.max(1),
            item_timeout,
        }
    }

    /// Create a processor from settings.
    pub fn from_settings(transform: Arc<dyn MediaTransform>, settings: &ProcessingSettings) -> Self {
        Self::new(
            transform,
            settings.max_workers,
            Duration::from_secs(settings.item_timeout_secs),
        )
    }

    /// Number of concurrent workers.
    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    /// Process every item, returning one result per distinct id.
    ///
    /// Items are run regardless of their current status; already processed
    /// items are processed again.
    pub async fn process_batch(&self, items: Vec<MediaItem>) -> BatchReport {
        let mut seen = HashSet::new();
        let items: Vec<MediaItem> = items
            .into_iter()
            .filter(|item| {
                let fresh = seen.insert(item.id.clone());
                if !fresh {
                    tracing::warn!("Skipping duplicate item in batch: {}", item.id);
                }
                fresh
            })
            .collect();

        tracing::info!(
            "Processing batch of {} items ({} workers)",
            items.len(),
            self.max_workers
        );

        let results: Vec<ProcessedItem> = stream::iter(items)
            .map(|item| self.spawn_item(item))
            .buffer_unordered(self.max_workers)
            .collect()
            .await;

        let mut report = BatchReport::default();
        for result in results {
            report.insert(result);
        }

        tracing::info!(
            "Batch finished: {} processed, {} failed",
            report.len() - report.failed_count(),
            report.failed_count()
        );
        report
    }

    async fn spawn_item(&self, item: MediaItem) -> ProcessedItem {
        let id = item.id.clone();
        let transform = Arc::clone(&self.transform);
        let timeout = self.item_timeout;

        let handle = tokio::spawn(async move { run_item(transform, item, timeout).await });

        match handle.await {
            Ok(result) => result,
            Err(e) => {
                let err = ProcessingError::WorkerAborted {
                    id: id.clone(),
                    message: e.to_string(),
                };
                tracing::error!("{}", err);
                ProcessedItem::failure(id, err.to_string())
            }
        }
    }
}

async fn run_item(transform: Arc<dyn MediaTransform>, item: MediaItem, timeout: Duration) -> ProcessedItem {
    tracing::debug!("Processing {}", item.id);

    let outcome = match tokio::time::timeout(timeout, transform.transform(&item)).await {
        Ok(result) => result,
        Err(_) => Err(ProcessingError::Timeout {
            id: item.id.clone(),
            secs: timeout.as_secs(),
        }),
    };

    match outcome {
        Ok(output) => ProcessedItem::success(item.id, output),
        Err(e) => {
            tracing::warn!("Processing failed for {}: {}", item.id, e);
            ProcessedItem::failure(item.id, e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MediaStatus;
    use crate::processing::ProcessingResult;
    use async_trait::async_trait;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Transform that fails for ids containing "bad", hangs for "hang"
    /// and panics for "panic".
    #[derive(Default)]
    struct FakeTransform {
        calls: AtomicUsize,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl MediaTransform for FakeTransform {
        async fn transform(&self, item: &MediaItem) -> ProcessingResult<Option<PathBuf>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);

            if item.id.contains("hang") {
                tokio::time::sleep(Duration::from_secs(3600)).await;
            } else {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if item.id.contains("panic") {
                panic!("transform blew up");
            }
            if item.id.contains("bad") {
                return Err(ProcessingError::CommandFailed {
                    tool: "ffmpeg".to_string(),
                    exit_code: 1,
                    message: "Invalid data found when processing input".to_string(),
                });
            }
            Ok(Some(PathBuf::from(format!("/out/{}.m4a", item.id))))
        }
    }

    fn items(ids: &[&str]) -> Vec<MediaItem> {
        ids.iter().map(|id| MediaItem::new(*id, format!("/v/{}", id))).collect()
    }

    #[tokio::test]
    async fn one_failure_does_not_affect_siblings() {
        let processor = BatchProcessor::new(Arc::new(FakeTransform::default()), 2, Duration::from_secs(5));
        let report = processor
            .process_batch(items(&["a.mp4", "b.mp4", "bad.mp4", "c.mp4", "d.mp4"]))
            .await;

        assert_eq!(report.len(), 5);
        assert_eq!(report.failed_count(), 1);
        let bad = report.get("bad.mp4").unwrap();
        assert_eq!(bad.status, MediaStatus::Error);
        assert!(bad.error.as_deref().unwrap().contains("Invalid data"));
        for id in ["a.mp4", "b.mp4", "c.mp4", "d.mp4"] {
            let r = report.get(id).unwrap();
            assert_eq!(r.status, MediaStatus::Processed);
            assert_eq!(r.output_path, Some(PathBuf::from(format!("/out/{}.m4a", id))));
        }
    }

    #[tokio::test]
    async fn panicking_item_is_an_error() {
        let processor = BatchProcessor::new(Arc::new(FakeTransform::default()), 2, Duration::from_secs(5));
        let report = processor.process_batch(items(&["a.mp4", "panic.mp4"])).await;

        assert_eq!(report.get("panic.mp4").unwrap().status, MediaStatus::Error);
        assert_eq!(report.get("a.mp4").unwrap().status, MediaStatus::Processed);
    }

    #[tokio::test(start_paused = true)]
    async fn hung_item_times_out() {
        let processor = BatchProcessor::new(Arc::new(FakeTransform::default()), 2, Duration::from_secs(10));
        let report = processor.process_batch(items(&["hang.mp4", "a.mp4"])).await;

        let hung = report.get("hang.mp4").unwrap();
        assert_eq!(hung.status, MediaStatus::Error);
        assert!(hung.error.as_deref().unwrap().contains("timed out"));
        assert!(report.get("a.mp4").unwrap().is_success());
    }

    #[tokio::test]
    async fn concurrency_is_bounded() {
        let transform = Arc::new(FakeTransform::default());
        let processor = BatchProcessor::new(transform.clone(), 3, Duration::from_secs(5));
        let ids: Vec<String> = (0..10).map(|i| format!("v{}.mp4", i)).collect();
        let ids: Vec<&str> = ids.iter().map(|s| s.as_str()).collect();

        let report = processor.process_batch(items(&ids)).await;
        assert_eq!(report.len(), 10);
        assert!(transform.peak.load(Ordering::SeqCst) <= 3);
    }

    #[tokio::test]
    async fn processed_items_are_rerun() {
        let transform = Arc::new(FakeTransform::default());
        let processor = BatchProcessor::new(transform.clone(), 2, Duration::from_secs(5));

        let mut batch = items(&["a.mp4"]);
        batch[0].status = MediaStatus::Processed;
        processor.process_batch(batch.clone()).await;
        processor.process_batch(batch).await;

        assert_eq!(transform.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn duplicate_ids_run_once() {
        let transform = Arc::new(FakeTransform::default());
        let processor = BatchProcessor::new(transform.clone(), 2, Duration::from_secs(5));
        let report = processor.process_batch(items(&["a.mp4", "a.mp4"])).await;

        assert_eq!(report.len(), 1);
        assert_eq!(transform.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn empty_batch() {
        let processor = BatchProcessor::new(Arc::new(FakeTransform::default()), 2, Duration::from_secs(5));
        assert!(processor.process_batch(Vec::new()).await.is_empty());
    }
}
