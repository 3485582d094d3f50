//! Pipeline coordinator owning the held collections.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use parking_lot::RwLock;
use tokio::sync::Mutex;

use super::errors::{CoordinatorError, CoordinatorResult};
use crate::config::{ExtractionSettings, Settings};
use crate::events::{ChangeSink, PipelineEvent};
use crate::extraction::{FileProber, MetadataExtractor};
use crate::models::{media_id_for, Collections, ExtractedAudio, MediaItem, MediaStatus, Pair};
use crate::pairing::{match_candidates, MatchPolicy};
use crate::processing::{BatchProcessor, BatchReport, MediaTransform};
use crate::store::CollectionStore;

/// Outcome of an ingest operation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngestSummary {
    /// Ids of the items added, in input order.
    pub added: Vec<String>,
    /// Paths not added: unsupported extension or already tracked.
    pub skipped: Vec<PathBuf>,
    /// Items added in `Error` status because probing failed.
    pub probe_failures: usize,
    /// Pairs formed by auto-matching.
    pub pairs_formed: usize,
}

/// Owns the held collections and runs every operation on them.
///
/// Readers get the last committed snapshot. Writers are serialized: each
/// operation computes a new snapshot from the current one, saves it to the
/// store and only then makes it visible. If the save fails nothing changes.
pub struct Coordinator {
    extractor: MetadataExtractor,
    processor: BatchProcessor,
    policy: MatchPolicy,
    extraction: ExtractionSettings,
    store: Arc<dyn CollectionStore>,
    sink: Arc<dyn ChangeSink>,
    state: RwLock<Arc<Collections>>,
    op_lock: Mutex<()>,
}

impl Coordinator {
    /// Create a coordinator, loading the held collections from `store`.
    pub fn new(
        extractor: MetadataExtractor,
        processor: BatchProcessor,
        policy: MatchPolicy,
        store: Arc<dyn CollectionStore>,
        sink: Arc<dyn ChangeSink>,
    ) -> CoordinatorResult<Self> {
        let initial = store.load()?;
        tracing::info!(
            "Coordinator loaded {} pairs and {} unpaired items",
            initial.pairs.len(),
            initial.unpaired.len()
        );

        Ok(Self {
            extractor,
            processor,
            policy,
            extraction: ExtractionSettings::default(),
            store,
            sink,
            state: RwLock::new(Arc::new(initial)),
            op_lock: Mutex::new(()),
        })
    }

    /// Create a coordinator with every component configured from settings.
    pub fn from_settings(
        settings: &Settings,
        prober: Arc<dyn FileProber>,
        transform: Arc<dyn MediaTransform>,
        store: Arc<dyn CollectionStore>,
        sink: Arc<dyn ChangeSink>,
    ) -> CoordinatorResult<Self> {
        let coordinator = Self::new(
            MetadataExtractor::from_settings(prober, settings),
            BatchProcessor::from_settings(transform, &settings.processing),
            MatchPolicy::from(&settings.matching),
            store,
            sink,
        )?;
        Ok(coordinator.with_extraction_settings(settings.extraction.clone()))
    }

    /// Use these settings to decide which files are accepted at ingest.
    pub fn with_extraction_settings(mut self, settings: ExtractionSettings) -> Self {
        self.extraction = settings;
        self
    }

    /// Current committed snapshot.
    pub fn snapshot(&self) -> Arc<Collections> {
        Arc::clone(&self.state.read())
    }

    /// Matching policy in use.
    pub fn policy(&self) -> &MatchPolicy {
        &self.policy
    }

    /// Extract metadata for `paths` and add the new items.
    ///
    /// With `auto_match`, the matcher runs over the current unpaired items
    /// plus the new ones; committed pairs are never revisited.
    pub async fn ingest(&self, paths: &[PathBuf], auto_match: bool) -> CoordinatorResult<IngestSummary> {
        let mut summary = IngestSummary::default();

        let accepted = {
            let current = self.snapshot();
            let mut seen = HashSet::new();
            let mut accepted = Vec::new();
            for path in paths {
                match self.accepted_id(path) {
                    Some(id) if !current.contains_item(&id) && seen.insert(id.clone()) => {
                        accepted.push(path.clone());
                    }
                    _ => summary.skipped.push(path.clone()),
                }
            }
            accepted
        };

        if !summary.skipped.is_empty() {
            tracing::info!(
                "Skipping {} files (unsupported or already tracked)",
                summary.skipped.len()
            );
        }
        if accepted.is_empty() {
            return Ok(summary);
        }

        let items = self.extractor.extract(&accepted).await;

        let _guard = self.op_lock.lock().await;
        let current = self.snapshot();

        // Another operation may have added some of these meanwhile.
        let mut items: Vec<MediaItem> = items
            .into_iter()
            .filter(|item| {
                let fresh = !current.contains_item(&item.id);
                if !fresh {
                    summary.skipped.push(item.path.clone());
                }
                fresh
            })
            .collect();
        if items.is_empty() {
            return Ok(summary);
        }

        summary.added = items.iter().map(|i| i.id.clone()).collect();
        summary.probe_failures = items.iter().filter(|i| i.status == MediaStatus::Error).count();

        let mut next = (*current).clone();
        if auto_match {
            let mut candidates = std::mem::take(&mut next.unpaired);
            candidates.append(&mut items);

            let outcome = match_candidates(&candidates, &self.policy, Utc::now());
            summary.pairs_formed = outcome.pairs.len();
            next.pairs.extend(outcome.pairs);
            next.unpaired = outcome.unpaired;
        } else {
            next.unpaired.append(&mut items);
        }

        let committed = self.commit(next)?;
        self.notify_collections(&committed);

        tracing::info!(
            "Ingested {} items ({} probe failures, {} new pairs)",
            summary.added.len(),
            summary.probe_failures,
            summary.pairs_formed
        );
        Ok(summary)
    }

    /// Pair two unpaired items by hand.
    pub async fn pair(&self, first_id: &str, second_id: &str) -> CoordinatorResult<Pair> {
        if first_id == second_id {
            return Err(CoordinatorError::invalid(format!(
                "Cannot pair {} with itself",
                first_id
            )));
        }

        let _guard = self.op_lock.lock().await;
        let current = self.snapshot();
        let mut next = (*current).clone();

        let first_pos = unpaired_position(&next, first_id)?;
        let second_pos = unpaired_position(&next, second_id)?;

        // Remove the later index first so the earlier one stays valid.
        let (first, second) = if first_pos > second_pos {
            let first = next.unpaired.remove(first_pos);
            (first, next.unpaired.remove(second_pos))
        } else {
            let second = next.unpaired.remove(second_pos);
            (next.unpaired.remove(first_pos), second)
        };

        let pair = Pair::new(first, second, Utc::now())
            .ok_or_else(|| CoordinatorError::invalid("Pair members must be distinct"))?;
        next.pairs.push(pair.clone());

        let committed = self.commit(next)?;
        self.notify_collections(&committed);

        tracing::info!("Paired {}", pair.id);
        Ok(pair)
    }

    /// Dissolve a pair, returning both members to the unpaired collection.
    pub async fn unpair(&self, pair_id: &str) -> CoordinatorResult<(MediaItem, MediaItem)> {
        let _guard = self.op_lock.lock().await;
        let current = self.snapshot();
        let mut next = (*current).clone();

        let index = next
            .pairs
            .iter()
            .position(|p| p.id == pair_id)
            .ok_or_else(|| CoordinatorError::pair_not_found(pair_id))?;

        let (first, second) = next.pairs.remove(index).into_members();
        next.unpaired.push(first.clone());
        next.unpaired.push(second.clone());

        let committed = self.commit(next)?;
        self.notify_collections(&committed);

        tracing::info!("Unpaired {}", pair_id);
        Ok((first, second))
    }

    /// Run the batch processor over the given items.
    ///
    /// The items are marked `processing` and that state is committed before
    /// any work starts. Terminal results are merged into whatever snapshot
    /// is current when the batch finishes. Unknown ids are skipped. If the
    /// results cannot be saved, the items are moved to `error` instead.
    pub async fn process(&self, ids: &[String]) -> CoordinatorResult<BatchReport> {
        let items = {
            let _guard = self.op_lock.lock().await;
            let current = self.snapshot();
            let mut next = (*current).clone();

            let mut seen = HashSet::new();
            let mut items = Vec::new();
            for id in ids {
                if !seen.insert(id.as_str()) {
                    continue;
                }
                let marked = next.update_item(id, |item| {
                    item.status = MediaStatus::Processing;
                    item.error = None;
                    items.push(item.clone());
                });
                if !marked {
                    tracing::warn!("Skipping unknown item: {}", id);
                }
            }

            if items.is_empty() {
                return Ok(BatchReport::default());
            }

            let committed = self.commit(next).inspect_err(|e| self.report_failure(e))?;
            self.notify_collections(&committed);
            items
        };

        let report = self.processor.process_batch(items).await;

        let _guard = self.op_lock.lock().await;
        let current = self.snapshot();
        let mut next = (*current).clone();

        for result in report.results.values() {
            let applied = next.update_item(&result.id, |item| {
                item.status = result.status;
                item.error = result.error.clone();
                if result.is_success() {
                    item.output_path = result.output_path.clone();
                }
            });
            if !applied {
                tracing::debug!("Item {} was removed during processing", result.id);
                continue;
            }

            if let Some(path) = result.output_path.as_ref().filter(|_| result.is_success()) {
                next.extracted_audios.retain(|a| a.source_id != result.id);
                next.extracted_audios.push(ExtractedAudio {
                    source_id: result.id.clone(),
                    path: path.clone(),
                    created_at: result.finished_at,
                });
            }
        }

        let committed = match self.commit(next) {
            Ok(committed) => committed,
            Err(e) => {
                self.report_failure(&e);
                self.release_processing(&report, &e);
                return Err(e);
            }
        };
        self.notify_collections(&committed);
        self.sink.notify(PipelineEvent::BatchProcessed {
            results: report.clone(),
        });

        Ok(report)
    }

    /// Move items left in `processing` by a failed result commit to `error`.
    ///
    /// If this commit fails too, the items stay `processing` until they are
    /// processed again.
    fn release_processing(&self, report: &BatchReport, cause: &CoordinatorError) {
        let mut next = (*self.snapshot()).clone();
        let message = format!("Result not recorded: {}", cause);
        let mut released = 0;
        for id in report.results.keys() {
            next.update_item(id, |item| {
                if item.status == MediaStatus::Processing {
                    item.mark_error(message.clone());
                    released += 1;
                }
            });
        }
        if released == 0 {
            return;
        }

        match self.commit(next) {
            Ok(committed) => self.notify_collections(&committed),
            Err(e) => tracing::error!("Items left in processing state: {}", e),
        }
    }

    /// Clear all held collections.
    pub async fn reset(&self) -> CoordinatorResult<()> {
        let _guard = self.op_lock.lock().await;
        let committed = self.commit(Collections::default())?;
        self.notify_collections(&committed);
        tracing::info!("Collections reset");
        Ok(())
    }

    /// Id for a path if its extension is accepted.
    fn accepted_id(&self, path: &Path) -> Option<String> {
        let ext = path.extension()?.to_string_lossy();
        if !self.extraction.accepts_extension(&ext) {
            return None;
        }
        media_id_for(path)
    }

    /// Validate, persist and publish a new snapshot.
    ///
    /// Must be called with the operation lock held.
    fn commit(&self, next: Collections) -> CoordinatorResult<Arc<Collections>> {
        next.validate().map_err(CoordinatorError::Inconsistent)?;

        if let Err(e) = self.store.save(&next) {
            tracing::error!("Failed to save collections: {}", e);
            return Err(e.into());
        }

        let next = Arc::new(next);
        *self.state.write() = Arc::clone(&next);
        Ok(next)
    }

    fn notify_collections(&self, collections: &Collections) {
        self.sink.notify(PipelineEvent::CollectionsChanged {
            pairs: collections.pairs.clone(),
            unpaired: collections.unpaired.clone(),
        });
    }

    fn report_failure(&self, err: &CoordinatorError) {
        self.sink.notify(PipelineEvent::ProcessingError {
            message: err.to_string(),
        });
    }
}

fn unpaired_position(collections: &Collections, id: &str) -> CoordinatorResult<usize> {
    collections
        .unpaired
        .iter()
        .position(|m| m.id == id)
        .ok_or_else(|| CoordinatorError::item_not_found(id))
}
