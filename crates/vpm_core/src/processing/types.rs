//! Types for batch processing.

use std::collections::BTreeMap;
use std::io;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::MediaStatus;

/// Error type for transforming a single item.
///
/// Item-scoped: the processor turns these into a failed `ProcessedItem`.
#[derive(Error, Debug)]
pub enum ProcessingError {
    /// Source file is missing.
    #[error("Source not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    /// Output directory could not be prepared.
    #[error("Cannot create output directory {}: {source}", path.display())]
    OutputDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Failed to execute external tool.
    #[error("{tool} execution failed: {message}")]
    ToolExecutionFailed { tool: String, message: String },

    /// External tool exited with an error.
    #[error("{tool} failed with exit code {exit_code}: {message}")]
    CommandFailed {
        tool: String,
        exit_code: i32,
        message: String,
    },

    /// Transform did not finish in time.
    #[error("Processing {id} timed out after {secs}s")]
    Timeout { id: String, secs: u64 },

    /// Worker task ended abnormally.
    #[error("Worker for {id} aborted: {message}")]
    WorkerAborted { id: String, message: String },
}

impl ProcessingError {
    /// Create a command failure from captured stderr.
    pub fn command_failed(tool: impl Into<String>, exit_code: Option<i32>, stderr: &[u8]) -> Self {
        Self::CommandFailed {
            tool: tool.into(),
            exit_code: exit_code.unwrap_or(-1),
            message: last_line(&String::from_utf8_lossy(stderr)),
        }
    }
}

/// Result type for processing operations.
pub type ProcessingResult<T> = Result<T, ProcessingError>;

/// ffmpeg prints the actual reason last.
fn last_line(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .last()
        .unwrap_or("no output")
        .to_string()
}

/// Terminal outcome of processing one item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedItem {
    /// Item id.
    pub id: String,
    /// `Processed` or `Error`.
    pub status: MediaStatus,
    /// Artifact written by the transform, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_path: Option<PathBuf>,
    /// Failure reason.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// When the item finished.
    pub finished_at: DateTime<Utc>,
}

impl ProcessedItem {
    /// Create a successful result.
    pub fn success(id: impl Into<String>, output_path: Option<PathBuf>) -> Self {
        Self {
            id: id.into(),
            status: MediaStatus::Processed,
            output_path,
            error: None,
            finished_at: Utc::now(),
        }
    }

    /// Create a failed result.
    pub fn failure(id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            status: MediaStatus::Error,
            output_path: None,
            error: Some(error.into()),
            finished_at: Utc::now(),
        }
    }

    /// Whether the item was processed successfully.
    pub fn is_success(&self) -> bool {
        self.status == MediaStatus::Processed
    }
}

/// Results of one batch, keyed by item id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub results: BTreeMap<String, ProcessedItem>,
}

impl BatchReport {
    /// Number of results.
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Whether the batch was empty.
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Result for one item.
    pub fn get(&self, id: &str) -> Option<&ProcessedItem> {
        self.results.get(id)
    }

    /// Successful results.
    pub fn succeeded(&self) -> impl Iterator<Item = &ProcessedItem> {
        self.results.values().filter(|r| r.is_success())
    }

    /// Number of failed items.
    pub fn failed_count(&self) -> usize {
        self.results.values().filter(|r| !r.is_success()).count()
    }

    pub(crate) fn insert(&mut self, result: ProcessedItem) {
        self.results.insert(result.id.clone(), result);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_failure_keeps_last_stderr_line() {
        let stderr = b"Input #0, mov,mp4\n  Stream #0:0: Video\nOutput file does not contain any stream\n\n";
        let err = ProcessingError::command_failed("ffmpeg", Some(1), stderr);
        assert_eq!(
            err.to_string(),
            "ffmpeg failed with exit code 1: Output file does not contain any stream"
        );
    }

    #[test]
    fn report_counts() {
        let mut report = BatchReport::default();
        report.insert(ProcessedItem::success("a.mp4", Some(PathBuf::from("/out/a.m4a"))));
        report.insert(ProcessedItem::failure("b.mp4", "boom"));

        assert_eq!(report.len(), 2);
        assert_eq!(report.failed_count(), 1);
        assert_eq!(report.succeeded().count(), 1);
        assert_eq!(report.get("b.mp4").unwrap().status, MediaStatus::Error);
    }

    #[test]
    fn result_serializes_camel_case() {
        let json = serde_json::to_value(ProcessedItem::success("a.mp4", Some(PathBuf::from("/o/a.m4a")))).unwrap();
        assert_eq!(json["status"], "processed");
        assert_eq!(json["outputPath"], "/o/a.m4a");
        assert!(json.get("error").is_none());
    }
}
