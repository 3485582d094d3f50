//! Types for metadata extraction.

use std::io;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for probing a single file.
///
/// These never abort a batch; the extractor records them on the item.
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// File not found.
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// File metadata could not be read.
    #[error("Cannot read {}: {source}", path.display())]
    FileUnreadable {
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

    /// Failed to parse tool output.
    #[error("Failed to parse {tool} output: {message}")]
    ParseError { tool: String, message: String },

    /// Probe did not finish in time.
    #[error("Probing {} timed out after {secs}s", path.display())]
    Timeout { path: PathBuf, secs: u64 },
}

/// Result type for extraction operations.
pub type ExtractionResult<T> = Result<T, ExtractionError>;

/// Metadata reported by a prober for one file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeResult {
    /// Creation timestamp of the file.
    pub created_at: DateTime<Utc>,
    /// File size in bytes.
    pub size: u64,
    /// Media duration in seconds, if the container reports one.
    pub duration_secs: Option<f64>,
    /// Recording device or encoder tag.
    pub device: Option<String>,
}

impl ProbeResult {
    /// Create a result with only file-system metadata.
    pub fn new(created_at: DateTime<Utc>, size: u64) -> Self {
        Self {
            created_at,
            size,
            duration_secs: None,
            device: None,
        }
    }

    /// Set the duration.
    pub fn with_duration(mut self, secs: f64) -> Self {
        self.duration_secs = Some(secs);
        self
    }
}
