//! File probing using ffprobe.
//!
//! Creation time and size come from file-system metadata. Duration and
//! recording device come from `ffprobe -print_format json -show_format`.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::process::Command;

use super::types::{ExtractionError, ExtractionResult, ProbeResult};

/// Capability that reads metadata for one file.
///
/// Implementations must report failures as errors, never panic, and be
/// safe to call concurrently for different paths.
#[async_trait]
pub trait FileProber: Send + Sync {
    /// Probe a single file.
    async fn probe(&self, path: &Path) -> ExtractionResult<ProbeResult>;
}

/// Format tags that name the recording device, most specific first.
const DEVICE_TAGS: &[&str] = &[
    "com.apple.quicktime.model",
    "com.android.model",
    "model",
    "firmware",
    "encoder",
];

/// Prober backed by the ffprobe binary.
#[derive(Debug, Clone)]
pub struct FfprobeProber {
    binary: PathBuf,
}

impl FfprobeProber {
    /// Create a prober invoking the given ffprobe binary.
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    fn tool_name(&self) -> String {
        self.binary
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "ffprobe".to_string())
    }
}

impl Default for FfprobeProber {
    fn default() -> Self {
        Self::new("ffprobe")
    }
}

#[async_trait]
impl FileProber for FfprobeProber {
    async fn probe(&self, path: &Path) -> ExtractionResult<ProbeResult> {
        let (created_at, size) = read_file_stats(path).await?;

        tracing::debug!("Probing file: {}", path.display());

        let tool = self.tool_name();
        let output = Command::new(&self.binary)
            .args(["-v", "error", "-print_format", "json", "-show_format", "-show_streams"])
            .arg(path)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| ExtractionError::ToolExecutionFailed {
                tool: tool.clone(),
                message: e.to_string(),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ExtractionError::CommandFailed {
                tool,
                exit_code: output.status.code().unwrap_or(-1),
                message: stderr.trim().to_string(),
            });
        }

        let json: Value =
            serde_json::from_slice(&output.stdout).map_err(|e| ExtractionError::ParseError {
                tool: tool.clone(),
                message: e.to_string(),
            })?;

        let mut result = ProbeResult::new(created_at, size);
        result.duration_secs = parse_duration(&json);
        result.device = parse_device(&json);
        Ok(result)
    }
}

/// Read creation time and size from file-system metadata.
///
/// Uses the birth time where the platform records it, otherwise the
/// modification time.
pub async fn read_file_stats(path: &Path) -> ExtractionResult<(DateTime<Utc>, u64)> {
    let meta = tokio::fs::metadata(path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ExtractionError::FileNotFound(path.to_path_buf())
        } else {
            ExtractionError::FileUnreadable {
                path: path.to_path_buf(),
                source: e,
            }
        }
    })?;

    let time = meta
        .created()
        .or_else(|_| meta.modified())
        .map_err(|e| ExtractionError::FileUnreadable {
            path: path.to_path_buf(),
            source: e,
        })?;

    Ok((DateTime::<Utc>::from(time), meta.len()))
}

/// Container duration, falling back to the first stream that reports one.
fn parse_duration(json: &Value) -> Option<f64> {
    let from_format = json
        .get("format")
        .and_then(|f| f.get("duration"))
        .and_then(value_as_f64);

    from_format
        .or_else(|| {
            json.get("streams")
                .and_then(|s| s.as_array())
                .and_then(|streams| {
                    streams
                        .iter()
                        .filter_map(|s| s.get("duration").and_then(value_as_f64))
                        .next()
                })
        })
        .filter(|d| d.is_finite() && *d >= 0.0)
}

/// Recording device from the format tags.
fn parse_device(json: &Value) -> Option<String> {
    let tags = json.get("format")?.get("tags")?.as_object()?;

    DEVICE_TAGS.iter().find_map(|key| {
        tags.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .and_then(|(_, v)| v.as_str())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    })
}

/// ffprobe reports numbers as strings.
fn value_as_f64(v: &Value) -> Option<f64> {
    match v {
        Value::String(s) => s.trim().parse().ok(),
        Value::Number(n) => n.as_f64(),
        _ => None,
    }
}
