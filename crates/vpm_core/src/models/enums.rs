//! Core enums used throughout the application.

use serde::{Deserialize, Serialize};

/// Lifecycle status of a single media item.
///
/// Items start out `Idle`. A processing run moves them through
/// `Processing` to one of the terminal states `Processed` or `Error`.
/// Extraction can also leave an item in `Error` when its metadata
/// could not be probed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaStatus {
    /// Ingested, nothing running.
    #[default]
    Idle,
    /// A processing run is in flight.
    Processing,
    /// Last processing run succeeded.
    Processed,
    /// Last probe or processing run failed.
    Error,
}

impl MediaStatus {
    /// Get display string for UI.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Processing => "processing",
            Self::Processed => "processed",
            Self::Error => "error",
        }
    }

    /// Whether this is the outcome of a finished processing run.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Processed | Self::Error)
    }
}

impl std::fmt::Display for MediaStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serializes_lowercase() {
        let json = serde_json::to_string(&MediaStatus::Processing).unwrap();
        assert_eq!(json, "\"processing\"");

        let parsed: MediaStatus = serde_json::from_str("\"error\"").unwrap();
        assert_eq!(parsed, MediaStatus::Error);
    }

    #[test]
    fn terminal_states() {
        assert!(!MediaStatus::Idle.is_terminal());
        assert!(!MediaStatus::Processing.is_terminal());
        assert!(MediaStatus::Processed.is_terminal());
        assert!(MediaStatus::Error.is_terminal());
    }
}
