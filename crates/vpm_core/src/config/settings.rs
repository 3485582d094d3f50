//! Settings struct with TOML-based sections.
//!
//! Settings are organized into logical sections that map to TOML tables.
//! Each section can be updated independently for atomic section-level updates.

use serde::{Deserialize, Serialize};

use crate::logging::LogLevel;

/// Root settings structure containing all configuration sections.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Path-related settings.
    #[serde(default)]
    pub paths: PathSettings,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingSettings,

    /// Metadata extraction settings.
    #[serde(default)]
    pub extraction: ExtractionSettings,

    /// Pairing policy.
    #[serde(default)]
    pub matching: MatchingSettings,

    /// Batch processing settings.
    #[serde(default)]
    pub processing: ProcessingSettings,
}

/// Path configuration for output, data, and logs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathSettings {
    /// Output folder for processed artifacts.
    #[serde(default = "default_output_folder")]
    pub output_folder: String,

    /// Folder holding the persisted collections.
    #[serde(default = "default_data_folder")]
    pub data_folder: String,

    /// Folder for log files.
    #[serde(default = "default_logs_folder")]
    pub logs_folder: String,
}

fn default_output_folder() -> String {
    "pair_output".to_string()
}

fn default_data_folder() -> String {
    ".data".to_string()
}

fn default_logs_folder() -> String {
    ".logs".to_string()
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            output_folder: default_output_folder(),
            data_folder: default_data_folder(),
            logs_folder: default_logs_folder(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Default level when RUST_LOG is not set.
    #[serde(default)]
    pub level: LogLevel,

    /// Also write a daily log file into the logs folder.
    #[serde(default = "default_true")]
    pub log_to_file: bool,
}

fn default_true() -> bool {
    true
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: LogLevel::default(),
            log_to_file: true,
        }
    }
}

/// Metadata extraction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionSettings {
    /// Accepted video file extensions (lowercase, no dot).
    #[serde(default = "default_video_extensions")]
    pub video_extensions: Vec<String>,

    /// Probe binary to invoke.
    #[serde(default = "default_ffprobe")]
    pub ffprobe_path: String,

    /// Per-file probe timeout in seconds.
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_secs: u64,
}

fn default_video_extensions() -> Vec<String> {
    ["mp4", "avi", "mov", "mkv", "insv"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_ffprobe() -> String {
    "ffprobe".to_string()
}

fn default_probe_timeout() -> u64 {
    30
}

fn default_workers() -> usize {
    4
}

impl Default for ExtractionSettings {
    fn default() -> Self {
        Self {
            video_extensions: default_video_extensions(),
            ffprobe_path: default_ffprobe(),
            probe_timeout_secs: default_probe_timeout(),
        }
    }
}

impl ExtractionSettings {
    /// Whether a file extension is in the accepted list (case-insensitive).
    pub fn accepts_extension(&self, ext: &str) -> bool {
        let ext = ext.to_ascii_lowercase();
        self.video_extensions.iter().any(|e| e.eq_ignore_ascii_case(&ext))
    }
}

/// Pairing policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchingSettings {
    /// Maximum creation-time skew between two members, in seconds.
    #[serde(default = "default_max_skew")]
    pub max_skew_secs: f64,

    /// Maximum duration difference when both durations are known, in seconds.
    #[serde(default = "default_max_duration_delta")]
    pub max_duration_delta_secs: f64,

    /// Weight of the normalized skew in the score.
    #[serde(default = "default_skew_weight")]
    pub skew_weight: f64,

    /// Weight of the normalized duration delta in the score.
    #[serde(default = "default_duration_weight")]
    pub duration_weight: f64,

    /// Normalized duration term used when either duration is unknown (0.0..=1.0).
    #[serde(default = "default_unknown_penalty")]
    pub unknown_duration_penalty: f64,

    /// Match newly ingested files automatically.
    #[serde(default)]
    pub auto_match: bool,
}

fn default_max_skew() -> f64 {
    5.0
}

fn default_max_duration_delta() -> f64 {
    5.0
}

fn default_skew_weight() -> f64 {
    1.0
}

fn default_duration_weight() -> f64 {
    1.0
}

fn default_unknown_penalty() -> f64 {
    0.5
}

impl Default for MatchingSettings {
    fn default() -> Self {
        Self {
            max_skew_secs: default_max_skew(),
            max_duration_delta_secs: default_max_duration_delta(),
            skew_weight: default_skew_weight(),
            duration_weight: default_duration_weight(),
            unknown_duration_penalty: default_unknown_penalty(),
            auto_match: false,
        }
    }
}

/// Batch processing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingSettings {
    /// Number of concurrent workers, for both probing and processing.
    #[serde(default = "default_workers")]
    pub max_workers: usize,

    /// Per-item timeout in seconds.
    #[serde(default = "default_item_timeout")]
    pub item_timeout_secs: u64,

    /// Transform binary to invoke.
    #[serde(default = "default_ffmpeg")]
    pub ffmpeg_path: String,

    /// Extension (and container) of extracted audio files.
    #[serde(default = "default_audio_extension")]
    pub audio_extension: String,
}

fn default_item_timeout() -> u64 {
    600
}

fn default_ffmpeg() -> String {
    "ffmpeg".to_string()
}

fn default_audio_extension() -> String {
    "m4a".to_string()
}

impl Default for ProcessingSettings {
    fn default() -> Self {
        Self {
            max_workers: default_workers(),
            item_timeout_secs: default_item_timeout(),
            ffmpeg_path: default_ffmpeg(),
            audio_extension: default_audio_extension(),
        }
    }
}

/// Names of config sections for targeted updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigSection {
    Paths,
    Logging,
    Extraction,
    Matching,
    Processing,
}

impl ConfigSection {
    /// All sections, in file order.
    pub fn all() -> &'static [ConfigSection] {
        &[
            Self::Paths,
            Self::Logging,
            Self::Extraction,
            Self::Matching,
            Self::Processing,
        ]
    }

    /// Get the TOML table name for this section.
    pub fn table_name(&self) -> &'static str {
        match self {
            ConfigSection::Paths => "paths",
            ConfigSection::Logging => "logging",
            ConfigSection::Extraction => "extraction",
            ConfigSection::Matching => "matching",
            ConfigSection::Processing => "processing",
        }
    }

    /// Comment written above the section.
    pub fn description(&self) -> &'static str {
        match self {
            ConfigSection::Paths => "Output, data and log directories",
            ConfigSection::Logging => "Logging configuration",
            ConfigSection::Extraction => "Metadata extraction",
            ConfigSection::Matching => "Automatic pairing policy",
            ConfigSection::Processing => "Batch processing",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_serializes() {
        let settings = Settings::default();
        let toml = toml::to_string_pretty(&settings).unwrap();
        assert!(toml.contains("[paths]"));
        assert!(toml.contains("[matching]"));
        assert!(toml.contains("max_skew_secs"));
    }

    #[test]
    fn missing_fields_use_defaults() {
        let minimal = "[matching]\nmax_skew_secs = 2.5";
        let parsed: Settings = toml::from_str(minimal).unwrap();
        assert_eq!(parsed.matching.max_skew_secs, 2.5);
        assert_eq!(parsed.matching.max_duration_delta_secs, 5.0);
        assert_eq!(parsed.processing.max_workers, 4);
        assert_eq!(parsed.extraction.video_extensions.len(), 5);
    }

    #[test]
    fn extension_filter_ignores_case() {
        let settings = ExtractionSettings::default();
        assert!(settings.accepts_extension("MP4"));
        assert!(settings.accepts_extension("insv"));
        assert!(!settings.accepts_extension("txt"));
    }
}
