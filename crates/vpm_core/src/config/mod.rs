//! Configuration management for Video Pair Manager.
//!
//! This module provides:
//! - TOML-based configuration with logical sections
//! - Atomic file writes (write to temp, then rename)
//! - Section-level updates (only changed section is modified)
//! - Validation on load with automatic defaults
//!
//! # Example
//!
//! ```no_run
//! use vpm_core::config::{ConfigManager, ConfigSection};
//!
//! let mut config = ConfigManager::new(".config/settings.toml");
//! config.load_or_create().unwrap();
//!
//! println!("Max skew: {}s", config.settings().matching.max_skew_secs);
//!
//! config.settings_mut().matching.auto_match = true;
//! config.update_section(ConfigSection::Matching).unwrap();
//! ```

mod manager;
mod settings;

pub use manager::{ConfigError, ConfigManager, ConfigResult};
pub use settings::{
    ConfigSection, ExtractionSettings, LoggingSettings, MatchingSettings, PathSettings,
    ProcessingSettings, Settings,
};
