//! Similarity scoring between two candidates.

use chrono::{DateTime, Utc};

use crate::config::MatchingSettings;
use crate::models::MediaItem;

/// Thresholds and weights used to score candidate pairs.
///
/// Both distance terms are normalized by their threshold, so each lies in
/// `0.0..=1.0` for an eligible pair. The score is their weighted sum;
/// lower is better.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchPolicy {
    /// Maximum creation-time skew, in seconds.
    pub max_skew_secs: f64,
    /// Maximum duration difference when both are known, in seconds.
    pub max_duration_delta_secs: f64,
    /// Weight of the skew term.
    pub skew_weight: f64,
    /// Weight of the duration term.
    pub duration_weight: f64,
    /// Duration term used when either duration is unknown.
    pub unknown_duration_penalty: f64,
}

impl Default for MatchPolicy {
    fn default() -> Self {
        Self::from(&MatchingSettings::default())
    }
}

impl From<&MatchingSettings> for MatchPolicy {
    fn from(settings: &MatchingSettings) -> Self {
        Self {
            max_skew_secs: settings.max_skew_secs,
            max_duration_delta_secs: settings.max_duration_delta_secs,
            skew_weight: settings.skew_weight,
            duration_weight: settings.duration_weight,
            unknown_duration_penalty: settings.unknown_duration_penalty.clamp(0.0, 1.0),
        }
    }
}

impl MatchPolicy {
    /// Create a policy with the given thresholds and default weights.
    pub fn with_thresholds(max_skew_secs: f64, max_duration_delta_secs: f64) -> Self {
        Self {
            max_skew_secs,
            max_duration_delta_secs,
            ..Self::default()
        }
    }

    /// Score a candidate pair.
    ///
    /// Returns `None` when the pair is ineligible:
    /// - same id, or either item already paired
    /// - either creation time unknown
    /// - skew above `max_skew_secs`
    /// - both durations known and their difference above `max_duration_delta_secs`
    pub fn score(&self, a: &MediaItem, b: &MediaItem) -> Option<f64> {
        if a.id == b.id || a.is_paired() || b.is_paired() {
            return None;
        }

        let skew = skew_secs(a.created_at?, b.created_at?);
        if skew > self.max_skew_secs {
            return None;
        }

        let duration_term = match (a.duration_secs, b.duration_secs) {
            (Some(da), Some(db)) => {
                let delta = (da - db).abs();
                if delta > self.max_duration_delta_secs {
                    return None;
                }
                normalize(delta, self.max_duration_delta_secs)
            }
            _ => self.unknown_duration_penalty,
        };

        Some(self.skew_weight * normalize(skew, self.max_skew_secs) + self.duration_weight * duration_term)
    }
}

/// Absolute difference between two timestamps, in seconds.
pub fn skew_secs(a: DateTime<Utc>, b: DateTime<Utc>) -> f64 {
    (a - b).num_milliseconds().unsigned_abs() as f64 / 1000.0
}

fn normalize(value: f64, limit: f64) -> f64 {
    if limit > 0.0 {
        value / limit
    } else {
        0.0
    }
}
