//! Automatic pairing of recordings.
//!
//! Two items are a candidate pair when their creation times lie within
//! `max_skew_secs` of each other and, if both durations are known, their
//! durations differ by at most `max_duration_delta_secs`.
//!
//! Candidates are scored (lower is better) and assigned greedily:
//!
//! ```text
//! A 10:00:00 30s ─┐ score 0.60  -> paired
//! B 10:00:02 31s ─┘
//! C 10:05:00 30s     no candidate -> unpaired
//! ```

mod matcher;
mod policy;

pub use matcher::{match_candidates, MatchOutcome};
pub use policy::{skew_secs, MatchPolicy};
