//! Data models for Video Pair Manager.
//!
//! This module contains the core data structures shared by every stage:
//! - `MediaItem`: one ingested file with metadata and lifecycle status
//! - `Pair`: two items judged to record the same event
//! - `ExtractedAudio`: audio artifacts written by processing runs
//! - `Collections`: the held snapshot of pairs and unpaired items

mod collections;
mod enums;
mod media;

pub use collections::Collections;
pub use enums::MediaStatus;
pub use media::{media_id_for, ExtractedAudio, MediaItem, Pair};
