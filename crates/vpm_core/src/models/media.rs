//! Media item and pair data structures.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::enums::MediaStatus;

/// Derive the working-set id for a file path (its file name).
pub fn media_id_for(path: &Path) -> Option<String> {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .filter(|n| !n.is_empty())
}

/// A single ingested video file and its tracked metadata.
///
/// The pairing fields are private so that `paired` and `pair_id`
/// can only change together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaItem {
    /// Stable identifier, derived from the file name.
    pub id: String,
    /// Absolute or user-supplied path to the file.
    pub path: PathBuf,
    /// Display name.
    pub name: String,
    /// Creation timestamp. `None` only when file metadata was unreadable.
    pub created_at: Option<DateTime<Utc>>,
    /// File size in bytes.
    #[serde(default)]
    pub size: u64,
    /// Duration in seconds, once probed.
    #[serde(default)]
    pub duration_secs: Option<f64>,
    /// Thumbnail reference, if one was generated.
    #[serde(default)]
    pub thumbnail: Option<PathBuf>,
    /// Recording device or encoder reported by the prober.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
    paired: bool,
    pair_id: Option<String>,
    /// Lifecycle status.
    #[serde(default)]
    pub status: MediaStatus,
    /// Reason for the most recent probe or processing failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Artifact written by the last successful processing run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_path: Option<PathBuf>,
}

impl MediaItem {
    /// Create a new idle, unpaired item.
    pub fn new(id: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            path: path.into(),
            created_at: None,
            size: 0,
            duration_secs: None,
            thumbnail: None,
            device: None,
            paired: false,
            pair_id: None,
            status: MediaStatus::Idle,
            error: None,
            output_path: None,
        }
    }

    /// Create an item for a file path, deriving id and name from the file name.
    pub fn from_path(path: &Path) -> Option<Self> {
        media_id_for(path).map(|id| Self::new(id, path))
    }

    /// Set the creation timestamp.
    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    /// Set the duration in seconds.
    pub fn with_duration(mut self, secs: f64) -> Self {
        self.duration_secs = Some(secs);
        self
    }

    /// Set the file size.
    pub fn with_size(mut self, size: u64) -> Self {
        self.size = size;
        self
    }

    /// Whether this item belongs to a pair.
    pub fn is_paired(&self) -> bool {
        self.paired
    }

    /// Id of the pair this item belongs to.
    pub fn pair_id(&self) -> Option<&str> {
        self.pair_id.as_deref()
    }

    /// Attach this item to a pair.
    pub fn assign_pair(&mut self, pair_id: impl Into<String>) {
        self.paired = true;
        self.pair_id = Some(pair_id.into());
    }

    /// Detach this item from its pair.
    pub fn clear_pair(&mut self) {
        self.paired = false;
        self.pair_id = None;
    }

    /// Check the `paired` / `pair_id` invariant.
    pub fn pair_state_consistent(&self) -> bool {
        self.paired == self.pair_id.is_some()
    }

    /// Record a failure reason and move to `Error`.
    pub fn mark_error(&mut self, reason: impl Into<String>) {
        self.status = MediaStatus::Error;
        self.error = Some(reason.into());
    }
}

/// Two media items judged to be recordings of the same event.
///
/// The members are snapshots taken when the pair was formed. The
/// coordinator refreshes them when processing results come in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pair {
    /// Deterministic id built from both member ids.
    pub id: String,
    /// First member.
    pub video1: MediaItem,
    /// Second member.
    pub video2: MediaItem,
    /// When the pair was formed.
    pub created_at: DateTime<Utc>,
}

impl Pair {
    const ID_SEPARATOR: char = '/';

    /// Build the pair id for two member ids. Argument order does not matter.
    ///
    /// Member ids are file names, which never contain the separator.
    pub fn id_for(a: &str, b: &str) -> String {
        if a <= b {
            format!("{}{}{}", a, Self::ID_SEPARATOR, b)
        } else {
            format!("{}{}{}", b, Self::ID_SEPARATOR, a)
        }
    }

    /// Pair two distinct items, stamping both with the new pair id.
    ///
    /// Returns `None` if both items share the same id.
    pub fn new(mut video1: MediaItem, mut video2: MediaItem, created_at: DateTime<Utc>) -> Option<Self> {
        if video1.id == video2.id {
            return None;
        }

        let id = Self::id_for(&video1.id, &video2.id);
        video1.assign_pair(&id);
        video2.assign_pair(&id);

        Some(Self {
            id,
            video1,
            video2,
            created_at,
        })
    }

    /// Whether the given item id is a member of this pair.
    pub fn contains(&self, item_id: &str) -> bool {
        self.video1.id == item_id || self.video2.id == item_id
    }

    /// Both members, in order.
    pub fn members(&self) -> [&MediaItem; 2] {
        [&self.video1, &self.video2]
    }

    /// Mutable access to both members.
    pub fn members_mut(&mut self) -> [&mut MediaItem; 2] {
        [&mut self.video1, &mut self.video2]
    }

    /// Dissolve the pair, returning both members as unpaired items.
    pub fn into_members(self) -> (MediaItem, MediaItem) {
        let Pair {
            mut video1,
            mut video2,
            ..
        } = self;
        video1.clear_pair();
        video2.clear_pair();
        (video1, video2)
    }

    /// Check the committed-pair invariants.
    pub fn is_consistent(&self) -> bool {
        self.video1.id != self.video2.id
            && self.members().iter().all(|m| m.pair_id() == Some(self.id.as_str()) && m.pair_state_consistent())
    }
}

/// An audio file produced by a processing run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedAudio {
    /// Media item the audio came from.
    pub source_id: String,
    /// Path to the audio file.
    pub path: PathBuf,
    /// When it was written.
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str) -> MediaItem {
        MediaItem::new(id, format!("/videos/{}", id))
    }

    #[test]
    fn id_derived_from_file_name() {
        let item = MediaItem::from_path(Path::new("/captures/left/GX010042.MP4")).unwrap();
        assert_eq!(item.id, "GX010042.MP4");
        assert_eq!(item.name, "GX010042.MP4");
        assert_eq!(item.status, MediaStatus::Idle);
        assert!(!item.is_paired());

        assert!(MediaItem::from_path(Path::new("/")).is_none());
    }

    #[test]
    fn pair_id_is_order_stable() {
        assert_eq!(Pair::id_for("a.mp4", "b.mp4"), Pair::id_for("b.mp4", "a.mp4"));
        assert_eq!(Pair::id_for("b.mp4", "a.mp4"), "a.mp4/b.mp4");
    }

    #[test]
    fn pair_ids_differ_for_hyphenated_names() {
        assert_ne!(
            Pair::id_for("a.mp4-b.mp4", "c.mp4"),
            Pair::id_for("a.mp4", "b.mp4-c.mp4")
        );
    }

    #[test]
    fn new_pair_stamps_members() {
        let pair = Pair::new(item("b.mp4"), item("a.mp4"), Utc::now()).unwrap();
        assert_eq!(pair.id, "a.mp4/b.mp4");
        assert_eq!(pair.video1.id, "b.mp4");
        assert_eq!(pair.video1.pair_id(), Some("a.mp4/b.mp4"));
        assert!(pair.video2.is_paired());
        assert!(pair.is_consistent());
    }

    #[test]
    fn pair_rejects_same_item() {
        assert!(Pair::new(item("a.mp4"), item("a.mp4"), Utc::now()).is_none());
    }

    #[test]
    fn dissolving_pair_clears_members() {
        let pair = Pair::new(item("a.mp4"), item("b.mp4"), Utc::now()).unwrap();
        let (a, b) = pair.into_members();
        assert!(!a.is_paired());
        assert!(a.pair_id().is_none());
        assert!(!b.is_paired());
        assert!(b.pair_state_consistent());
    }

    #[test]
    fn serializes_pair_fields() {
        let mut item = item("a.mp4");
        item.assign_pair("a.mp4/b.mp4");
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["paired"], true);
        assert_eq!(json["pairId"], "a.mp4/b.mp4");
        assert_eq!(json["status"], "idle");

        let back: MediaItem = serde_json::from_value(json).unwrap();
        assert_eq!(back, item);
    }
}
