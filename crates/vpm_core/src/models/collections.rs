//! Held collections snapshot.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::media::{ExtractedAudio, MediaItem, Pair};

/// One committed version of the held state.
///
/// Snapshots are never edited while visible to readers: the coordinator
/// clones, edits the copy and swaps it in whole.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collections {
    /// Committed pairs, in creation order.
    #[serde(default)]
    pub pairs: Vec<Pair>,
    /// Unpaired items, in insertion order.
    #[serde(default, rename = "unpairedVideos")]
    pub unpaired: Vec<MediaItem>,
    /// Audio artifacts from processing runs.
    #[serde(default)]
    pub extracted_audios: Vec<ExtractedAudio>,
}

impl Collections {
    /// Create empty collections.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of tracked items.
    pub fn item_count(&self) -> usize {
        self.pairs.len() * 2 + self.unpaired.len()
    }

    /// Whether an item with this id is tracked anywhere.
    pub fn contains_item(&self, id: &str) -> bool {
        self.find_item(id).is_some()
    }

    /// Find an item by id, in pairs or unpaired.
    pub fn find_item(&self, id: &str) -> Option<&MediaItem> {
        self.pairs
            .iter()
            .flat_map(|p| p.members())
            .find(|m| m.id == id)
            .or_else(|| self.unpaired.iter().find(|m| m.id == id))
    }

    /// Find a pair by id.
    pub fn find_pair(&self, pair_id: &str) -> Option<&Pair> {
        self.pairs.iter().find(|p| p.id == pair_id)
    }

    /// Find an unpaired item by id.
    pub fn find_unpaired(&self, id: &str) -> Option<&MediaItem> {
        self.unpaired.iter().find(|m| m.id == id)
    }

    /// Apply `f` to the item with this id wherever it lives.
    ///
    /// Returns `false` if no such item exists.
    pub fn update_item<F>(&mut self, id: &str, f: F) -> bool
    where
        F: FnOnce(&mut MediaItem),
    {
        let found = self
            .pairs
            .iter_mut()
            .flat_map(|p| p.members_mut())
            .chain(self.unpaired.iter_mut())
            .find(|m| m.id == id);

        match found {
            Some(item) => {
                f(item);
                true
            }
            None => false,
        }
    }

    /// Check structural invariants.
    ///
    /// - every item id appears once
    /// - every pair id appears once
    /// - every pair is consistent with its members
    /// - unpaired items carry no pair id
    pub fn validate(&self) -> Result<(), String> {
        let mut seen = HashSet::new();
        let mut pair_ids = HashSet::new();

        for pair in &self.pairs {
            if !pair.is_consistent() {
                return Err(format!("Pair '{}' is inconsistent with its members", pair.id));
            }
            if !pair_ids.insert(pair.id.as_str()) {
                return Err(format!("Pair id '{}' is used more than once", pair.id));
            }
            for member in pair.members() {
                if !seen.insert(member.id.as_str()) {
                    return Err(format!("Item '{}' appears more than once", member.id));
                }
            }
        }

        for item in &self.unpaired {
            if item.is_paired() || !item.pair_state_consistent() {
                return Err(format!("Unpaired item '{}' carries a pair id", item.id));
            }
            if !seen.insert(item.id.as_str()) {
                return Err(format!("Item '{}' appears more than once", item.id));
            }
        }

        Ok(())
    }
}
