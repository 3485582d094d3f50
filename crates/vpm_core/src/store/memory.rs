//! In-memory store.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use parking_lot::Mutex;

use super::{CollectionStore, StoreError, StoreResult};
use crate::models::Collections;

/// Store that keeps the snapshot in memory.
///
/// Saves can be made to fail, to exercise orchestration error paths.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: Mutex<Collections>,
    fail_saves: AtomicBool,
    fail_next: AtomicBool,
    saves: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store preloaded with a snapshot.
    pub fn with_collections(collections: Collections) -> Self {
        Self {
            collections: Mutex::new(collections),
            ..Self::default()
        }
    }

    /// Make subsequent saves fail (or succeed again).
    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    /// Make only the next save fail.
    pub fn fail_next_save(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    /// Number of successful saves.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// Last saved snapshot.
    pub fn saved(&self) -> Collections {
        self.collections.lock().clone()
    }
}

impl CollectionStore for MemoryStore {
    fn load(&self) -> StoreResult<Collections> {
        Ok(self.collections.lock().clone())
    }

    fn save(&self, collections: &Collections) -> StoreResult<()> {
        if self.fail_next.swap(false, Ordering::SeqCst) || self.fail_saves.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("writes disabled".to_string()));
        }
        *self.collections.lock() = collections.clone();
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
