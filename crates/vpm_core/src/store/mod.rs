//! Persistence of the held collections.
//!
//! A store loads and saves the whole `Collections` snapshot at once; there
//! are no partial updates.

mod json_file;
mod memory;

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::models::Collections;

pub use json_file::{JsonFileStore, STORE_FILE_NAME, STORE_VERSION};
pub use memory::MemoryStore;

/// Error type for store operations.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Reading or writing the backing file failed.
    #[error("Store I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Stored document could not be parsed.
    #[error("Failed to parse store {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Snapshot could not be serialized.
    #[error("Failed to serialize collections: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Document was written by an incompatible version.
    #[error("Unsupported store version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },

    /// Stored collections violate their invariants.
    #[error("Stored collections are corrupt: {0}")]
    Corrupt(String),

    /// Store is not accepting writes.
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Create an I/O error for a path.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Full-snapshot persistence for the held collections.
pub trait CollectionStore: Send + Sync {
    /// Load the persisted snapshot, or empty collections if none exists.
    fn load(&self) -> StoreResult<Collections>;

    /// Replace the persisted snapshot.
    fn save(&self, collections: &Collections) -> StoreResult<()>;
}
