//! JSON file store.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::{CollectionStore, StoreError, StoreResult};
use crate::models::Collections;

/// File name of the store document inside the data folder.
pub const STORE_FILE_NAME: &str = "video-pairs-data.json";

/// Current document format version.
pub const STORE_VERSION: u32 = 1;

/// Persistent document (saved to video-pairs-data.json).
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoreDocument {
    /// Document format version.
    version: u32,
    #[serde(flatten)]
    collections: Collections,
}

/// Store backed by a single JSON document.
///
/// Writes go to a temp file first and are renamed over the document, so a
/// crash mid-write leaves the previous snapshot intact.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    file: PathBuf,
}

impl JsonFileStore {
    /// Create a store writing `video-pairs-data.json` in `data_folder`.
    pub fn new(data_folder: &Path) -> Self {
        Self::at(data_folder.join(STORE_FILE_NAME))
    }

    /// Create a store at an explicit file path.
    pub fn at(file: impl Into<PathBuf>) -> Self {
        Self { file: file.into() }
    }

    /// Path of the store document.
    pub fn path(&self) -> &Path {
        &self.file
    }
}

impl CollectionStore for JsonFileStore {
    fn load(&self) -> StoreResult<Collections> {
        if !self.file.exists() {
            tracing::debug!("No store at {}, starting empty", self.file.display());
            return Ok(Collections::default());
        }

        let content = fs::read_to_string(&self.file).map_err(|e| StoreError::io(&self.file, e))?;
        let doc: StoreDocument = serde_json::from_str(&content).map_err(|e| StoreError::Parse {
            path: self.file.clone(),
            source: e,
        })?;

        if doc.version != STORE_VERSION {
            return Err(StoreError::UnsupportedVersion {
                found: doc.version,
                expected: STORE_VERSION,
            });
        }

        doc.collections.validate().map_err(StoreError::Corrupt)?;

        tracing::debug!(
            "Loaded {} pairs and {} unpaired items from {}",
            doc.collections.pairs.len(),
            doc.collections.unpaired.len(),
            self.file.display()
        );
        Ok(doc.collections)
    }

    fn save(&self, collections: &Collections) -> StoreResult<()> {
        if let Some(parent) = self.file.parent() {
            fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
        }

        let doc = StoreDocument {
            version: STORE_VERSION,
            collections: collections.clone(),
        };
        let json = serde_json::to_string_pretty(&doc)?;

        // Write atomically via temp file
        let temp_file = self.file.with_extension("json.tmp");
        fs::write(&temp_file, &json).map_err(|e| StoreError::io(&temp_file, e))?;
        fs::rename(&temp_file, &self.file).map_err(|e| StoreError::io(&self.file, e))?;

        tracing::debug!(
            "Saved {} pairs and {} unpaired items to {}",
            collections.pairs.len(),
            collections.unpaired.len(),
            self.file.display()
        );
        Ok(())
    }
}
