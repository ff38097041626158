//! Cache entry store
//!
//! One file per cached word, named by the entry id the index generated for
//! it: `<data_dir>/history/<ID>.json`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::record::{Record, RecordStore, Stored};
use super::StoreError;

/// Name of the subdirectory holding entry files
pub const ENTRY_DIR: &str = "history";

/// One cached lookup result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// The word as the user searched it
    pub word: String,
    /// Definitions in the order the provider returned them
    pub definitions: Vec<String>,
    /// Comma-joined synonyms, empty when none were found
    pub synonyms: String,
}

impl Record for CacheEntry {
    const KIND: &'static str = "cache_entry";
}

impl CacheEntry {
    pub fn new(
        word: impl Into<String>,
        definitions: Vec<String>,
        synonyms: impl Into<String>,
    ) -> Self {
        Self {
            word: word.into(),
            definitions,
            synonyms: synonyms.into(),
        }
    }
}

/// Persists, retrieves and deletes [`CacheEntry`] records by id
#[derive(Debug, Clone)]
pub struct EntryStore {
    records: RecordStore,
}

impl EntryStore {
    /// Creates an entry store inside `data_dir`
    ///
    /// The `history` subdirectory is created on the first save.
    pub fn new(data_dir: &Path) -> Self {
        Self {
            records: RecordStore::new(data_dir.join(ENTRY_DIR)),
        }
    }

    pub fn path_for(&self, id: &str) -> PathBuf {
        self.records.path_for(id)
    }

    pub fn save(&self, entry: &CacheEntry, id: &str) -> Result<(), StoreError> {
        self.records.save(entry, id)
    }

    pub fn load(&self, id: &str) -> Result<CacheEntry, StoreError> {
        self.records.load(id)
    }

    /// Loads an entry together with the time it was cached
    pub fn load_stored(&self, id: &str) -> Result<Stored<CacheEntry>, StoreError> {
        self.records.load_stored(id)
    }

    pub fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.records.delete(id)
    }
}
