//! Search history index
//!
//! The [`Index`] maps each searched word to the id of the entry file holding
//! its cached result, and persists that mapping to `<data_dir>/index.json`
//! after every change.
//!
//! # Lifecycle
//!
//! An index is `Uninitialized` until [`Index::open`] runs. A successful open
//! leaves it `Loaded`. An open that fails with `StoreError::Corrupted` means
//! the file exists but cannot be decoded; the caller may offer
//! [`Index::reset`]. An open that fails with `StoreError::PermissionDenied`
//! is fatal for the index and must be reported, never treated as an empty
//! history.
//!
//! # Write ordering
//!
//! Inserting saves the entry file before the index is updated and persisted.
//! Removing deletes the entry file before the mapping is dropped. A crash in
//! between can leave an orphan entry file, which is harmless, but never an
//! index mapping that points at nothing written by this process.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::entry::{CacheEntry, EntryStore};
use super::id::IdGenerator;
use super::record::{Record, RecordStore, Stored};
use super::StoreError;
use crate::provider::{Dictionary, ProviderError};

/// Record name of the index file
pub const INDEX_FILE: &str = "index";

/// The persisted word → entry id mapping
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexRecord {
    pub entries: HashMap<String, String>,
}

impl Record for IndexRecord {
    const KIND: &'static str = "index";
}

/// Result of looking a word up in the cache
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    /// The word is cached; includes when it was saved
    Hit(Stored<CacheEntry>),
    /// The word must be fetched from a provider
    Miss,
}

/// Outcome of [`Index::search`]
#[derive(Debug)]
pub enum SearchOutcome {
    /// Served from disk without a network call
    Cached(Stored<CacheEntry>),
    /// Fetched from the provider; `cache_error` is set if caching it failed
    Fetched {
        entry: CacheEntry,
        cache_error: Option<StoreError>,
    },
    /// The provider has no definitions for the word
    NotFound,
}

/// Errors that can occur while searching for a word
#[derive(Debug, Error)]
pub enum SearchError {
    /// Reading the cache failed
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The provider could not be queried
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// Summary of a [`Index::remove_all`] run
///
/// Bulk removal is best effort: words whose entry file could not be deleted
/// stay in the index so a later run can retry them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClearSummary {
    /// Words dropped from the index
    pub removed: Vec<String>,
    /// Words left in the index because their entry could not be deleted
    pub retained: Vec<String>,
}

impl ClearSummary {
    /// True when the history was already empty or at least one word was
    /// removed
    ///
    /// This is deliberately weaker than "everything was removed"; check
    /// [`ClearSummary::is_complete`] for that.
    pub fn succeeded(&self) -> bool {
        !self.removed.is_empty() || self.retained.is_empty()
    }

    /// True when no word was left behind
    pub fn is_complete(&self) -> bool {
        self.retained.is_empty()
    }
}

/// Durable index of searched words and their cached entries
#[derive(Debug)]
pub struct Index {
    records: RecordStore,
    entries: EntryStore,
    record: IndexRecord,
    ids: IdGenerator,
    dirty: bool,
}

impl Index {
    /// Loads the index from `data_dir`, creating an empty one if absent
    ///
    /// # Returns
    /// * `Ok(Index)` - Loaded or freshly created index
    /// * `Err(StoreError::PermissionDenied)` - The file exists but cannot be read
    /// * `Err(StoreError::Corrupted)` - The file cannot be decoded; see [`Index::reset`]
    pub fn open(data_dir: &Path, ids: IdGenerator) -> Result<Self, StoreError> {
        let records = RecordStore::new(data_dir);

        let record = match records.load::<IndexRecord>(INDEX_FILE) {
            Ok(record) => {
                tracing::debug!(words = record.entries.len(), "loaded index");
                record
            }
            Err(StoreError::NotFound { .. }) => {
                let record = IndexRecord::default();
                records.save(&record, INDEX_FILE)?;
                tracing::info!(
                    path = %records.path_for(INDEX_FILE).display(),
                    "created index file"
                );
                record
            }
            Err(err) => return Err(err),
        };

        Ok(Self::from_parts(records, data_dir, record, ids))
    }

    /// Overwrites the index file in `data_dir` with an empty index
    ///
    /// Entry files from the old index are left in place as orphans.
    pub fn reset(data_dir: &Path, ids: IdGenerator) -> Result<Self, StoreError> {
        let records = RecordStore::new(data_dir);
        let record = IndexRecord::default();
        records.save(&record, INDEX_FILE)?;
        tracing::warn!(path = %records.path_for(INDEX_FILE).display(), "index reset");

        Ok(Self::from_parts(records, data_dir, record, ids))
    }

    fn from_parts(
        records: RecordStore,
        data_dir: &Path,
        record: IndexRecord,
        ids: IdGenerator,
    ) -> Self {
        Self {
            records,
            entries: EntryStore::new(data_dir),
            record,
            ids,
            dirty: false,
        }
    }

    /// Path of the backing index file
    pub fn path(&self) -> PathBuf {
        self.records.path_for(INDEX_FILE)
    }

    /// The entry store this index references
    pub fn entry_store(&self) -> &EntryStore {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.record.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.record.entries.is_empty()
    }

    pub fn contains(&self, word: &str) -> bool {
        self.record.entries.contains_key(word)
    }

    /// Id of the entry cached for `word`
    pub fn entry_id(&self, word: &str) -> Option<&str> {
        self.record.entries.get(word).map(String::as_str)
    }

    /// Words in the history, in no particular order
    pub fn list(&self) -> impl Iterator<Item = &str> + '_ {
        self.record.entries.keys().map(String::as_str)
    }

    /// Looks `word` up in the cache
    ///
    /// An entry file that is missing or cannot be decoded counts as a miss:
    /// losing one cached word is not fatal, the caller simply fetches it
    /// again.
    pub fn lookup(&self, word: &str) -> Result<Lookup, StoreError> {
        let Some(id) = self.record.entries.get(word) else {
            return Ok(Lookup::Miss);
        };

        match self.entries.load_stored(id) {
            Ok(stored) => Ok(Lookup::Hit(stored)),
            Err(err @ (StoreError::NotFound { .. } | StoreError::Corrupted { .. })) => {
                tracing::warn!(
                    word = %word,
                    id = %id,
                    error = %err,
                    "cached entry unusable, treating as miss"
                );
                Ok(Lookup::Miss)
            }
            Err(err) => Err(err),
        }
    }

    /// Caches `entry` under a freshly generated id
    ///
    /// The entry file is written first, then the mapping is updated and the
    /// index persisted. If persisting fails the mapping is rolled back, so
    /// the word only ever appears in the index once its entry is on disk.
    /// Re-inserting a word replaces its entry; the superseded file is
    /// deleted once the new mapping is durable.
    pub fn insert(&mut self, entry: CacheEntry) -> Result<(), StoreError> {
        let taken = &self.record.entries;
        let id = self
            .ids
            .generate(taken.len(), |candidate| taken.values().any(|v| v == candidate))?;

        self.entries.save(&entry, &id)?;

        let word = entry.word;
        let previous = self.record.entries.insert(word.clone(), id.clone());

        if let Err(err) = self.persist() {
            match previous {
                Some(old_id) => self.record.entries.insert(word.clone(), old_id),
                None => self.record.entries.remove(&word),
            };
            if let Err(cleanup) = self.entries.delete(&id) {
                tracing::debug!(id = %id, error = %cleanup, "orphan entry left behind");
            }
            tracing::warn!(word = %word, error = %err, "index not saved, word not cached");
            return Err(err);
        }

        if let Some(old_id) = previous {
            if let Err(err) = self.entries.delete(&old_id) {
                if !err.is_not_found() {
                    tracing::warn!(id = %old_id, error = %err, "could not delete superseded entry");
                }
            }
        }

        tracing::info!(word = %word, id = %id, "word cached");
        Ok(())
    }

    /// Removes `word` and its cached entry
    ///
    /// # Returns
    /// * `Err(StoreError::NotFound)` - `word` is not in the history
    /// * `Err(_)` - The entry could not be deleted; `word` stays in the
    ///   history, or the index could not be persisted
    pub fn remove(&mut self, word: &str) -> Result<(), StoreError> {
        let Some(id) = self.record.entries.get(word).cloned() else {
            return Err(StoreError::not_found(word));
        };

        match self.entries.delete(&id) {
            Ok(()) => {}
            // Already gone; the mapping was dangling
            Err(StoreError::NotFound { .. }) => {
                tracing::debug!(word = %word, id = %id, "entry file already missing");
            }
            Err(err) => {
                tracing::warn!(
                    word = %word,
                    id = %id,
                    error = %err,
                    "could not delete entry, keeping word"
                );
                return Err(err);
            }
        }

        self.record.entries.remove(word);
        self.persist()?;
        tracing::info!(word = %word, "word removed");
        Ok(())
    }

    /// Removes every word whose entry file can be deleted
    ///
    /// Each entry is deleted independently. Words whose entry deletion fails,
    /// including entries already missing from disk, stay in the index. The
    /// index is persisted once at the end.
    ///
    /// # Returns
    /// * `Ok(ClearSummary)` - What was removed and what was retained
    /// * `Err(StoreError)` - Only if the final persist fails
    pub fn remove_all(&mut self) -> Result<ClearSummary, StoreError> {
        let mut summary = ClearSummary::default();
        if self.record.entries.is_empty() {
            return Ok(summary);
        }

        let snapshot: Vec<(String, String)> = self
            .record
            .entries
            .iter()
            .map(|(word, id)| (word.clone(), id.clone()))
            .collect();

        for (word, id) in snapshot {
            match self.entries.delete(&id) {
                Ok(()) => {
                    self.record.entries.remove(&word);
                    summary.removed.push(word);
                }
                Err(err) => {
                    tracing::warn!(word = %word, id = %id, error = %err, "could not delete entry");
                    summary.retained.push(word);
                }
            }
        }

        self.persist()?;
        tracing::info!(
            removed = summary.removed.len(),
            retained = summary.retained.len(),
            "history cleared"
        );
        Ok(summary)
    }

    /// Returns the cached result for `word`, fetching it on a miss
    ///
    /// Synonyms are only requested after definitions succeed. A fetched
    /// result is returned even if caching it fails.
    pub async fn search<D: Dictionary>(
        &mut self,
        word: &str,
        dictionary: &D,
    ) -> Result<SearchOutcome, SearchError> {
        if let Lookup::Hit(stored) = self.lookup(word)? {
            tracing::debug!(word = %word, "cache hit");
            return Ok(SearchOutcome::Cached(stored));
        }

        let Some(definitions) = dictionary.definitions(word).await? else {
            tracing::info!(word = %word, "no definitions found");
            return Ok(SearchOutcome::NotFound);
        };

        let synonyms = match dictionary.synonyms(word).await {
            Ok(Some(synonyms)) => synonyms,
            Ok(None) => String::new(),
            Err(err) => {
                tracing::warn!(word = %word, error = %err, "synonym lookup failed");
                String::new()
            }
        };

        let entry = CacheEntry::new(word, definitions, synonyms);
        let cache_error = self.insert(entry.clone()).err();

        Ok(SearchOutcome::Fetched { entry, cache_error })
    }

    /// Writes the index if an earlier persist failed
    pub fn close(mut self) -> Result<(), StoreError> {
        if self.dirty {
            self.persist()?;
        }
        Ok(())
    }

    fn persist(&mut self) -> Result<(), StoreError> {
        let result = self.records.save(&self.record, INDEX_FILE);
        self.dirty = result.is_err();
        result
    }
}
