//! Serialized record store
//!
//! Provides a `RecordStore` that saves typed records as JSON files under a
//! base directory. Every file carries a small envelope naming the format
//! version and the record kind, so reading a file of the wrong shape is
//! detected when it is decoded.
//!
//! ```text
//! {
//!   "format": 1,
//!   "kind": "cache_entry",
//!   "saved_at": "2026-10-16T09:30:00Z",
//!   "data": { ... }
//! }
//! ```

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use super::StoreError;

/// Version written into every envelope
pub const FORMAT_VERSION: u32 = 1;

/// File extension used for every record file
pub const RECORD_EXTENSION: &str = "json";

/// A value that can be persisted by a [`RecordStore`]
pub trait Record: Serialize + DeserializeOwned {
    /// Tag written into the envelope and checked on load
    const KIND: &'static str;
}

/// Envelope as written to disk
#[derive(Serialize)]
struct EnvelopeOut<'a, T> {
    format: u32,
    kind: &'a str,
    saved_at: DateTime<Utc>,
    data: &'a T,
}

/// Envelope as read from disk, before the payload is type checked
#[derive(Deserialize)]
struct EnvelopeIn {
    format: u32,
    kind: String,
    saved_at: DateTime<Utc>,
    data: serde_json::Value,
}

/// A record read from disk together with its envelope metadata
#[derive(Debug, Clone, PartialEq)]
pub struct Stored<T> {
    /// The decoded record
    pub record: T,
    /// When the record was written
    pub saved_at: DateTime<Utc>,
}

/// Saves, loads and deletes typed records under a base directory
///
/// A record named `name` lives at `<base_dir>/<name>.json`. Writes go to a
/// temporary sibling first and are renamed into place, so a reader sees
/// either the previous complete file or the new complete file.
#[derive(Debug, Clone)]
pub struct RecordStore {
    base_dir: PathBuf,
}

impl RecordStore {
    /// Creates a store rooted at `base_dir`
    ///
    /// The directory is created lazily on the first save.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Directory holding the record files
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Returns the path of the record file for `name`
    pub fn path_for(&self, name: &str) -> PathBuf {
        self.base_dir.join(format!("{}.{}", name, RECORD_EXTENSION))
    }

    /// Path of the temporary file used while saving `name`
    fn tmp_path_for(&self, name: &str) -> PathBuf {
        self.base_dir.join(format!("{}.{}.tmp", name, RECORD_EXTENSION))
    }

    /// Ensures the base directory exists
    fn ensure_dir(&self) -> Result<(), StoreError> {
        fs::create_dir_all(&self.base_dir).map_err(|e| StoreError::from_io(&self.base_dir, e))
    }

    /// Whether a record file exists for `name`
    pub fn exists(&self, name: &str) -> bool {
        self.path_for(name).is_file()
    }

    /// Writes `record` under `name`, replacing any previous file atomically
    ///
    /// # Returns
    /// * `Ok(())` once the file is complete and in place
    /// * `Err(StoreError)` if the directory, the temporary file or the rename
    ///   fails; the previous file, if any, is left untouched
    pub fn save<T: Record>(&self, record: &T, name: &str) -> Result<(), StoreError> {
        self.ensure_dir()?;

        let path = self.path_for(name);
        let tmp_path = self.tmp_path_for(name);

        let envelope = EnvelopeOut {
            format: FORMAT_VERSION,
            kind: T::KIND,
            saved_at: Utc::now(),
            data: record,
        };
        let json = serde_json::to_vec_pretty(&envelope).map_err(|e| StoreError::Io {
            path: path.clone(),
            source: io::Error::new(io::ErrorKind::InvalidData, e),
        })?;

        let written = write_synced(&tmp_path, &json).and_then(|()| fs::rename(&tmp_path, &path));
        if let Err(err) = written {
            // A directory squatting on the temporary path is not ours to remove
            if tmp_path.is_file() {
                let _ = fs::remove_file(&tmp_path);
            }
            tracing::warn!(path = %path.display(), error = %err, "failed to save record");
            return Err(StoreError::from_io(&path, err));
        }

        tracing::trace!(path = %path.display(), kind = T::KIND, "record saved");
        Ok(())
    }

    /// Reads the record stored under `name`
    pub fn load<T: Record>(&self, name: &str) -> Result<T, StoreError> {
        self.load_stored(name).map(|stored| stored.record)
    }

    /// Reads the record stored under `name` along with its save timestamp
    ///
    /// # Returns
    /// * `Err(StoreError::NotFound)` if no file exists
    /// * `Err(StoreError::PermissionDenied)` if the file cannot be read
    /// * `Err(StoreError::Corrupted)` if the bytes are not an envelope of
    ///   the current format holding a `T`
    pub fn load_stored<T: Record>(&self, name: &str) -> Result<Stored<T>, StoreError> {
        let path = self.path_for(name);
        let bytes = fs::read(&path).map_err(|e| StoreError::from_io(&path, e))?;

        let envelope: EnvelopeIn = serde_json::from_slice(&bytes)
            .map_err(|e| StoreError::corrupted(&path, format!("invalid envelope: {}", e)))?;

        if envelope.format != FORMAT_VERSION {
            return Err(StoreError::corrupted(
                &path,
                format!("unsupported format version {}", envelope.format),
            ));
        }

        if envelope.kind != T::KIND {
            return Err(StoreError::corrupted(
                &path,
                format!("expected a {} record, found {}", T::KIND, envelope.kind),
            ));
        }

        let record = serde_json::from_value(envelope.data)
            .map_err(|e| StoreError::corrupted(&path, format!("invalid {}: {}", T::KIND, e)))?;

        Ok(Stored {
            record,
            saved_at: envelope.saved_at,
        })
    }

    /// Removes the record file for `name`
    ///
    /// A missing file is reported as `StoreError::NotFound`; callers that
    /// only need the file gone may treat that as success.
    pub fn delete(&self, name: &str) -> Result<(), StoreError> {
        let path = self.path_for(name);
        fs::remove_file(&path).map_err(|e| StoreError::from_io(&path, e))?;
        tracing::trace!(path = %path.display(), "record deleted");
        Ok(())
    }
}

/// Writes `bytes` to a fresh file at `path` and syncs it to disk
fn write_synced(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct TestData {
        name: String,
        value: i32,
    }

    impl Record for TestData {
        const KIND: &'static str = "test_data";
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct OtherData {
        flag: bool,
    }

    impl Record for OtherData {
        const KIND: &'static str = "other_data";
    }

    fn create_test_store() -> (RecordStore, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = RecordStore::new(temp_dir.path());
        (store, temp_dir)
    }

    #[test]
    fn test_save_creates_file_with_envelope() {
        let (store, temp_dir) = create_test_store();
        let data = TestData {
            name: "test".to_string(),
            value: 42,
        };

        store.save(&data, "test_key").expect("Save should succeed");

        let expected_path = temp_dir.path().join("test_key.json");
        assert!(expected_path.exists(), "Record file should exist");

        let content = fs::read_to_string(&expected_path).expect("Should read file");
        assert!(content.contains("\"format\": 1"));
        assert!(content.contains("\"kind\": \"test_data\""));
        assert!(content.contains("\"saved_at\""));
        assert!(content.contains("42"));
        assert!(
            !temp_dir.path().join("test_key.json.tmp").exists(),
            "Temporary file should be renamed away"
        );
    }

    #[test]
    fn test_save_then_load_returns_equal_record() {
        let (store, _temp_dir) = create_test_store();
        let original = TestData {
            name: "roundtrip".to_string(),
            value: 12345,
        };

        store.save(&original, "roundtrip").expect("Save should succeed");
        let loaded: TestData = store.load("roundtrip").expect("Load should succeed");

        assert_eq!(loaded, original);
    }

    #[test]
    fn test_load_missing_is_not_found() {
        let (store, _temp_dir) = create_test_store();

        let result: Result<TestData, _> = store.load("nonexistent");

        assert!(result.unwrap_err().is_not_found());
    }

    #[test]
    fn test_load_wrong_kind_is_corrupted() {
        let (store, _temp_dir) = create_test_store();
        store
            .save(&OtherData { flag: true }, "mixed")
            .expect("Save should succeed");

        let err = store.load::<TestData>("mixed").unwrap_err();

        assert!(err.is_corrupted());
        assert!(err.to_string().contains("expected a test_data record"));
    }

    #[test]
    fn test_load_garbage_is_corrupted() {
        let (store, temp_dir) = create_test_store();
        fs::write(temp_dir.path().join("garbage.json"), b"\xac\xed\x00\x05sr").unwrap();

        let err = store.load::<TestData>("garbage").unwrap_err();

        assert!(err.is_corrupted());
    }

    #[test]
    fn test_load_wrong_payload_shape_is_corrupted() {
        let (store, temp_dir) = create_test_store();
        fs::write(
            temp_dir.path().join("shape.json"),
            r#"{"format":1,"kind":"test_data","saved_at":"2026-01-01T00:00:00Z","data":[1,2,3]}"#,
        )
        .unwrap();

        let err = store.load::<TestData>("shape").unwrap_err();

        assert!(err.is_corrupted());
    }

    #[test]
    fn test_load_unknown_format_version_is_corrupted() {
        let (store, temp_dir) = create_test_store();
        fs::write(
            temp_dir.path().join("future.json"),
            r#"{"format":9,"kind":"test_data","saved_at":"2026-01-01T00:00:00Z","data":{"name":"x","value":1}}"#,
        )
        .unwrap();

        let err = store.load::<TestData>("future").unwrap_err();

        assert!(err.to_string().contains("unsupported format version 9"));
    }

    #[test]
    fn test_load_stored_reports_saved_at() {
        let (store, _temp_dir) = create_test_store();
        let before = Utc::now();
        store
            .save(&TestData { name: "t".into(), value: 1 }, "stamped")
            .unwrap();
        let after = Utc::now();

        let stored: Stored<TestData> = store.load_stored("stamped").unwrap();

        assert!(stored.saved_at >= before);
        assert!(stored.saved_at <= after);
    }

    #[test]
    fn test_save_creates_directory_if_missing() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let nested_path = temp_dir.path().join("nested").join("history");
        let store = RecordStore::new(nested_path.clone());

        store
            .save(&TestData { name: "nested".into(), value: 1 }, "nested_key")
            .expect("Save should succeed");

        assert!(nested_path.join("nested_key.json").exists());
    }

    #[test]
    fn test_failed_save_keeps_previous_file() {
        let (store, temp_dir) = create_test_store();
        let first = TestData {
            name: "first".into(),
            value: 1,
        };
        store.save(&first, "kept").unwrap();

        // Block the temporary path so the write cannot start
        fs::create_dir(temp_dir.path().join("kept.json.tmp")).unwrap();
        let result = store.save(&TestData { name: "second".into(), value: 2 }, "kept");

        assert!(result.is_err());
        let loaded: TestData = store.load("kept").unwrap();
        assert_eq!(loaded, first);
    }

    #[test]
    fn test_overwrite_existing_record() {
        let (store, _temp_dir) = create_test_store();
        let data1 = TestData {
            name: "first".to_string(),
            value: 1,
        };
        let data2 = TestData {
            name: "second".to_string(),
            value: 2,
        };

        store.save(&data1, "overwrite_key").unwrap();
        store.save(&data2, "overwrite_key").unwrap();

        let loaded: TestData = store.load("overwrite_key").unwrap();
        assert_eq!(loaded, data2, "Store should contain latest data");
    }

    #[test]
    fn test_delete_removes_file_and_reports_missing() {
        let (store, _temp_dir) = create_test_store();
        store
            .save(&TestData { name: "gone".into(), value: 0 }, "gone")
            .unwrap();

        store.delete("gone").expect("First delete should succeed");
        assert!(!store.exists("gone"));

        let second = store.delete("gone");
        assert!(second.unwrap_err().is_not_found());
    }
}
