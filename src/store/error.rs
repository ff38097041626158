//! Store error types
//!
//! Every persistence operation in the crate reports failures through
//! [`StoreError`]. The variants mirror how callers react: a missing file, a
//! file the process may not read, a file whose bytes cannot be decoded, or
//! any other I/O failure.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors that can occur when reading or writing persisted records
#[derive(Debug, Error)]
pub enum StoreError {
    /// The file, word or credential does not exist
    #[error("Not found: {target}")]
    NotFound { target: String },

    /// The process lacks permission to read or write the file
    #[error("Permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    /// The file exists but does not decode to the expected record
    #[error("Corrupted record in {path}: {reason}")]
    Corrupted { path: PathBuf, reason: String },

    /// Any other I/O failure
    #[error("I/O failure on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Every id the generator can produce is already taken
    #[error("Entry id space exhausted ({capacity} ids in use)")]
    IdSpaceExhausted { capacity: usize },

    /// A credential was empty after trimming
    #[error("Refusing to store an empty secret")]
    EmptySecret,
}

impl StoreError {
    /// Classifies an I/O error against the path it happened on
    pub fn from_io(path: &Path, source: io::Error) -> Self {
        match source.kind() {
            io::ErrorKind::NotFound => StoreError::NotFound {
                target: path.display().to_string(),
            },
            io::ErrorKind::PermissionDenied => StoreError::PermissionDenied {
                path: path.to_path_buf(),
            },
            _ => StoreError::Io {
                path: path.to_path_buf(),
                source,
            },
        }
    }

    /// Creates a `NotFound` error for a missing key such as a word
    pub fn not_found(target: impl Into<String>) -> Self {
        StoreError::NotFound {
            target: target.into(),
        }
    }

    /// Creates a `Corrupted` error for the given path
    pub fn corrupted(path: &Path, reason: impl Into<String>) -> Self {
        StoreError::Corrupted {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }

    pub fn is_corrupted(&self) -> bool {
        matches!(self, StoreError::Corrupted { .. })
    }

    pub fn is_permission_denied(&self) -> bool {
        matches!(self, StoreError::PermissionDenied { .. })
    }
}
