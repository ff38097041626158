//! Credential store for dictionary provider API keys
//!
//! Holds one record mapping a provider label to its secret. The whole record
//! is rewritten on every change, in `<data_dir>/keys.json`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use super::record::{Record, RecordStore};
use super::StoreError;

/// Record name of the credential file
pub const CREDENTIALS_FILE: &str = "keys";

/// Dictionary providers a secret can be stored for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderLabel {
    /// Wordnik REST API, v4
    Wordnik,
}

impl ProviderLabel {
    /// Label as stored on disk
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Wordnik => "wordnik",
        }
    }

    /// Parses a stored or user-supplied label, ignoring case
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "wordnik" => Some(Self::Wordnik),
            _ => None,
        }
    }

    /// Human-readable provider name
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Wordnik => "Wordnik",
        }
    }
}

impl fmt::Display for ProviderLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The persisted label → secret mapping
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialRecord {
    pub entries: BTreeMap<ProviderLabel, String>,
}

impl Record for CredentialRecord {
    const KIND: &'static str = "credentials";
}

/// Durable store of provider secrets
///
/// Construct it with [`CredentialStore::open`]. When persisting a change
/// fails the in-memory copy is marked stale and the next access reloads
/// the file, so memory never drifts from what is on disk.
#[derive(Debug)]
pub struct CredentialStore {
    records: RecordStore,
    record: CredentialRecord,
    stale: bool,
}

impl CredentialStore {
    /// Loads the credential file from `data_dir`, creating it if absent
    ///
    /// # Returns
    /// * `Ok(CredentialStore)` - Loaded or freshly created store
    /// * `Err(StoreError::PermissionDenied)` - The file exists but cannot be read
    /// * `Err(StoreError::Corrupted)` - The file cannot be decoded; see [`CredentialStore::reset`]
    pub fn open(data_dir: &Path) -> Result<Self, StoreError> {
        let records = RecordStore::new(data_dir);

        let record = match records.load::<CredentialRecord>(CREDENTIALS_FILE) {
            Ok(record) => {
                tracing::debug!(count = record.entries.len(), "loaded credentials");
                record
            }
            Err(StoreError::NotFound { .. }) => {
                let record = CredentialRecord::default();
                records.save(&record, CREDENTIALS_FILE)?;
                tracing::info!(
                    path = %records.path_for(CREDENTIALS_FILE).display(),
                    "created credential file"
                );
                record
            }
            Err(err) => return Err(err),
        };

        Ok(Self {
            records,
            record,
            stale: false,
        })
    }

    /// Overwrites the credential file in `data_dir` with an empty store
    pub fn reset(data_dir: &Path) -> Result<Self, StoreError> {
        let records = RecordStore::new(data_dir);
        let record = CredentialRecord::default();
        records.save(&record, CREDENTIALS_FILE)?;
        tracing::warn!(
            path = %records.path_for(CREDENTIALS_FILE).display(),
            "credential file reset"
        );

        Ok(Self {
            records,
            record,
            stale: false,
        })
    }

    /// Path of the backing file
    pub fn path(&self) -> PathBuf {
        self.records.path_for(CREDENTIALS_FILE)
    }

    /// Returns the secret stored for `label`
    pub fn get(&mut self, label: ProviderLabel) -> Option<String> {
        self.reconcile();
        self.record.entries.get(&label).cloned()
    }

    /// Labels that currently have a secret
    pub fn labels(&mut self) -> Vec<ProviderLabel> {
        self.reconcile();
        self.record.entries.keys().copied().collect()
    }

    /// Stores `secret` for `label`, trimming surrounding whitespace
    ///
    /// Any previous secret for the label is replaced.
    pub fn set(&mut self, label: ProviderLabel, secret: &str) -> Result<(), StoreError> {
        let secret = secret.trim();
        if secret.is_empty() {
            return Err(StoreError::EmptySecret);
        }

        self.reconcile();
        self.record.entries.insert(label, secret.to_string());
        self.persist()?;
        tracing::info!(provider = %label, "api key stored");
        Ok(())
    }

    /// Removes the secret for `label`
    ///
    /// # Returns
    /// * `Err(StoreError::NotFound)` - No secret is stored for `label`
    pub fn remove(&mut self, label: ProviderLabel) -> Result<(), StoreError> {
        self.reconcile();
        if self.record.entries.remove(&label).is_none() {
            return Err(StoreError::not_found(label.as_str()));
        }

        self.persist()?;
        tracing::info!(provider = %label, "api key removed");
        Ok(())
    }

    fn persist(&mut self) -> Result<(), StoreError> {
        match self.records.save(&self.record, CREDENTIALS_FILE) {
            Ok(()) => {
                self.stale = false;
                Ok(())
            }
            Err(err) => {
                self.stale = true;
                Err(err)
            }
        }
    }

    /// Reloads from disk after a failed persist
    fn reconcile(&mut self) {
        if !self.stale {
            return;
        }

        match self.records.load::<CredentialRecord>(CREDENTIALS_FILE) {
            Ok(record) => {
                self.record = record;
                self.stale = false;
                tracing::debug!("credentials reloaded from disk");
            }
            Err(err) => {
                tracing::warn!(error = %err, "could not reload credentials");
            }
        }
    }
}
