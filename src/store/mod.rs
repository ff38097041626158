//! Persistent storage for the search history and API keys
//!
//! Everything lives under one data directory:
//!
//! ```text
//! <data_dir>/
//!   index.json          word -> entry id
//!   keys.json           provider -> API key
//!   history/<ID>.json   one cached result per word
//! ```
//!
//! All files share the envelope format described in [`record`].

mod credentials;
mod entry;
mod error;
mod id;
mod index;
pub mod record;

pub use credentials::{CredentialRecord, CredentialStore, ProviderLabel, CREDENTIALS_FILE};
pub use entry::{CacheEntry, EntryStore, ENTRY_DIR};
pub use error::StoreError;
pub use id::{IdGenerator, DEFAULT_ALPHABET, DEFAULT_ID_LENGTH};
pub use index::{ClearSummary, Index, IndexRecord, Lookup, SearchError, SearchOutcome, INDEX_FILE};
pub use record::{Record, RecordStore, Stored};
