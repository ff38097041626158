//! Integration tests for the search history through the public library API

use std::fs;
use tempfile::TempDir;

use powerdict::provider::{Dictionary, ProviderError};
use powerdict::store::{
    CacheEntry, CredentialStore, IdGenerator, Index, Lookup, ProviderLabel, SearchOutcome,
    ENTRY_DIR,
};

/// Answers every word with the same canned result
struct FixedDictionary;

impl Dictionary for FixedDictionary {
    async fn definitions(&self, word: &str) -> Result<Option<Vec<String>>, ProviderError> {
        if word == "gregarious" {
            Ok(Some(vec!["fond of company".to_string()]))
        } else {
            Ok(None)
        }
    }

    async fn synonyms(&self, _word: &str) -> Result<Option<String>, ProviderError> {
        Ok(Some("sociable, outgoing".to_string()))
    }
}

#[tokio::test]
async fn test_gregarious_is_cached_across_sessions() {
    let temp_dir = TempDir::new().unwrap();

    let mut index = Index::open(temp_dir.path(), IdGenerator::with_seed(11)).unwrap();
    let outcome = index.search("gregarious", &FixedDictionary).await.unwrap();
    match outcome {
        SearchOutcome::Fetched { entry, cache_error } => {
            assert!(cache_error.is_none());
            assert_eq!(entry.definitions, vec!["fond of company".to_string()]);
            assert_eq!(entry.synonyms, "sociable, outgoing");
        }
        other => panic!("expected a fetched result, got {:?}", other),
    }
    index.close().unwrap();

    let index = Index::open(temp_dir.path(), IdGenerator::with_seed(12)).unwrap();
    assert_eq!(index.list().collect::<Vec<_>>(), vec!["gregarious"]);

    let id = index.entry_id("gregarious").unwrap();
    assert_eq!(id.len(), 6);
    assert!(id.chars().all(|c| c.is_ascii_uppercase()));
    assert!(temp_dir.path().join(ENTRY_DIR).join(format!("{}.json", id)).is_file());

    match index.lookup("gregarious").unwrap() {
        Lookup::Hit(stored) => assert_eq!(stored.record.word, "gregarious"),
        Lookup::Miss => panic!("expected a cache hit"),
    }
}

#[tokio::test]
async fn test_unknown_word_is_not_cached() {
    let temp_dir = TempDir::new().unwrap();
    let mut index = Index::open(temp_dir.path(), IdGenerator::with_seed(3)).unwrap();

    let outcome = index.search("qwxzv", &FixedDictionary).await.unwrap();

    assert!(matches!(outcome, SearchOutcome::NotFound));
    assert!(index.is_empty());
}

#[test]
fn test_remove_all_leaves_word_with_predeleted_entry() {
    let temp_dir = TempDir::new().unwrap();
    let mut index = Index::open(temp_dir.path(), IdGenerator::with_seed(8)).unwrap();
    for word in ["alpha", "beta", "gamma"] {
        index.insert(CacheEntry::new(word, vec![format!("{} def", word)], "")).unwrap();
    }
    let beta_id = index.entry_id("beta").unwrap().to_string();
    fs::remove_file(temp_dir.path().join(ENTRY_DIR).join(format!("{}.json", beta_id))).unwrap();

    let summary = index.remove_all().unwrap();

    assert!(summary.succeeded());
    assert!(!summary.is_complete());
    assert_eq!(summary.retained, vec!["beta".to_string()]);
    index.close().unwrap();

    let reopened = Index::open(temp_dir.path(), IdGenerator::with_seed(9)).unwrap();
    assert_eq!(reopened.list().collect::<Vec<_>>(), vec!["beta"]);
}

#[test]
fn test_credentials_trim_and_remove() {
    let temp_dir = TempDir::new().unwrap();
    {
        let mut store = CredentialStore::open(temp_dir.path()).unwrap();
        store.set(ProviderLabel::Wordnik, "  abc123  ").unwrap();
    }

    let mut store = CredentialStore::open(temp_dir.path()).unwrap();
    assert_eq!(store.get(ProviderLabel::Wordnik).as_deref(), Some("abc123"));

    store.remove(ProviderLabel::Wordnik).unwrap();
    assert!(store.remove(ProviderLabel::Wordnik).unwrap_err().is_not_found());

    let mut reopened = CredentialStore::open(temp_dir.path()).unwrap();
    assert!(reopened.get(ProviderLabel::Wordnik).is_none());
}
