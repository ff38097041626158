//! Wordnik API client
//!
//! This module fetches definitions and related words from the Wordnik v4
//! REST API and flattens the responses into the shapes the cache stores.

use reqwest::header::ACCEPT;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;

use super::{Dictionary, ProviderError};
use crate::store::{CredentialStore, ProviderLabel};

/// Base URL for the Wordnik word API
const WORDNIK_BASE_URL: &str = "https://api.wordnik.com/v4/word.json";

/// Maximum number of definitions requested
const DEFINITION_LIMIT: u32 = 100;

/// Dictionary definitions are drawn from
const SOURCE_DICTIONARIES: &str = "wordnet";

/// Maximum number of synonyms requested
const SYNONYM_LIMIT: u32 = 100;

/// A single definition from the definitions endpoint
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DefinitionItem {
    /// noun, verb, adjective, ...
    #[allow(dead_code)]
    part_of_speech: Option<String>,
    /// The definition itself; some sources omit it
    text: Option<String>,
}

/// A group of related words from the relatedWords endpoint
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RelatedWords {
    /// Always "synonym" given the query we send
    #[allow(dead_code)]
    relationship_type: Option<String>,
    #[serde(default)]
    words: Vec<String>,
}

/// Client for the Wordnik API
#[derive(Debug, Clone)]
pub struct WordnikClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl WordnikClient {
    /// Creates a client authenticating with `api_key`
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: WORDNIK_BASE_URL.to_string(),
        }
    }

    /// Creates a client using the Wordnik key held by `credentials`
    ///
    /// # Returns
    /// * `Err(ProviderError::MissingApiKey)` if no key is stored, in which
    ///   case no request should be attempted
    pub fn from_credentials(credentials: &mut CredentialStore) -> Result<Self, ProviderError> {
        credentials
            .get(ProviderLabel::Wordnik)
            .map(Self::new)
            .ok_or(ProviderError::MissingApiKey {
                provider: ProviderLabel::Wordnik.display_name(),
            })
    }

    /// Replaces the HTTP client
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    /// Overrides the base URL (for testing)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Builds `<base>/<word>/<resource>`, percent-encoding the word
    fn endpoint(&self, word: &str, resource: &str) -> Result<Url, ProviderError> {
        let mut url =
            Url::parse(&self.base_url).map_err(|e| ProviderError::InvalidUrl(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|()| ProviderError::InvalidUrl(self.base_url.clone()))?
            .push(&word.to_lowercase())
            .push(resource);
        Ok(url)
    }

    /// Sends a GET request and maps the status code
    ///
    /// # Returns
    /// * `Ok(Some(body))` on success
    /// * `Ok(None)` when Wordnik reports the word as not found
    async fn get(
        &self,
        url: Url,
        query: &[(&str, String)],
    ) -> Result<Option<String>, ProviderError> {
        tracing::debug!(url = %url, "querying wordnik");

        let response = self
            .client
            .get(url)
            .header(ACCEPT, "application/json")
            .query(query)
            .query(&[("api_key", self.api_key.as_str())])
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => Ok(Some(response.text().await?)),
            StatusCode::NOT_FOUND => Ok(None),
            StatusCode::BAD_REQUEST => Err(ProviderError::BadRequest),
            StatusCode::UNAUTHORIZED => Err(ProviderError::InvalidCredentials),
            StatusCode::TOO_MANY_REQUESTS => Err(ProviderError::RateLimited),
            other => Err(ProviderError::UnexpectedStatus(other.as_u16())),
        }
    }
}

impl Dictionary for WordnikClient {
    async fn definitions(&self, word: &str) -> Result<Option<Vec<String>>, ProviderError> {
        let url = self.endpoint(word, "definitions")?;
        let query = [
            ("limit", DEFINITION_LIMIT.to_string()),
            ("includeRelated", "false".to_string()),
            ("sourceDictionaries", SOURCE_DICTIONARIES.to_string()),
            ("useCanonical", "true".to_string()),
            ("includeTags", "false".to_string()),
        ];

        match self.get(url, &query).await? {
            Some(body) => Ok(Some(parse_definitions(&body)?)),
            None => Ok(None),
        }
    }

    async fn synonyms(&self, word: &str) -> Result<Option<String>, ProviderError> {
        let url = self.endpoint(word, "relatedWords")?;
        let query = [
            ("useCanonical", "true".to_string()),
            ("relationshipTypes", "synonym".to_string()),
            ("limitPerRelationshipType", SYNONYM_LIMIT.to_string()),
        ];

        match self.get(url, &query).await? {
            Some(body) => Ok(Some(parse_synonyms(&body)?)),
            None => Ok(None),
        }
    }
}

/// Extracts the definition texts from a definitions response
fn parse_definitions(body: &str) -> Result<Vec<String>, serde_json::Error> {
    let items: Vec<DefinitionItem> = serde_json::from_str(body)?;
    Ok(items
        .into_iter()
        .filter_map(|item| item.text)
        .filter(|text| !text.trim().is_empty())
        .collect())
}

/// Joins every related word of a relatedWords response with ", "
fn parse_synonyms(body: &str) -> Result<String, serde_json::Error> {
    let groups: Vec<RelatedWords> = serde_json::from_str(body)?;
    Ok(groups
        .into_iter()
        .flat_map(|group| group.words)
        .collect::<Vec<_>>()
        .join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serves one canned HTTP response and returns the base URL to reach it
    async fn serve_once(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 4096];
            let mut request: Vec<u8> = Vec::new();
            while !request.windows(4).any(|w| w == &b"\r\n\r\n"[..]) {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
        });

        format!("http://{}/v4/word.json", addr)
    }

    fn local_client(api_key: &str, base_url: String) -> WordnikClient {
        let http = Client::builder().no_proxy().build().unwrap();
        WordnikClient::new(api_key)
            .with_client(http)
            .with_base_url(base_url)
    }

    #[test]
    fn test_parse_definitions_keeps_text_in_order() {
        let body = r#"[
            {"partOfSpeech": "adjective", "text": "tending to form a group with others of the same kind", "sourceDictionary": "wordnet"},
            {"partOfSpeech": "adjective", "sourceDictionary": "wordnet"},
            {"partOfSpeech": "adjective", "text": "seeking and enjoying the company of others"}
        ]"#;

        let definitions = parse_definitions(body).unwrap();

        assert_eq!(
            definitions,
            vec![
                "tending to form a group with others of the same kind".to_string(),
                "seeking and enjoying the company of others".to_string(),
            ]
        );
    }

    #[test]
    fn test_parse_synonyms_joins_all_groups() {
        let body = r#"[
            {"relationshipType": "synonym", "words": ["sociable", "outgoing"]},
            {"relationshipType": "synonym", "words": ["convivial"]}
        ]"#;

        assert_eq!(parse_synonyms(body).unwrap(), "sociable, outgoing, convivial");
    }

    #[test]
    fn test_parse_synonyms_empty_response() {
        assert_eq!(parse_synonyms("[]").unwrap(), "");
    }

    #[test]
    fn test_parse_definitions_rejects_non_array() {
        assert!(parse_definitions(r#"{"message": "error"}"#).is_err());
    }

    #[test]
    fn test_endpoint_lowercases_and_encodes_word() {
        let client = WordnikClient::new("key");

        let url = client.endpoint("Ice Cream", "definitions").unwrap();

        assert_eq!(
            url.as_str(),
            "https://api.wordnik.com/v4/word.json/ice%20cream/definitions"
        );
    }

    #[test]
    fn test_from_credentials_without_key_is_missing_api_key() {
        let temp_dir = TempDir::new().unwrap();
        let mut credentials = CredentialStore::open(temp_dir.path()).unwrap();

        let err = WordnikClient::from_credentials(&mut credentials).unwrap_err();

        assert!(matches!(err, ProviderError::MissingApiKey { provider: "Wordnik" }));
    }

    #[test]
    fn test_from_credentials_uses_stored_key() {
        let temp_dir = TempDir::new().unwrap();
        let mut credentials = CredentialStore::open(temp_dir.path()).unwrap();
        credentials.set(ProviderLabel::Wordnik, "abc123").unwrap();

        let client = WordnikClient::from_credentials(&mut credentials).unwrap();

        assert_eq!(client.api_key, "abc123");
    }

    #[tokio::test]
    async fn test_definitions_success() {
        let base_url = serve_once("200 OK", r#"[{"text": "fond of company"}]"#).await;
        let client = local_client("key", base_url);

        let definitions = client.definitions("gregarious").await.unwrap();

        assert_eq!(definitions, Some(vec!["fond of company".to_string()]));
    }

    #[tokio::test]
    async fn test_definitions_not_found_is_none() {
        let base_url = serve_once("404 Not Found", "{}").await;
        let client = local_client("key", base_url);

        assert!(client.definitions("qwxzv").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unauthorized_is_invalid_credentials() {
        let base_url = serve_once("401 Unauthorized", "{}").await;
        let client = local_client("bad", base_url);

        let err = client.synonyms("gregarious").await.unwrap_err();

        assert!(matches!(err, ProviderError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_too_many_requests_is_rate_limited() {
        let base_url = serve_once("429 Too Many Requests", "{}").await;
        let client = local_client("key", base_url);

        let err = client.definitions("gregarious").await.unwrap_err();

        assert!(matches!(err, ProviderError::RateLimited));
    }

    #[tokio::test]
    async fn test_unexpected_status_is_reported() {
        let base_url = serve_once("503 Service Unavailable", "{}").await;
        let client = local_client("key", base_url);

        let err = client.definitions("gregarious").await.unwrap_err();

        assert!(matches!(err, ProviderError::UnexpectedStatus(503)));
    }
}
