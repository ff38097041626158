//! Dictionary providers
//!
//! A provider answers two questions about a word: its definitions and its
//! synonyms. The index asks for synonyms only after definitions succeed.

pub mod wordnik;

pub use wordnik::WordnikClient;

use thiserror::Error;

/// Errors that can occur when querying a dictionary provider
#[derive(Debug, Error)]
pub enum ProviderError {
    /// No API key is stored for the provider
    #[error("No API key stored for {provider}")]
    MissingApiKey { provider: &'static str },

    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// Failed to parse JSON response
    #[error("Failed to parse JSON response: {0}")]
    ParseError(#[from] serde_json::Error),

    /// The request URL could not be built
    #[error("Invalid request URL: {0}")]
    InvalidUrl(String),

    /// The provider rejected the request as malformed (HTTP 400)
    #[error("Bad request")]
    BadRequest,

    /// The API key was rejected (HTTP 401)
    #[error("Invalid credentials, check that the API key is valid")]
    InvalidCredentials,

    /// Too many requests (HTTP 429)
    #[error("Too many requests, try again later")]
    RateLimited,

    /// Any other non-success status
    #[error("Unexpected response status: {0}")]
    UnexpectedStatus(u16),
}

/// A remote source of definitions and synonyms
///
/// `Ok(None)` means the provider answered but knows nothing about the word.
#[allow(async_fn_in_trait)]
pub trait Dictionary {
    /// Definitions of `word`, in provider order
    async fn definitions(&self, word: &str) -> Result<Option<Vec<String>>, ProviderError>;

    /// Synonyms of `word`, joined with `", "`
    async fn synonyms(&self, word: &str) -> Result<Option<String>, ProviderError>;
}
