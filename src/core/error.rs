use std::io;
use thiserror::Error;

/// Unified error type for the chat core
#[derive(Error, Debug)]
pub enum ChatError {
    /// Adding a model whose provider is outside the allowlist
    #[error("Invalid provider: {0}")]
    InvalidProvider(String),

    /// Adding a model whose id is already in the catalog
    #[error("A model with id '{0}' already exists")]
    DuplicateModel(String),

    /// Activating a model id that is not in the catalog
    #[error("Unknown model: {0}")]
    UnknownModel(String),

    /// No resolvable API key for a model's provider, after fallback
    #[error("API key not set for {0}. Please configure your API key in the settings.")]
    MissingCredential(String),

    /// Non-success HTTP status from the gateway, carrying the upstream message when available
    #[error("API error: {0}")]
    ProviderApi(String),

    /// A 2xx response whose body does not match the expected shape
    #[error("Malformed response from gateway: {0}")]
    MalformedResponse(String),

    /// Transport-level failures (DNS, timeout, connection reset)
    #[error("Network error: {0}")]
    Network(String),

    /// A submit while the same chat already has a send in flight
    #[error("A message is already being sent for this chat")]
    SendInProgress,

    /// Persistent store failures
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// IO-related errors
    #[error("IO error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl From<reqwest::Error> for ChatError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ChatError::Network(format!("Request timed out: {}", err))
        } else if err.is_connect() {
            ChatError::Network(format!("Connection failed: {}", err))
        } else if err.is_status() {
            ChatError::ProviderApi(format!("API returned error status: {}", err))
        } else {
            ChatError::Network(format!("Request failed: {}", err))
        }
    }
}

impl From<serde_json::Error> for ChatError {
    fn from(err: serde_json::Error) -> Self {
        ChatError::Serialization(format!("JSON error: {}", err))
    }
}

impl From<serde_yml::Error> for ChatError {
    fn from(err: serde_yml::Error) -> Self {
        ChatError::Serialization(format!("YAML error: {}", err))
    }
}
