use std::collections::HashMap;
use std::sync::Arc;

use tracing::warn;

use crate::core::error::ChatError;
use crate::providers::{self, DEFAULT_GATEWAY_URL, FALLBACK_PROVIDER};
use crate::storage::KeyValueStore;

const API_KEYS_STORE_KEY: &str = "api_keys";
const BASE_URLS_STORE_KEY: &str = "base_urls";

/// Per-provider API keys and base-URL overrides, persisted through the
/// key/value store. An empty key means "not configured". Base URLs may
/// be overridden per provider; unset providers use the shared gateway.
pub struct CredentialStore {
    store: Arc<dyn KeyValueStore>,
    api_keys: HashMap<String, String>,
    base_urls: HashMap<String, String>,
}

impl CredentialStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        let api_keys = load_map(store.as_ref(), API_KEYS_STORE_KEY);
        let base_urls = load_map(store.as_ref(), BASE_URLS_STORE_KEY);
        let mut credentials = Self {
            store,
            api_keys,
            base_urls,
        };
        credentials.seed_known_providers();
        credentials
    }

    // Every allowlisted provider gets a row so display snapshots are
    // complete even before anything is configured.
    fn seed_known_providers(&mut self) {
        for provider in providers::provider_ids() {
            self.api_keys.entry(provider.to_string()).or_default();
            self.base_urls
                .entry(provider.to_string())
                .or_insert_with(|| DEFAULT_GATEWAY_URL.to_string());
        }
    }

    /// Returns `""` when no key is configured. Never fails.
    pub fn key(&self, provider: &str) -> String {
        self.api_keys
            .get(&provider.to_lowercase())
            .cloned()
            .unwrap_or_default()
    }

    /// Overwrites and persists. Keys are stored as given; no format
    /// validation is applied.
    pub fn set_key(&mut self, provider: &str, key: &str) -> Result<(), ChatError> {
        self.api_keys
            .insert(provider.to_lowercase(), key.to_string());
        self.store
            .save(API_KEYS_STORE_KEY, &serde_json::to_string(&self.api_keys)?)
    }

    /// The provider's override when set, else the shared gateway URL.
    pub fn base_url(&self, provider: &str) -> String {
        self.base_urls
            .get(&provider.to_lowercase())
            .filter(|url| !url.trim().is_empty())
            .cloned()
            .unwrap_or_else(|| DEFAULT_GATEWAY_URL.to_string())
    }

    /// Stores a per-provider gateway override. A blank url clears the
    /// override back to the shared gateway.
    pub fn set_base_url(&mut self, provider: &str, url: &str) -> Result<(), ChatError> {
        let url = url.trim();
        let value = if url.is_empty() {
            DEFAULT_GATEWAY_URL.to_string()
        } else {
            url.trim_end_matches('/').to_string()
        };
        self.base_urls.insert(provider.to_lowercase(), value);
        self.store.save(
            BASE_URLS_STORE_KEY,
            &serde_json::to_string(&self.base_urls)?,
        )
    }

    pub fn all_keys(&self) -> HashMap<String, String> {
        self.api_keys.clone()
    }

    pub fn all_base_urls(&self) -> HashMap<String, String> {
        self.base_urls.clone()
    }

    /// Key used when dispatching for `provider`: the provider's own key
    /// when set, otherwise the fallback provider's key. Errors when
    /// neither is configured, so callers abort before any network call.
    pub fn resolve_key(&self, provider: &str) -> Result<String, ChatError> {
        let key = self.key(provider);
        if !key.is_empty() {
            return Ok(key);
        }
        let fallback = self.key(FALLBACK_PROVIDER);
        if !fallback.is_empty() {
            return Ok(fallback);
        }
        Err(ChatError::MissingCredential(providers::display_name(
            provider,
        )))
    }
}

fn load_map(store: &dyn KeyValueStore, key: &str) -> HashMap<String, String> {
    let raw = match store.load(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return HashMap::new(),
        Err(err) => {
            warn!(key, %err, "could not load persisted credentials");
            return HashMap::new();
        }
    };
    match serde_json::from_str(&raw) {
        Ok(map) => map,
        Err(err) => {
            warn!(key, %err, "could not parse persisted credentials");
            HashMap::new()
        }
    }
}
