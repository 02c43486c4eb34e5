pub mod client;
pub mod wire;

/// The shared gateway every provider defaults to unless overridden.
pub const DEFAULT_GATEWAY_URL: &str = "https://openrouter.ai/api/v1";

/// Provider used as the credential fallback when a model's own provider
/// has no key configured.
pub const FALLBACK_PROVIDER: &str = "openrouter";

/// Static metadata for one upstream provider. Consulted by the credential
/// store, the registry allowlist and any presentation layer, so the
/// per-provider knowledge lives in exactly one table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderInfo {
    pub id: &'static str,
    pub display_name: &'static str,
    pub docs_url: &'static str,
    pub default_base_url: &'static str,
    /// Typical key prefix, shown as an input hint. Never validated.
    pub key_prefix: Option<&'static str>,
}

pub const PROVIDERS: &[ProviderInfo] = &[
    ProviderInfo {
        id: "openai",
        display_name: "OpenAI",
        docs_url: "https://platform.openai.com/api-keys",
        default_base_url: DEFAULT_GATEWAY_URL,
        key_prefix: Some("sk-"),
    },
    ProviderInfo {
        id: "anthropic",
        display_name: "Anthropic",
        docs_url: "https://console.anthropic.com/keys",
        default_base_url: DEFAULT_GATEWAY_URL,
        key_prefix: Some("sk-ant-"),
    },
    ProviderInfo {
        id: "google",
        display_name: "Google",
        docs_url: "https://aistudio.google.com/app/apikey",
        default_base_url: DEFAULT_GATEWAY_URL,
        key_prefix: Some("AIza"),
    },
    ProviderInfo {
        id: "meta",
        display_name: "Meta",
        docs_url: "https://llama.meta.com/get-started",
        default_base_url: DEFAULT_GATEWAY_URL,
        key_prefix: None,
    },
    ProviderInfo {
        id: "deepseek",
        display_name: "DeepSeek",
        docs_url: "https://platform.deepseek.com/",
        default_base_url: DEFAULT_GATEWAY_URL,
        key_prefix: Some("sk-"),
    },
    ProviderInfo {
        id: "openrouter",
        display_name: "OpenRouter",
        docs_url: "https://openrouter.ai/keys",
        default_base_url: DEFAULT_GATEWAY_URL,
        key_prefix: Some("sk-or-"),
    },
];

/// Look up a provider by id, case-insensitively.
pub fn find_provider(id: &str) -> Option<&'static ProviderInfo> {
    PROVIDERS.iter().find(|p| p.id.eq_ignore_ascii_case(id))
}

pub fn is_allowed_provider(id: &str) -> bool {
    find_provider(id).is_some()
}

/// Lowercase ids of every known provider, in table order.
pub fn provider_ids() -> Vec<&'static str> {
    PROVIDERS.iter().map(|p| p.id).collect()
}

pub fn display_name(id: &str) -> String {
    match find_provider(id) {
        Some(info) => info.display_name.to_string(),
        // Unknown providers fall back to a capitalized id for display
        None => {
            let mut chars = id.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        }
    }
}
