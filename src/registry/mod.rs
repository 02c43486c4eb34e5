use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::core::error::ChatError;
use crate::providers;
use crate::storage::KeyValueStore;

const MODELS_STORE_KEY: &str = "available_models";
const ACTIVE_MODEL_STORE_KEY: &str = "active_model";

/// One selectable model in the catalog. `id` is always prefixed with the
/// lowercase provider plus a slash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    pub id: String,
    pub display_name: String,
    pub provider: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl ModelDescriptor {
    pub fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
        provider: impl Into<String>,
        description: Option<String>,
    ) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            provider: provider.into(),
            description,
        }
    }
}

fn default_catalog() -> Vec<ModelDescriptor> {
    vec![
        ModelDescriptor::new(
            "openai/gpt-4o",
            "GPT-4o",
            "openai",
            Some("Most capable model for complex tasks".to_string()),
        ),
        ModelDescriptor::new(
            "openai/gpt-4o-mini",
            "GPT-4o Mini",
            "openai",
            Some("Smaller and faster version of GPT-4o".to_string()),
        ),
        ModelDescriptor::new(
            "openai/gpt-3.5-turbo",
            "GPT-3.5 Turbo",
            "openai",
            Some("Fast and cost-effective model".to_string()),
        ),
        ModelDescriptor::new(
            "deepseek/deepseek-v2",
            "Deepseek R1",
            "deepseek",
            Some("Latest model from Deepseek AI".to_string()),
        ),
    ]
}

/// Catalog of known models plus the active selection, persisted through
/// the key/value store. Insertion order is preserved.
pub struct ModelRegistry {
    store: Arc<dyn KeyValueStore>,
    models: Vec<ModelDescriptor>,
    active_id: String,
}

impl ModelRegistry {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        let mut models = load_models(store.as_ref());

        // Persisted entries whose provider fell out of the allowlist are
        // dropped rather than carried forward.
        let before = models.len();
        models.retain(|m| providers::is_allowed_provider(&m.provider));
        if models.len() < before {
            warn!(
                dropped = before - models.len(),
                "dropped persisted models with disallowed providers"
            );
        }
        if models.is_empty() {
            models = default_catalog();
        }

        let active_id = store
            .load(ACTIVE_MODEL_STORE_KEY)
            .ok()
            .flatten()
            .filter(|id| models.iter().any(|m| &m.id == id))
            .unwrap_or_else(|| models[0].id.clone());

        Self {
            store,
            models,
            active_id,
        }
    }

    /// Current catalog, insertion order preserved.
    pub fn list(&self) -> &[ModelDescriptor] {
        &self.models
    }

    /// Display-oriented view of the catalog keyed by provider. Grouping
    /// is a view concern; storage order is untouched.
    pub fn grouped(&self) -> BTreeMap<String, Vec<&ModelDescriptor>> {
        let mut groups: BTreeMap<String, Vec<&ModelDescriptor>> = BTreeMap::new();
        for model in &self.models {
            groups
                .entry(model.provider.to_lowercase())
                .or_default()
                .push(model);
        }
        groups
    }

    /// Adds a model to the catalog and persists it. Ids that do not carry
    /// the `provider/` prefix are corrected by prefixing.
    pub fn add(&mut self, mut descriptor: ModelDescriptor) -> Result<(), ChatError> {
        if !providers::is_allowed_provider(&descriptor.provider) {
            return Err(ChatError::InvalidProvider(descriptor.provider));
        }
        descriptor.provider = descriptor.provider.to_lowercase();

        let prefix = format!("{}/", descriptor.provider);
        if !descriptor.id.starts_with(&prefix) {
            descriptor.id = format!("{}{}", prefix, descriptor.id);
        }
        if self.models.iter().any(|m| m.id == descriptor.id) {
            return Err(ChatError::DuplicateModel(descriptor.id));
        }

        self.models.push(descriptor);
        self.persist_models()
    }

    /// Removes a model; absent ids are a no-op. Removing the active model
    /// moves the selection to the first remaining entry.
    pub fn remove(&mut self, id: &str) -> Result<(), ChatError> {
        let before = self.models.len();
        self.models.retain(|m| m.id != id);
        if self.models.len() == before {
            return Ok(());
        }

        if self.active_id == id {
            if let Some(first) = self.models.first() {
                self.active_id = first.id.clone();
            } else {
                self.active_id.clear();
            }
            self.persist_active()?;
        }
        self.persist_models()
    }

    pub fn set_active(&mut self, id: &str) -> Result<(), ChatError> {
        if !self.models.iter().any(|m| m.id == id) {
            return Err(ChatError::UnknownModel(id.to_string()));
        }
        self.active_id = id.to_string();
        self.persist_active()
    }

    pub fn active(&self) -> Result<&ModelDescriptor, ChatError> {
        self.models
            .iter()
            .find(|m| m.id == self.active_id)
            .ok_or_else(|| ChatError::UnknownModel(self.active_id.clone()))
    }

    fn persist_models(&self) -> Result<(), ChatError> {
        self.store
            .save(MODELS_STORE_KEY, &serde_json::to_string(&self.models)?)
    }

    fn persist_active(&self) -> Result<(), ChatError> {
        self.store.save(ACTIVE_MODEL_STORE_KEY, &self.active_id)
    }
}

fn load_models(store: &dyn KeyValueStore) -> Vec<ModelDescriptor> {
    let raw = match store.load(MODELS_STORE_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return Vec::new(),
        Err(err) => {
            warn!(%err, "could not load persisted model catalog");
            return Vec::new();
        }
    };
    match serde_json::from_str(&raw) {
        Ok(models) => models,
        Err(err) => {
            warn!(%err, "could not parse persisted model catalog");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{KeyValueStore, MemoryStore};

    fn fresh_registry() -> ModelRegistry {
        ModelRegistry::new(Arc::new(MemoryStore::new()))
    }

    fn claude_sonnet() -> ModelDescriptor {
        ModelDescriptor::new(
            "anthropic/claude-3.5-sonnet",
            "Claude 3.5 Sonnet",
            "anthropic",
            None,
        )
    }

    #[test]
    fn starts_with_the_default_catalog() {
        let registry = fresh_registry();
        assert_eq!(registry.list().len(), 4);
        assert_eq!(registry.active().unwrap().id, "openai/gpt-4o");
    }

    #[test]
    fn add_appends_in_order_and_persists() {
        let shared: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        {
            let mut registry = ModelRegistry::new(shared.clone());
            registry.add(claude_sonnet()).unwrap();
            assert_eq!(registry.list().last().unwrap().id, "anthropic/claude-3.5-sonnet");
        }
        let reloaded = ModelRegistry::new(shared);
        assert!(reloaded.list().iter().any(|m| m.id == "anthropic/claude-3.5-sonnet"));
    }

    #[test]
    fn add_rejects_duplicates_and_unknown_providers() {
        let mut registry = fresh_registry();
        let err = registry
            .add(ModelDescriptor::new("openai/gpt-4o", "GPT-4o", "openai", None))
            .unwrap_err();
        assert!(matches!(err, ChatError::DuplicateModel(_)));

        let err = registry
            .add(ModelDescriptor::new("mistral/large", "Large", "mistral", None))
            .unwrap_err();
        assert!(matches!(err, ChatError::InvalidProvider(_)));
        assert_eq!(registry.list().len(), 4);
    }

    #[test]
    fn add_prefixes_ids_missing_the_provider_prefix() {
        let mut registry = fresh_registry();
        registry
            .add(ModelDescriptor::new("claude-3-opus", "Claude 3 Opus", "Anthropic", None))
            .unwrap();
        let added = registry.list().last().unwrap();
        assert_eq!(added.id, "anthropic/claude-3-opus");
        assert_eq!(added.provider, "anthropic");
    }

    #[test]
    fn every_catalog_id_carries_its_provider_prefix() {
        let mut registry = fresh_registry();
        registry.add(claude_sonnet()).unwrap();
        for model in registry.list() {
            assert!(model.id.starts_with(&format!("{}/", model.provider.to_lowercase())));
        }
    }

    #[test]
    fn remove_of_absent_id_is_a_no_op() {
        let mut registry = fresh_registry();
        registry.remove("openai/does-not-exist").unwrap();
        assert_eq!(registry.list().len(), 4);
    }

    #[test]
    fn removing_the_active_model_reassigns_to_first_remaining() {
        let mut registry = fresh_registry();
        registry.set_active("deepseek/deepseek-v2").unwrap();
        registry.remove("deepseek/deepseek-v2").unwrap();

        let active = registry.active().unwrap();
        assert_ne!(active.id, "deepseek/deepseek-v2");
        assert_eq!(active.id, registry.list()[0].id);
    }

    #[test]
    fn set_active_rejects_unknown_ids_and_keeps_prior_selection() {
        let mut registry = fresh_registry();
        let err = registry.set_active("openai/no-such-model").unwrap_err();
        assert!(matches!(err, ChatError::UnknownModel(_)));
        assert_eq!(registry.active().unwrap().id, "openai/gpt-4o");
    }

    #[test]
    fn persisted_active_selection_survives_a_reload() {
        let shared: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        {
            let mut registry = ModelRegistry::new(shared.clone());
            registry.set_active("openai/gpt-4o-mini").unwrap();
        }
        let reloaded = ModelRegistry::new(shared);
        assert_eq!(reloaded.active().unwrap().id, "openai/gpt-4o-mini");
    }

    #[test]
    fn persisted_models_with_disallowed_providers_are_dropped_on_load() {
        let shared: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let persisted = serde_json::json!([
            { "id": "openai/gpt-4o", "display_name": "GPT-4o", "provider": "openai" },
            { "id": "mystery/model-x", "display_name": "Model X", "provider": "mystery" }
        ]);
        shared
            .save(MODELS_STORE_KEY, &persisted.to_string())
            .unwrap();

        let registry = ModelRegistry::new(shared);
        assert_eq!(registry.list().len(), 1);
        assert_eq!(registry.list()[0].id, "openai/gpt-4o");
    }

    #[test]
    fn grouped_view_keys_by_lowercase_provider() {
        let mut registry = fresh_registry();
        registry.add(claude_sonnet()).unwrap();
        let groups = registry.grouped();
        assert_eq!(groups["openai"].len(), 3);
        assert_eq!(groups["deepseek"].len(), 1);
        assert_eq!(groups["anthropic"].len(), 1);
    }
}
