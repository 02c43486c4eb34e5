use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;

use crate::chat::{Chat, ConversationMessage, MessageRole};
use crate::config::CredentialStore;
use crate::core::error::ChatError;
use crate::providers::client::{Dispatcher, GatewayClient, SendOptions};
use crate::providers;
use crate::providers::wire::normalize;
use crate::registry::{ModelDescriptor, ModelRegistry};
use crate::storage::{FileStore, KeyValueStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Error,
}

/// Receives user-visible toasts for credential saves, model changes and
/// send failures. The UI layer implements this.
pub trait Notifier: Send + Sync {
    fn notify(&self, title: &str, description: &str, severity: Severity);
}

/// Default collaborator for embedders that render no toasts.
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify(&self, _title: &str, _description: &str, _severity: Severity) {}
}

/// Coordinates the registry, credential store and gateway client around a
/// list of conversations. One send may be in flight per chat; different
/// chats are independent. Errors come back as values rather than panics,
/// and a failed send never rolls back the user's own message.
pub struct ChatOrchestrator {
    registry: ModelRegistry,
    credentials: CredentialStore,
    dispatcher: Arc<dyn Dispatcher>,
    notifier: Arc<dyn Notifier>,
    chats: Vec<Chat>,
    current_id: Option<String>,
    in_flight: HashSet<String>,
}

impl ChatOrchestrator {
    pub fn new(
        registry: ModelRegistry,
        credentials: CredentialStore,
        dispatcher: Arc<dyn Dispatcher>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            registry,
            credentials,
            dispatcher,
            notifier,
            chats: Vec::new(),
            current_id: None,
            in_flight: HashSet::new(),
        }
    }

    /// Orchestrator over the file-backed store and the real gateway
    /// client, with toasts discarded.
    pub fn with_defaults() -> Self {
        let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::new());
        Self::new(
            ModelRegistry::new(store.clone()),
            CredentialStore::new(store),
            Arc::new(GatewayClient::new()),
            Arc::new(NullNotifier),
        )
    }

    // ----- chat list management -----

    /// Creates an empty chat and makes it current. Returns its id.
    pub fn new_chat(&mut self) -> String {
        let chat = Chat::new();
        let id = chat.id.clone();
        self.chats.insert(0, chat);
        self.current_id = Some(id.clone());
        id
    }

    pub fn chats(&self) -> &[Chat] {
        &self.chats
    }

    pub fn current_chat(&self) -> Option<&Chat> {
        let id = self.current_id.as_deref()?;
        self.chats.iter().find(|c| c.id == id)
    }

    /// Selects an existing chat; unknown ids leave the selection alone.
    pub fn select_chat(&mut self, id: &str) -> bool {
        if self.chats.iter().any(|c| c.id == id) {
            self.current_id = Some(id.to_string());
            true
        } else {
            false
        }
    }

    /// Deletes a chat. When the current chat goes away the selection
    /// falls to the first remaining chat, or a fresh one when none remain.
    pub fn delete_chat(&mut self, id: &str) {
        self.chats.retain(|c| c.id != id);
        self.in_flight.remove(id);
        if self.current_id.as_deref() == Some(id) {
            match self.chats.first() {
                Some(first) => self.current_id = Some(first.id.clone()),
                None => {
                    self.new_chat();
                }
            }
        }
    }

    pub fn clear_chats(&mut self) {
        self.chats.clear();
        self.in_flight.clear();
        self.new_chat();
    }

    // ----- sending -----

    /// Appends the user's message to the current chat and dispatches the
    /// full history to the gateway. The user message is visible before the
    /// network round-trip completes and stays in history on failure.
    ///
    /// Returns `Ok(None)` for a blank submit, `Ok(Some(reply))` once the
    /// assistant message has been appended.
    pub async fn submit(
        &mut self,
        text: &str,
        images: Vec<String>,
    ) -> Result<Option<String>, ChatError> {
        if text.trim().is_empty() && images.is_empty() {
            return Ok(None);
        }

        let chat_id = match self.current_id.clone() {
            Some(id) => id,
            None => self.new_chat(),
        };
        if self.in_flight.contains(&chat_id) {
            return Err(ChatError::SendInProgress);
        }

        // Optimistic append: the message shows up before dispatch resolves
        // and is deliberately not rolled back on failure.
        let wire = {
            let chat = self
                .chats
                .iter_mut()
                .find(|c| c.id == chat_id)
                .expect("current chat exists");
            chat.push(ConversationMessage::new(MessageRole::User, text, images));
            normalize(&chat.messages)
        };
        self.in_flight.insert(chat_id.clone());

        let result = async {
            let model = self.registry.active()?;
            let model_id = model.id.clone();
            let provider = model.provider.clone();
            let api_key = self.credentials.resolve_key(&provider)?;
            let base_url = self.credentials.base_url(&provider);

            debug!(model = %model_id, provider = %provider, "submitting chat message");
            self.dispatcher
                .send(&wire, &model_id, &api_key, &base_url, SendOptions::default())
                .await
        }
        .await;
        self.in_flight.remove(&chat_id);

        match result {
            Ok(reply) => {
                if let Some(chat) = self.chats.iter_mut().find(|c| c.id == chat_id) {
                    chat.push(ConversationMessage::new(
                        MessageRole::Assistant,
                        reply.clone(),
                        vec![],
                    ));
                }
                Ok(Some(reply))
            }
            Err(err) => {
                self.notifier
                    .notify("Message failed", &err.to_string(), Severity::Error);
                Err(err)
            }
        }
    }

    // ----- registry pass-throughs, with toasts -----

    pub fn models(&self) -> &[ModelDescriptor] {
        self.registry.list()
    }

    pub fn active_model(&self) -> Result<&ModelDescriptor, ChatError> {
        self.registry.active()
    }

    pub fn add_model(&mut self, descriptor: ModelDescriptor) -> Result<(), ChatError> {
        let name = descriptor.display_name.clone();
        match self.registry.add(descriptor) {
            Ok(()) => {
                self.notifier.notify(
                    "Model Added",
                    &format!("{} has been added to your available models.", name),
                    Severity::Info,
                );
                Ok(())
            }
            Err(err) => {
                let title = match &err {
                    ChatError::DuplicateModel(_) => "Model already exists",
                    ChatError::InvalidProvider(_) => "Invalid model provider",
                    _ => "Could not add model",
                };
                self.notifier.notify(title, &err.to_string(), Severity::Error);
                Err(err)
            }
        }
    }

    pub fn remove_model(&mut self, id: &str) -> Result<(), ChatError> {
        let was_active = self.registry.active().map(|m| m.id.clone()).ok();
        self.registry.remove(id)?;

        if was_active.as_deref() == Some(id) {
            if let Ok(new_active) = self.registry.active() {
                self.notifier.notify(
                    "Active Model Changed",
                    &format!(
                        "Active model was removed. Now using {}.",
                        new_active.display_name
                    ),
                    Severity::Info,
                );
            }
        }
        self.notifier.notify(
            "Model Removed",
            "The selected model has been removed from the available models list.",
            Severity::Info,
        );
        Ok(())
    }

    pub fn set_active_model(&mut self, id: &str) -> Result<(), ChatError> {
        self.registry.set_active(id)
    }

    // ----- credential pass-throughs, with toasts -----

    pub fn api_keys(&self) -> std::collections::HashMap<String, String> {
        self.credentials.all_keys()
    }

    pub fn base_urls(&self) -> std::collections::HashMap<String, String> {
        self.credentials.all_base_urls()
    }

    pub fn set_api_key(&mut self, provider: &str, key: &str) -> Result<(), ChatError> {
        self.credentials.set_key(provider, key)?;
        self.notifier.notify(
            &format!("{} API Key Updated", providers::display_name(provider)),
            &format!("Your {} API key has been saved.", provider),
            Severity::Info,
        );
        Ok(())
    }

    pub fn set_base_url(&mut self, provider: &str, url: &str) -> Result<(), ChatError> {
        self.credentials.set_base_url(provider, url)?;
        self.notifier.notify(
            &format!("{} Base URL Updated", providers::display_name(provider)),
            &format!("Your {} base URL has been saved.", provider),
            Severity::Info,
        );
        Ok(())
    }
}
