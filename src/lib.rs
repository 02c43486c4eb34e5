//! Provider-agnostic chat core for LLM gateways.
//!
//! The crate keeps a catalog of selectable models, resolves per-provider
//! API keys and base URLs with fallback rules, normalizes conversations
//! (including image attachments) into the gateway wire format, and
//! performs the blocking request/reply dispatch. A UI layer drives it
//! through [`app::ChatOrchestrator`] and receives toasts through the
//! [`app::Notifier`] collaborator.

pub mod app;
pub mod chat;
pub mod config;
pub mod core;
pub mod providers;
pub mod registry;
pub mod storage;

pub use crate::app::{ChatOrchestrator, Notifier, NullNotifier, Severity};
pub use crate::chat::{Chat, ConversationMessage, MessageRole};
pub use crate::config::CredentialStore;
pub use crate::core::error::ChatError;
pub use crate::providers::client::{Dispatcher, GatewayClient, SendOptions};
pub use crate::registry::{ModelDescriptor, ModelRegistry};
pub use crate::storage::{FileStore, KeyValueStore, MemoryStore};
