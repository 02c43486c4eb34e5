use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Longest title kept verbatim; longer first messages are truncated.
const TITLE_MAX_LEN: usize = 30;
const TITLE_TRUNCATED_LEN: usize = 27;

pub const DEFAULT_CHAT_TITLE: &str = "New Chat";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

/// A single turn in a conversation. Created once, never edited in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub id: String,
    pub role: MessageRole,
    pub text: String,
    /// Data URIs or remote URLs, passed through to the gateway verbatim
    #[serde(default)]
    pub attached_images: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl ConversationMessage {
    pub fn new(role: MessageRole, text: impl Into<String>, images: Vec<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            text: text.into(),
            attached_images: images,
            created_at: Utc::now(),
        }
    }

    pub fn has_images(&self) -> bool {
        !self.attached_images.is_empty()
    }
}

/// An ordered, append-only conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chat {
    pub id: String,
    pub title: String,
    pub messages: Vec<ConversationMessage>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Chat {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            title: DEFAULT_CHAT_TITLE.to_string(),
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Appends a message, fixing the title from the first user message.
    pub fn push(&mut self, message: ConversationMessage) {
        if self.messages.is_empty() && message.role == MessageRole::User {
            self.title = derive_title(&message.text);
        }
        self.messages.push(message);
        self.updated_at = Utc::now();
    }
}

impl Default for Chat {
    fn default() -> Self {
        Self::new()
    }
}

/// Title from the first user message: kept verbatim up to 30 chars,
/// otherwise the first 27 chars plus an ellipsis.
pub fn derive_title(text: &str) -> String {
    let text = text.trim();
    if text.is_empty() {
        return DEFAULT_CHAT_TITLE.to_string();
    }
    if text.chars().count() <= TITLE_MAX_LEN {
        return text.to_string();
    }
    let truncated: String = text.chars().take(TITLE_TRUNCATED_LEN).collect();
    format!("{}...", truncated)
}
