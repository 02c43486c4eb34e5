use serde::{Deserialize, Serialize};

use crate::chat::ConversationMessage;

/// One conversation turn in the gateway's chat-completions format.
/// Plain text serializes as a bare string; turns with images serialize
/// as an array of typed parts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WireMessage {
    pub role: String,
    pub content: WireContent,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum WireContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageUrl {
    pub url: String,
}

#[derive(Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<WireMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub stream: bool,
}

#[derive(Deserialize)]
pub struct ChatCompletionResponse {
    pub choices: Vec<Choice>,
}

#[derive(Deserialize)]
pub struct Choice {
    pub message: AssistantReply,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Deserialize)]
pub struct AssistantReply {
    #[serde(default)]
    pub content: Option<String>,
}

/// Error body the gateway returns on non-success statuses.
#[derive(Deserialize)]
pub struct ErrorResponse {
    #[serde(default)]
    pub error: Option<ErrorDetail>,
}

#[derive(Deserialize)]
pub struct ErrorDetail {
    pub message: String,
}

/// Converts a conversation into wire messages, in order. Turns without
/// images become plain-string content; turns with images become a text
/// part followed by one image part per attachment, URLs untouched.
pub fn normalize(messages: &[ConversationMessage]) -> Vec<WireMessage> {
    messages
        .iter()
        .map(|message| {
            let content = if message.has_images() {
                let mut parts = vec![ContentPart::Text {
                    text: message.text.clone(),
                }];
                parts.extend(message.attached_images.iter().map(|url| {
                    ContentPart::ImageUrl {
                        image_url: ImageUrl { url: url.clone() },
                    }
                }));
                WireContent::Parts(parts)
            } else {
                WireContent::Text(message.text.clone())
            };
            WireMessage {
                role: message.role.as_str().to_string(),
                content,
            }
        })
        .collect()
}
