//! OpenAI-compatible `/chat/completions` schema.
//!
//! The system instruction becomes a leading `system` message. An inline image
//! turns the most recent user message into multipart content
//! (`text` + `image_url` with a base64 data URL).

use serde::{Deserialize, Serialize};

use ocrchat_core::{CompletionRequest, Role};

use super::{join, non_blank, WireCodec};
use crate::registry::ProviderSpec;

// ─────────────────────────────────────────────
// Request
// ─────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: MessageContent,
}

/// Message content — either plain text or multipart (for vision/images).
///
/// When serialized: text becomes a plain string, parts become an array of objects.
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type")]
enum ContentPart {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "image_url")]
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
}

// ─────────────────────────────────────────────
// Response
// ─────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Option<Vec<ChatChoice>>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    #[serde(default)]
    message: Option<AssistantMessage>,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

// ─────────────────────────────────────────────
// Codec
// ─────────────────────────────────────────────

pub struct OpenAiCodec;

impl WireCodec for OpenAiCodec {
    fn endpoint(&self, api_base: &str, _model: &str) -> String {
        join(api_base, "chat/completions")
    }

    fn encode(
        &self,
        spec: &ProviderSpec,
        request: &CompletionRequest,
    ) -> Result<serde_json::Value, serde_json::Error> {
        let mut messages = Vec::with_capacity(request.history.len() + 1);

        if let Some(system) = request.system() {
            messages.push(ChatMessage {
                role: "system",
                content: MessageContent::Text(system.to_string()),
            });
        }

        messages.extend(request.history.iter().map(|turn| ChatMessage {
            role: spec.role_name(turn.role()),
            content: MessageContent::Text(turn.text().to_string()),
        }));

        if let Some(image) = &request.image {
            let image_part = ContentPart::ImageUrl {
                image_url: ImageUrl {
                    url: image.to_data_url(),
                },
            };
            let user_role = spec.role_name(Role::User);
            match messages.iter().rposition(|m| m.role == user_role) {
                Some(idx) => {
                    let latest = &mut messages[idx];
                    let text = match std::mem::replace(
                        &mut latest.content,
                        MessageContent::Parts(Vec::new()),
                    ) {
                        MessageContent::Text(text) => text,
                        MessageContent::Parts(_) => String::new(),
                    };
                    latest.content = MessageContent::Parts(vec![
                        ContentPart::Text { text },
                        image_part,
                    ]);
                }
                None => messages.push(ChatMessage {
                    role: user_role,
                    content: MessageContent::Parts(vec![image_part]),
                }),
            }
        }

        let body = ChatCompletionRequest {
            model: &request.model,
            messages,
            max_tokens: request.max_output_tokens,
        };
        serde_json::to_value(body)
    }

    fn decode(&self, body: &[u8]) -> Result<Option<String>, serde_json::Error> {
        let resp: ChatCompletionResponse = serde_json::from_slice(body)?;
        Ok(resp
            .choices
            .unwrap_or_default()
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| non_blank(m.content)))
    }

    fn error_message(&self, body: &[u8]) -> Option<String> {
        serde_json::from_slice::<ErrorResponse>(body)
            .ok()
            .and_then(|e| non_blank(Some(e.error.message)))
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
