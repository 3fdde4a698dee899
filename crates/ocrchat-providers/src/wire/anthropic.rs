//! Anthropic Messages API schema.
//!
//! Request: `{model, max_tokens, system?, messages: [{role, content}]}`.
//! Success: `{content: [{type, text}], ...}`. Error: `{type, error: {type, message}}`.

use serde::{Deserialize, Serialize};

use ocrchat_core::CompletionRequest;

use super::{join, non_blank, WireCodec};
use crate::registry::ProviderSpec;

/// `max_tokens` sent when the caller does not set one. The API requires it.
pub const DEFAULT_MAX_TOKENS: u32 = 1024;

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: Vec<MessageParam<'a>>,
}

#[derive(Debug, Serialize)]
struct MessageParam<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Option<Vec<ContentBlock>>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

pub struct AnthropicCodec;

impl WireCodec for AnthropicCodec {
    fn endpoint(&self, api_base: &str, _model: &str) -> String {
        join(api_base, "messages")
    }

    fn encode(
        &self,
        spec: &ProviderSpec,
        request: &CompletionRequest,
    ) -> Result<serde_json::Value, serde_json::Error> {
        let body = MessagesRequest {
            model: &request.model,
            max_tokens: request.max_output_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            system: request.system(),
            messages: request
                .history
                .iter()
                .map(|turn| MessageParam {
                    role: spec.role_name(turn.role()),
                    content: turn.text(),
                })
                .collect(),
        };
        serde_json::to_value(body)
    }

    fn decode(&self, body: &[u8]) -> Result<Option<String>, serde_json::Error> {
        let resp: MessagesResponse = serde_json::from_slice(body)?;
        Ok(resp
            .content
            .unwrap_or_default()
            .into_iter()
            .filter(|block| block.block_type == "text")
            .find_map(|block| non_blank(block.text)))
    }

    fn error_message(&self, body: &[u8]) -> Option<String> {
        serde_json::from_slice::<ErrorResponse>(body)
            .ok()
            .and_then(|e| non_blank(Some(e.error.message)))
    }
}
