//! Gemini `generateContent` schema.
//!
//! Request: `{contents: [{role, parts: [{text}]}], system_instruction?: {parts: [{text}]}}`.
//! Success: `{candidates: [{content: {parts: [{text}], role}}]}`.
//! Error: `{error: {code, message, status}}`.

use serde::{Deserialize, Serialize};

use ocrchat_core::CompletionRequest;

use super::{join, non_blank, WireCodec};
use crate::registry::ProviderSpec;

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<SystemInstruction<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct SystemInstruction<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Option<Vec<ResponsePart>>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
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

pub struct GeminiCodec;

impl WireCodec for GeminiCodec {
    fn endpoint(&self, api_base: &str, model: &str) -> String {
        join(api_base, &format!("models/{model}:generateContent"))
    }

    fn encode(
        &self,
        spec: &ProviderSpec,
        request: &CompletionRequest,
    ) -> Result<serde_json::Value, serde_json::Error> {
        let body = GenerateContentRequest {
            contents: request
                .history
                .iter()
                .map(|turn| Content {
                    role: spec.role_name(turn.role()),
                    parts: vec![Part { text: turn.text() }],
                })
                .collect(),
            system_instruction: request.system().map(|text| SystemInstruction {
                parts: vec![Part { text }],
            }),
        };
        serde_json::to_value(body)
    }

    fn decode(&self, body: &[u8]) -> Result<Option<String>, serde_json::Error> {
        let resp: GenerateContentResponse = serde_json::from_slice(body)?;
        let text = resp
            .candidates
            .unwrap_or_default()
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|content| {
                content
                    .parts
                    .unwrap_or_default()
                    .into_iter()
                    .find_map(|p| non_blank(p.text))
            });
        Ok(text)
    }

    fn error_message(&self, body: &[u8]) -> Option<String> {
        serde_json::from_slice::<ErrorResponse>(body)
            .ok()
            .and_then(|e| non_blank(Some(e.error.message)))
    }
}
