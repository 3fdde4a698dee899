//! Wire codecs — per-provider request/response schemas.
//!
//! A codec only knows how to shape JSON. Auth, transport, timeouts, and error
//! classification live in [`crate::http_provider::HttpProvider`], which is the
//! same for every provider.

mod anthropic;
mod gemini;
mod openai;

use ocrchat_core::CompletionRequest;

use crate::registry::{ProviderKind, ProviderSpec};

pub use anthropic::{AnthropicCodec, DEFAULT_MAX_TOKENS};
pub use gemini::GeminiCodec;
pub use openai::OpenAiCodec;

/// Request/response schema for one provider.
pub trait WireCodec: Send + Sync {
    /// Endpoint URL for `model`, without credentials.
    fn endpoint(&self, api_base: &str, model: &str) -> String;

    /// Build the JSON request body.
    fn encode(
        &self,
        spec: &ProviderSpec,
        request: &CompletionRequest,
    ) -> Result<serde_json::Value, serde_json::Error>;

    /// Decode a 2xx body into the first text-bearing element.
    ///
    /// `Ok(None)` means the body was well-formed but carried no text.
    fn decode(&self, body: &[u8]) -> Result<Option<String>, serde_json::Error>;

    /// Pull the provider's error message out of a non-2xx body, if it has one.
    fn error_message(&self, body: &[u8]) -> Option<String>;
}

static ANTHROPIC: AnthropicCodec = AnthropicCodec;
static GEMINI: GeminiCodec = GeminiCodec;
static OPENAI: OpenAiCodec = OpenAiCodec;

/// The codec for a provider kind.
pub fn codec_for(kind: ProviderKind) -> &'static dyn WireCodec {
    match kind {
        ProviderKind::Anthropic => &ANTHROPIC,
        ProviderKind::Gemini => &GEMINI,
        ProviderKind::OpenAi => &OPENAI,
    }
}

/// Join a base URL and a path segment, tolerating a trailing slash on the base.
fn join(api_base: &str, path: &str) -> String {
    format!("{}/{}", api_base.trim_end_matches('/'), path)
}

/// Treat blank text as absent.
fn non_blank(text: Option<String>) -> Option<String> {
    text.filter(|t| !t.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_trailing_slash() {
        assert_eq!(
            join("https://api.openai.com/v1/", "chat/completions"),
            "https://api.openai.com/v1/chat/completions"
        );
        assert_eq!(
            join("https://api.openai.com/v1", "chat/completions"),
            "https://api.openai.com/v1/chat/completions"
        );
    }

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank(Some("hi".into())).as_deref(), Some("hi"));
        assert!(non_blank(Some("  \n".into())).is_none());
        assert!(non_blank(None).is_none());
    }
}
