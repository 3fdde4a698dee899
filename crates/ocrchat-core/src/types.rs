//! Core types for Ocrchat — conversation turns, credentials, and the logical
//! completion request every provider client consumes.
//!
//! The conversation is a plain value owned by the caller. Provider clients
//! only ever read a snapshot of it; appending the reply (or rolling back a
//! speculative user turn) is the caller's job.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::LlmError;

// ─────────────────────────────────────────────
// Conversation turns
// ─────────────────────────────────────────────

/// Author of a conversation turn.
///
/// Wire names differ per provider (Gemini calls the assistant `"model"`);
/// that mapping lives in the provider registry, not here.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One message in a conversation. Immutable once created.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    role: Role,
    text: String,
}

impl ConversationTurn {
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        ConversationTurn {
            role,
            text: text.into(),
        }
    }

    /// Create a user turn.
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, text)
    }

    /// Create an assistant turn.
    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Role::Assistant, text)
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Ordered conversation history, oldest turn first.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Conversation {
    turns: Vec<ConversationTurn>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_turns(turns: Vec<ConversationTurn>) -> Self {
        Conversation { turns }
    }

    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn last(&self) -> Option<&ConversationTurn> {
        self.turns.last()
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }

    /// Append a user turn (typically speculative, before the call is made).
    pub fn push_user(&mut self, text: impl Into<String>) {
        self.turns.push(ConversationTurn::user(text));
    }

    /// Append an assistant turn.
    pub fn push_assistant(&mut self, text: impl Into<String>) {
        self.turns.push(ConversationTurn::assistant(text));
    }

    /// Remove the trailing user turn after a failed call.
    ///
    /// Returns `None` and leaves the history untouched if the last turn is not
    /// a user turn.
    pub fn rollback_user(&mut self) -> Option<ConversationTurn> {
        match self.turns.last() {
            Some(turn) if turn.role == Role::User => self.turns.pop(),
            _ => None,
        }
    }

    /// A copy of this conversation with one more user turn appended.
    pub fn with_user(&self, text: impl Into<String>) -> Conversation {
        let mut next = self.clone();
        next.push_user(text);
        next
    }

    /// Record the outcome of one exchange.
    ///
    /// On success the prompt and the reply are appended; a blank prompt is
    /// skipped, matching what was sent. On failure the history is left
    /// exactly as it was.
    pub fn record(&mut self, prompt: impl Into<String>, outcome: &Result<String, LlmError>) {
        if let Ok(reply) = outcome {
            let prompt = prompt.into();
            if !prompt.trim().is_empty() {
                self.push_user(prompt);
            }
            self.push_assistant(reply.clone());
        }
    }
}

impl From<Vec<ConversationTurn>> for Conversation {
    fn from(turns: Vec<ConversationTurn>) -> Self {
        Conversation::from_turns(turns)
    }
}

// ─────────────────────────────────────────────
// Credentials
// ─────────────────────────────────────────────

/// A provider's API key. The secret never appears in `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct ProviderCredential {
    provider: String,
    secret: String,
}

impl ProviderCredential {
    pub fn new(provider: impl Into<String>, secret: impl Into<String>) -> Self {
        ProviderCredential {
            provider: provider.into(),
            secret: secret.into(),
        }
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }

    pub fn is_empty(&self) -> bool {
        self.secret.trim().is_empty()
    }
}

impl std::fmt::Debug for ProviderCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderCredential")
            .field("provider", &self.provider)
            .field("secret", &if self.is_empty() { "<empty>" } else { "<redacted>" })
            .finish()
    }
}

// ─────────────────────────────────────────────
// Inline images
// ─────────────────────────────────────────────

/// Raw image bytes to attach to the most recent user turn.
#[derive(Clone, PartialEq, Eq)]
pub struct InlineImage {
    bytes: Vec<u8>,
    mime_type: String,
}

impl InlineImage {
    /// Wrap raw bytes, sniffing the MIME type from the magic number.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        let mime_type = sniff_mime(&bytes).to_string();
        InlineImage { bytes, mime_type }
    }

    pub fn with_mime(bytes: Vec<u8>, mime_type: impl Into<String>) -> Self {
        InlineImage {
            bytes,
            mime_type: mime_type.into(),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Render as a `data:<mime>;base64,<payload>` URL.
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, STANDARD.encode(&self.bytes))
    }
}

impl std::fmt::Debug for InlineImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InlineImage")
            .field("mime_type", &self.mime_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Guess an image MIME type from its leading bytes. Defaults to JPEG.
fn sniff_mime(bytes: &[u8]) -> &'static str {
    if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
        "image/png"
    } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        "image/gif"
    } else if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        "image/webp"
    } else {
        "image/jpeg"
    }
}

// ─────────────────────────────────────────────
// Completion request
// ─────────────────────────────────────────────

/// Provider-independent description of one completion call.
///
/// Built per call and discarded once the provider has encoded it.
#[derive(Clone, Debug)]
pub struct CompletionRequest {
    /// Model identifier (e.g. `"claude-3-5-sonnet-latest"`, `"gemini-1.5-flash"`).
    pub model: String,
    /// Snapshot of the conversation, oldest turn first.
    pub history: Vec<ConversationTurn>,
    pub system_instruction: Option<String>,
    /// Upper bound on generated tokens. Required by Anthropic (a default is used).
    pub max_output_tokens: Option<u32>,
    pub image: Option<InlineImage>,
}

impl CompletionRequest {
    pub fn new(model: impl Into<String>, history: &Conversation) -> Self {
        CompletionRequest {
            model: model.into(),
            history: history.turns().to_vec(),
            system_instruction: None,
            max_output_tokens: None,
            image: None,
        }
    }

    /// Single-turn request built from a bare prompt.
    pub fn from_prompt(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self::new(model, &Conversation::new().with_user(prompt))
    }

    pub fn with_system(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(instruction.into());
        self
    }

    pub fn with_max_output_tokens(mut self, max_tokens: u32) -> Self {
        self.max_output_tokens = Some(max_tokens);
        self
    }

    pub fn with_image(mut self, image: InlineImage) -> Self {
        self.image = Some(image);
        self
    }

    /// System instruction, if present and non-blank.
    pub fn system(&self) -> Option<&str> {
        self.system_instruction
            .as_deref()
            .filter(|s| !s.trim().is_empty())
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    // ── Conversation ──

    #[test]
    fn test_role_serializes_lowercase() {
        let turn = ConversationTurn::assistant("hi");
        let json = serde_json::to_value(&turn).unwrap();
        assert_eq!(json["role"], "assistant");
        assert_eq!(json["text"], "hi");
    }

    #[test]
    fn test_with_user_leaves_original_untouched() {
        let mut conv = Conversation::new();
        conv.push_user("first");
        conv.push_assistant("reply");

        let next = conv.with_user("second");

        assert_eq!(conv.len(), 2);
        assert_eq!(next.len(), 3);
        assert_eq!(next.last().unwrap().text(), "second");
        assert_eq!(next.last().unwrap().role(), Role::User);
    }

    #[test]
    fn test_rollback_pops_trailing_user_turn() {
        let mut conv = Conversation::new();
        conv.push_user("question");
        let popped = conv.rollback_user().unwrap();
        assert_eq!(popped.text(), "question");
        assert!(conv.is_empty());
    }

    #[test]
    fn test_rollback_ignores_assistant_turn() {
        let mut conv = Conversation::new();
        conv.push_user("question");
        conv.push_assistant("answer");
        assert!(conv.rollback_user().is_none());
        assert_eq!(conv.len(), 2);
    }

    #[test]
    fn test_rollback_on_empty() {
        let mut conv = Conversation::new();
        assert!(conv.rollback_user().is_none());
    }

    #[test]
    fn test_record_appends_on_success() {
        let mut conv = Conversation::new();
        conv.record("What is this?", &Ok("A receipt.".to_string()));

        assert_eq!(conv.len(), 2);
        assert_eq!(conv.turns()[0], ConversationTurn::user("What is this?"));
        assert_eq!(conv.turns()[1], ConversationTurn::assistant("A receipt."));
    }

    #[test]
    fn test_record_skips_blank_prompt() {
        let mut conv = Conversation::from_turns(vec![ConversationTurn::user("only")]);
        conv.record("   ", &Ok("R".to_string()));

        assert_eq!(
            conv.turns(),
            &[ConversationTurn::user("only"), ConversationTurn::assistant("R")]
        );
    }

    #[test]
    fn test_record_leaves_history_on_failure() {
        let mut conv = Conversation::new();
        conv.push_user("earlier");
        conv.push_assistant("earlier reply");

        conv.record("new", &Err(LlmError::NoContent("empty".into())));

        assert_eq!(conv.len(), 2);
        assert_eq!(conv.last().unwrap().text(), "earlier reply");
    }

    #[test]
    fn test_conversation_serializes_as_array() {
        let conv = Conversation::from_turns(vec![
            ConversationTurn::user("a"),
            ConversationTurn::assistant("b"),
        ]);
        let json = serde_json::to_value(&conv).unwrap();
        assert!(json.is_array());
        assert_eq!(json.as_array().unwrap().len(), 2);

        let back: Conversation = serde_json::from_value(json).unwrap();
        assert_eq!(back, conv);
    }

    // ── Credentials ──

    #[test]
    fn test_credential_debug_redacts_secret() {
        let cred = ProviderCredential::new("anthropic", "sk-ant-very-secret");
        let dbg = format!("{cred:?}");
        assert!(dbg.contains("anthropic"));
        assert!(dbg.contains("<redacted>"));
        assert!(!dbg.contains("sk-ant-very-secret"));
    }

    #[test]
    fn test_blank_credential_is_empty() {
        assert!(ProviderCredential::new("openai", "").is_empty());
        assert!(ProviderCredential::new("openai", "   ").is_empty());
        assert!(!ProviderCredential::new("openai", "sk-1").is_empty());
    }

    // ── Inline images ──

    #[test]
    fn test_sniff_png() {
        let img = InlineImage::from_bytes(b"\x89PNG\r\n\x1a\nrest".to_vec());
        assert_eq!(img.mime_type(), "image/png");
    }

    #[test]
    fn test_sniff_gif_and_webp() {
        assert_eq!(
            InlineImage::from_bytes(b"GIF89a....".to_vec()).mime_type(),
            "image/gif"
        );
        assert_eq!(
            InlineImage::from_bytes(b"RIFF\0\0\0\0WEBPVP8 ".to_vec()).mime_type(),
            "image/webp"
        );
    }

    #[test]
    fn test_sniff_defaults_to_jpeg() {
        let img = InlineImage::from_bytes(vec![0xFF, 0xD8, 0xFF, 0xE0]);
        assert_eq!(img.mime_type(), "image/jpeg");
    }

    #[test]
    fn test_data_url() {
        let img = InlineImage::with_mime(b"Hello".to_vec(), "image/png");
        assert_eq!(img.to_data_url(), "data:image/png;base64,SGVsbG8=");
    }

    // ── CompletionRequest ──

    #[test]
    fn test_request_snapshots_history() {
        let mut conv = Conversation::new();
        conv.push_user("one");
        let req = CompletionRequest::new("gpt-4o", &conv);
        conv.push_assistant("two");

        assert_eq!(req.history.len(), 1);
        assert_eq!(conv.len(), 2);
    }

    #[test]
    fn test_from_prompt_builds_single_user_turn() {
        let req = CompletionRequest::from_prompt("gemini-1.5-flash", "Translate this");
        assert_eq!(req.history, vec![ConversationTurn::user("Translate this")]);
        assert!(req.image.is_none());
    }

    #[test]
    fn test_blank_system_is_ignored() {
        let req = CompletionRequest::from_prompt("m", "p").with_system("  ");
        assert!(req.system().is_none());
        let req = CompletionRequest::from_prompt("m", "p").with_system("Be terse.");
        assert_eq!(req.system(), Some("Be terse."));
    }
}
