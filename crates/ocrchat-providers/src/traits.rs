//! LLM Provider trait — the one interface every provider client exposes.
//!
//! `HttpProvider` in `http_provider.rs` implements it for all three wire
//! protocols; tests and embedding callers can supply their own.

use async_trait::async_trait;
use ocrchat_core::{CompletionRequest, LlmError};

use crate::registry::ProviderKind;

/// Trait that all LLM providers must implement.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Send one completion request and return the normalized reply text.
    ///
    /// Exactly one of text or a classified [`LlmError`] comes back. The
    /// request's history is read, never modified.
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError>;

    /// Which wire protocol this provider speaks.
    fn kind(&self) -> ProviderKind;

    /// Display name for logging.
    fn display_name(&self) -> &str;
}
