//! Core types for Ocrchat — conversation model, error taxonomy, configuration.
//!
//! Everything here is transport-agnostic. The HTTP clients that consume these
//! types live in `ocrchat-providers`.

pub mod config;
pub mod error;
pub mod types;
pub mod utils;

pub use error::{ErrorKind, LlmError};
pub use types::{
    CompletionRequest, Conversation, ConversationTurn, InlineImage, ProviderCredential, Role,
};
