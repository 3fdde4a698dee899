//! Error taxonomy shared by every provider client.
//!
//! A provider call either yields normalized text or exactly one [`LlmError`].
//! Transport and decode failures are mapped onto this closed set at the client
//! boundary; nothing from `reqwest` or `serde_json` leaks past it untyped.

use std::time::Duration;

use thiserror::Error;

/// Kind of failure, without the payload. Useful for matching in callers and tests.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    CredentialMissing,
    InvalidEndpoint,
    NoContent,
    RequestFailed,
    DecodingError,
    Timeout,
}

/// A classified provider failure.
#[derive(Debug, Error)]
pub enum LlmError {
    /// No API key was configured for the provider. Raised before any network I/O.
    #[error("no API key configured for {provider}")]
    CredentialMissing { provider: String },

    /// The endpoint URL could not be parsed.
    #[error("invalid endpoint URL '{url}': {reason}")]
    InvalidEndpoint { url: String, reason: String },

    /// Nothing to send, or nothing text-bearing came back.
    #[error("no content: {0}")]
    NoContent(String),

    /// Non-2xx status, or a transport failure (`status == None`).
    #[error("request failed: {message}")]
    RequestFailed {
        status: Option<u16>,
        message: String,
    },

    /// A payload could not be encoded or a 2xx body could not be decoded.
    #[error("failed to decode response: {0}")]
    DecodingError(#[source] serde_json::Error),

    /// The request did not complete within the configured timeout.
    #[error("request timed out after {}s", .0.as_secs_f64())]
    Timeout(Duration),
}

impl LlmError {
    pub fn credential_missing(provider: impl Into<String>) -> Self {
        LlmError::CredentialMissing {
            provider: provider.into(),
        }
    }

    pub fn request_failed(status: Option<u16>, message: impl Into<String>) -> Self {
        LlmError::RequestFailed {
            status,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            LlmError::CredentialMissing { .. } => ErrorKind::CredentialMissing,
            LlmError::InvalidEndpoint { .. } => ErrorKind::InvalidEndpoint,
            LlmError::NoContent(_) => ErrorKind::NoContent,
            LlmError::RequestFailed { .. } => ErrorKind::RequestFailed,
            LlmError::DecodingError(_) => ErrorKind::DecodingError,
            LlmError::Timeout(_) => ErrorKind::Timeout,
        }
    }

    /// HTTP status of the failed response, if the server answered at all.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            LlmError::RequestFailed { status, .. } => *status,
            _ => None,
        }
    }

    /// Human-readable message suitable for showing to a user.
    ///
    /// For `RequestFailed` this is the provider's own message (or raw body);
    /// for everything else it is the `Display` rendering.
    pub fn message(&self) -> String {
        match self {
            LlmError::RequestFailed { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}
