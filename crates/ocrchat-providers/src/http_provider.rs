//! Generic HTTP provider — one engine for every supported wire protocol.
//!
//! The flow is identical for Anthropic, Gemini, and OpenAI-compatible APIs:
//! check preconditions, encode, POST once, classify the outcome. What differs
//! (URL shape, auth placement, JSON schema) comes from the static
//! [`ProviderSpec`] and its [`WireCodec`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::{debug, error, warn};

use ocrchat_core::config::ProviderConfig;
use ocrchat_core::utils::truncate_string;
use ocrchat_core::{CompletionRequest, LlmError, ProviderCredential};

use crate::credentials::CredentialProvider;
use crate::registry::{AuthStyle, ProviderKind, ProviderSpec};
use crate::traits::LlmProvider;
use crate::wire::{codec_for, WireCodec};

/// Longest error body we put in a log line.
const LOG_BODY_LIMIT: usize = 500;

// ─────────────────────────────────────────────
// HttpProvider
// ─────────────────────────────────────────────

/// An LLM provider that talks to one hosted API over HTTP.
pub struct HttpProvider {
    /// HTTP client (shared, connection-pooled).
    client: reqwest::Client,
    /// API base URL (e.g. `"https://api.anthropic.com/v1"`).
    api_base: String,
    credential: ProviderCredential,
    timeout: Duration,
    spec: &'static ProviderSpec,
    codec: &'static dyn WireCodec,
}

impl std::fmt::Debug for HttpProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpProvider")
            .field("provider", &self.spec.display_name)
            .field("api_base", &self.api_base)
            .field("timeout", &self.timeout)
            .field("credential", &self.credential)
            .finish()
    }
}

impl HttpProvider {
    /// Create a provider with the `ProviderSpec` default base URL and timeout.
    pub fn new(spec: &'static ProviderSpec, credential: ProviderCredential) -> Self {
        HttpProvider {
            client: reqwest::Client::new(),
            api_base: spec.default_api_base.to_string(),
            credential,
            timeout: spec.default_timeout,
            spec,
            codec: codec_for(spec.kind),
        }
    }

    /// Create a provider from user config, resolving the key through `credentials`.
    ///
    /// Resolution order for the base URL: config > `ProviderSpec` default.
    pub fn from_config(
        spec: &'static ProviderSpec,
        config: &ProviderConfig,
        credentials: &dyn CredentialProvider,
        timeout: Option<Duration>,
    ) -> Self {
        let credential = ProviderCredential::new(spec.name, credentials.resolve(spec.name));
        let mut provider = Self::new(spec, credential);
        if let Some(base) = config.api_base.as_deref().filter(|b| !b.is_empty()) {
            provider.api_base = base.to_string();
        }
        if let Some(timeout) = timeout {
            provider.timeout = timeout;
        }
        provider
    }

    /// Override the API base URL (proxies, compatible servers, tests).
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Override the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn spec(&self) -> &'static ProviderSpec {
        self.spec
    }

    /// Endpoint for `model`, without credentials.
    fn endpoint(&self, model: &str) -> String {
        self.codec.endpoint(&self.api_base, model)
    }

    /// Everything that must hold before touching the network, in order.
    fn check_preconditions(&self, request: &CompletionRequest) -> Result<reqwest::Url, LlmError> {
        if self.credential.is_empty() {
            return Err(LlmError::credential_missing(self.spec.name));
        }

        if self.spec.requires_history && request.history.is_empty() {
            return Err(LlmError::NoContent(format!(
                "{} requires at least one conversation turn",
                self.spec.display_name
            )));
        }

        let endpoint = self.endpoint(&request.model);
        let url = reqwest::Url::parse(&endpoint).map_err(|e| LlmError::InvalidEndpoint {
            url: endpoint.clone(),
            reason: e.to_string(),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(LlmError::InvalidEndpoint {
                url: endpoint,
                reason: format!("unsupported scheme '{}'", url.scheme()),
            });
        }
        Ok(url)
    }

    /// Place the credential where this provider expects it.
    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let secret = self.credential.secret();
        match self.spec.auth {
            AuthStyle::Bearer => builder.bearer_auth(secret),
            AuthStyle::Header { name, extra } => extra
                .iter()
                .fold(builder.header(name, secret), |b, (k, v)| b.header(*k, *v)),
            AuthStyle::Query { param } => builder.query(&[(param, secret)]),
        }
    }

    /// Map a transport-level failure. The URL is stripped so a query-string
    /// key never ends up in a message or log line.
    fn classify_transport(&self, err: reqwest::Error) -> LlmError {
        let err = err.without_url();
        if err.is_timeout() {
            warn!(
                provider = self.spec.display_name,
                timeout_secs = self.timeout.as_secs_f64(),
                "request timed out"
            );
            return LlmError::Timeout(self.timeout);
        }
        error!(provider = self.spec.display_name, error = %err, "HTTP request failed");
        LlmError::request_failed(
            None,
            format!("error calling {}: {}", self.spec.display_name, err),
        )
    }

    /// Map a non-2xx response: structured error body first, then raw body.
    fn classify_status(&self, status: StatusCode, body: &[u8]) -> LlmError {
        let raw = String::from_utf8_lossy(body);
        error!(
            provider = self.spec.display_name,
            status = %status,
            body = %truncate_string(&raw, LOG_BODY_LIMIT),
            "API error"
        );

        let message = self
            .codec
            .error_message(body)
            .or_else(|| {
                let trimmed = raw.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            })
            .unwrap_or_else(|| format!("empty response body (HTTP {})", status.as_u16()));

        LlmError::request_failed(Some(status.as_u16()), message)
    }

    /// Decode a 2xx body into normalized text.
    fn parse_response(&self, body: &[u8]) -> Result<String, LlmError> {
        match self.codec.decode(body) {
            Ok(Some(text)) => Ok(text),
            Ok(None) => {
                warn!(
                    provider = self.spec.display_name,
                    "successful response carried no text"
                );
                Err(LlmError::NoContent(format!(
                    "{} returned no text content",
                    self.spec.display_name
                )))
            }
            Err(e) => {
                error!(
                    provider = self.spec.display_name,
                    error = %e,
                    "Failed to parse LLM response"
                );
                Err(LlmError::DecodingError(e))
            }
        }
    }
}

#[async_trait]
impl LlmProvider for HttpProvider {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        let url = self.check_preconditions(request)?;

        if request.image.is_some() && !self.spec.supports_images {
            warn!(
                provider = self.spec.display_name,
                "image input not supported; sending text only"
            );
        }

        debug!(
            provider = self.spec.display_name,
            model = %request.model,
            turns = request.history.len(),
            has_system = request.system().is_some(),
            has_image = request.image.is_some() && self.spec.supports_images,
            endpoint = %url,
            "Calling LLM"
        );

        let body = self
            .codec
            .encode(self.spec, request)
            .map_err(LlmError::DecodingError)?;

        let builder = self
            .client
            .post(url)
            .timeout(self.timeout)
            .json(&body);

        let response = self
            .authorize(builder)
            .send()
            .await
            .map_err(|e| self.classify_transport(e))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| self.classify_transport(e))?;

        if !status.is_success() {
            return Err(self.classify_status(status, &bytes));
        }

        let text = self.parse_response(&bytes)?;
        debug!(
            provider = self.spec.display_name,
            chars = text.chars().count(),
            "LLM response received"
        );
        Ok(text)
    }

    fn kind(&self) -> ProviderKind {
        self.spec.kind
    }

    fn display_name(&self) -> &str {
        self.spec.display_name
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
