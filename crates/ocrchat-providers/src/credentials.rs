//! Credential lookup — resolves a provider's API key from process configuration.
//!
//! Resolution never fails: a missing key comes back as an empty string, and
//! the provider client turns that into `CredentialMissing` before any I/O.

use std::collections::HashMap;

use ocrchat_core::config::ProvidersConfig;

use crate::registry::find_by_name;

/// Synchronous, read-only API key lookup by provider name.
pub trait CredentialProvider: Send + Sync {
    /// Return the secret for `provider` (e.g. `"anthropic"`), or `""` if none.
    fn resolve(&self, provider: &str) -> String;
}

/// Reads keys from each provider's conventional env var (`ANTHROPIC_API_KEY`, …).
#[derive(Clone, Copy, Debug, Default)]
pub struct EnvCredentials;

impl CredentialProvider for EnvCredentials {
    fn resolve(&self, provider: &str) -> String {
        find_by_name(provider)
            .and_then(|spec| std::env::var(spec.env_key).ok())
            .unwrap_or_default()
    }
}

/// Configured key first, then the provider's env var.
impl CredentialProvider for ProvidersConfig {
    fn resolve(&self, provider: &str) -> String {
        resolve_configured(self, provider, &EnvCredentials)
    }
}

/// A non-blank configured key, else whatever `fallback` resolves.
fn resolve_configured(
    config: &ProvidersConfig,
    provider: &str,
    fallback: &dyn CredentialProvider,
) -> String {
    match config.get_by_name(provider) {
        Some(cfg) if cfg.is_configured() => cfg.api_key.clone(),
        _ => fallback.resolve(provider),
    }
}

/// Fixed in-memory keys, for embedding callers and tests.
#[derive(Clone, Default)]
pub struct StaticCredentials {
    keys: HashMap<String, String>,
}

impl StaticCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, provider: impl Into<String>, secret: impl Into<String>) -> Self {
        self.keys.insert(provider.into(), secret.into());
        self
    }
}

impl CredentialProvider for StaticCredentials {
    fn resolve(&self, provider: &str) -> String {
        self.keys.get(provider).cloned().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_provider_resolves_empty() {
        assert_eq!(EnvCredentials.resolve("no-such-provider"), "");
    }

    #[test]
    fn test_config_key_wins() {
        let mut providers = ProvidersConfig::default();
        providers.anthropic.api_key = "sk-ant-config".into();
        assert_eq!(providers.resolve("anthropic"), "sk-ant-config");
    }

    #[test]
    fn test_config_unknown_name_resolves_empty() {
        let providers = ProvidersConfig::default();
        assert_eq!(providers.resolve("groq"), "");
    }

    #[test]
    fn test_blank_config_key_falls_back() {
        let mut providers = ProvidersConfig::default();
        providers.openai.api_key = "  ".into();
        let env = StaticCredentials::new().with("openai", "sk-env");

        assert_eq!(resolve_configured(&providers, "openai", &env), "sk-env");

        providers.openai.api_key = "sk-config".into();
        assert_eq!(resolve_configured(&providers, "openai", &env), "sk-config");
    }

    #[test]
    fn test_static_credentials() {
        let creds = StaticCredentials::new().with("gemini", "g-123");
        assert_eq!(creds.resolve("gemini"), "g-123");
        assert_eq!(creds.resolve("openai"), "");
    }
}
