//! Configuration schema.
//!
//! Hierarchy: `Config` → `DefaultsConfig`, `ProvidersConfig`.
//!
//! JSON on disk uses **camelCase** keys; Rust uses snake_case.

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────
// Root Config
// ─────────────────────────────────────────────

/// Root configuration — loaded from `~/.ocrchat/config.json` + env vars.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub defaults: DefaultsConfig,
    pub providers: ProvidersConfig,
}

// ─────────────────────────────────────────────
// Defaults
// ─────────────────────────────────────────────

/// Per-call defaults applied when the caller passes nothing explicit.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DefaultsConfig {
    /// Model identifier used when none is given on the command line.
    pub model: String,
    /// System instruction sent with every request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<String>,
    /// Maximum tokens to generate per response.
    pub max_tokens: u32,
    /// Request timeout override in seconds. `None` keeps each provider's default.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            system_instruction: None,
            max_tokens: 1024,
            timeout_secs: None,
        }
    }
}

// ─────────────────────────────────────────────
// Providers
// ─────────────────────────────────────────────

/// Configuration for a single LLM provider (API key, base URL).
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProviderConfig {
    /// API key for authentication.
    #[serde(default)]
    pub api_key: String,
    /// Custom API base URL (overrides provider default).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
}

impl ProviderConfig {
    /// Whether this provider has a configured API key.
    pub fn is_configured(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &if self.is_configured() { "<redacted>" } else { "" })
            .field("api_base", &self.api_base)
            .finish()
    }
}

/// One `ProviderConfig` per supported backend.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub anthropic: ProviderConfig,
    #[serde(default)]
    pub gemini: ProviderConfig,
    #[serde(default)]
    pub openai: ProviderConfig,
}

impl ProvidersConfig {
    /// Get a provider config by name (e.g. `"anthropic"`).
    pub fn get_by_name(&self, name: &str) -> Option<&ProviderConfig> {
        match name {
            "anthropic" => Some(&self.anthropic),
            "gemini" => Some(&self.gemini),
            "openai" => Some(&self.openai),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_by_name() {
        let mut providers = ProvidersConfig::default();
        providers.gemini.api_key = "g-key".into();
        assert_eq!(providers.get_by_name("gemini").unwrap().api_key, "g-key");
        assert!(providers.get_by_name("groq").is_none());
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let cfg = ProviderConfig {
            api_key: "sk-live-123".into(),
            api_base: None,
        };
        let dbg = format!("{cfg:?}");
        assert!(!dbg.contains("sk-live-123"));
        assert!(dbg.contains("<redacted>"));
    }

    #[test]
    fn test_blank_api_key_is_not_configured() {
        let cfg = ProviderConfig {
            api_key: "  \t".into(),
            api_base: None,
        };
        assert!(!cfg.is_configured());
    }

    #[test]
    fn test_defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.defaults.max_tokens, 1024);
        assert!(cfg.defaults.timeout_secs.is_none());
        assert!(!cfg.providers.anthropic.is_configured());
    }
}
