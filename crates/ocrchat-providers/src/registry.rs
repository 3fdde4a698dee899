//! Provider registry — static specs for the three supported LLM providers.
//!
//! Each `ProviderSpec` is the per-provider configuration table the generic
//! HTTP engine runs on: model-matching keywords, env var, default base URL,
//! auth placement, wire role names, and quirks.

use std::time::Duration;

use ocrchat_core::Role;

// ─────────────────────────────────────────────
// ProviderKind / AuthStyle
// ─────────────────────────────────────────────

/// The wire protocol family a provider speaks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    Anthropic,
    Gemini,
    OpenAi,
}

/// Where the API key goes on the outgoing request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthStyle {
    /// `Authorization: Bearer <key>`.
    Bearer,
    /// Key in a named header, plus fixed extra headers (e.g. an API version).
    Header {
        name: &'static str,
        extra: &'static [(&'static str, &'static str)],
    },
    /// Key as a URL query parameter.
    Query { param: &'static str },
}

// ─────────────────────────────────────────────
// ProviderSpec — static metadata for one provider
// ─────────────────────────────────────────────

/// Static specification describing one LLM provider.
#[derive(Clone, Debug)]
pub struct ProviderSpec {
    pub kind: ProviderKind,
    /// Internal name, also the credential lookup id (e.g. `"anthropic"`).
    pub name: &'static str,
    /// Keywords to match in model names (lowercase). E.g. `&["claude"]`.
    pub keywords: &'static [&'static str],
    /// Environment variable for the API key. E.g. `"ANTHROPIC_API_KEY"`.
    pub env_key: &'static str,
    /// Human-readable name for logs.
    pub display_name: &'static str,
    pub default_api_base: &'static str,
    pub auth: AuthStyle,
    /// Wire name of the user role.
    pub user_role: &'static str,
    /// Wire name of the assistant role (`"model"` for Gemini).
    pub assistant_role: &'static str,
    /// Whether an inline image can be attached to the latest user turn.
    pub supports_images: bool,
    /// Whether an empty history is rejected before sending.
    pub requires_history: bool,
    pub default_timeout: Duration,
}

impl ProviderSpec {
    /// Wire name for a conversation role.
    pub fn role_name(&self, role: Role) -> &'static str {
        match role {
            Role::User => self.user_role,
            Role::Assistant => self.assistant_role,
        }
    }

    fn matches(&self, model_lower: &str) -> bool {
        self.keywords.iter().any(|kw| model_lower.contains(kw))
    }
}

/// Version header value required by the Anthropic Messages API.
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

// ─────────────────────────────────────────────
// All providers (in matching priority order)
// ─────────────────────────────────────────────

/// Supported provider specifications, in matching priority order.
///
/// The last entry is the default for models no keyword matches.
pub static PROVIDERS: &[ProviderSpec] = &[
    // 1. Anthropic — Messages API
    ProviderSpec {
        kind: ProviderKind::Anthropic,
        name: "anthropic",
        keywords: &["claude", "anthropic"],
        env_key: "ANTHROPIC_API_KEY",
        display_name: "Anthropic",
        default_api_base: "https://api.anthropic.com/v1",
        auth: AuthStyle::Header {
            name: "x-api-key",
            extra: &[("anthropic-version", ANTHROPIC_VERSION)],
        },
        user_role: "user",
        assistant_role: "assistant",
        supports_images: false,
        requires_history: true,
        default_timeout: Duration::from_secs(30),
    },
    // 2. Gemini — generateContent, key in query string
    ProviderSpec {
        kind: ProviderKind::Gemini,
        name: "gemini",
        keywords: &["gemini"],
        env_key: "GEMINI_API_KEY",
        display_name: "Gemini",
        default_api_base: "https://generativelanguage.googleapis.com/v1beta",
        auth: AuthStyle::Query { param: "key" },
        user_role: "user",
        assistant_role: "model",
        supports_images: false,
        requires_history: false,
        default_timeout: Duration::from_secs(45),
    },
    // 3. OpenAI-compatible chat completions — default
    ProviderSpec {
        kind: ProviderKind::OpenAi,
        name: "openai",
        keywords: &["gpt", "openai"],
        env_key: "OPENAI_API_KEY",
        display_name: "OpenAI",
        default_api_base: "https://api.openai.com/v1",
        auth: AuthStyle::Bearer,
        user_role: "user",
        assistant_role: "assistant",
        supports_images: true,
        requires_history: false,
        default_timeout: Duration::from_secs(30),
    },
];

// ─────────────────────────────────────────────
// Matching functions
// ─────────────────────────────────────────────

/// Result of resolving a model id to a provider.
#[derive(Clone, Copy, Debug)]
pub struct Route {
    pub spec: &'static ProviderSpec,
    /// True when no keyword matched and the default provider was chosen.
    pub fallback: bool,
}

/// Find a provider spec by matching keywords against a model name.
///
/// Returns the first match in priority order, or `None`.
pub fn find_by_model(model: &str) -> Option<&'static ProviderSpec> {
    let model_lower = model.to_lowercase();
    PROVIDERS.iter().find(|spec| spec.matches(&model_lower))
}

/// Find a provider spec by exact name.
pub fn find_by_name(name: &str) -> Option<&'static ProviderSpec> {
    PROVIDERS.iter().find(|spec| spec.name == name)
}

/// The `ProviderSpec` for a given kind.
pub fn spec_for(kind: ProviderKind) -> &'static ProviderSpec {
    match kind {
        ProviderKind::Anthropic => &PROVIDERS[0],
        ProviderKind::Gemini => &PROVIDERS[1],
        ProviderKind::OpenAi => &PROVIDERS[2],
    }
}

/// The provider used when no keyword matches.
pub fn default_spec() -> &'static ProviderSpec {
    spec_for(ProviderKind::OpenAi)
}

/// Resolve a model id to a provider, falling back to the default.
///
/// Never fails: an unrecognized id routes to the OpenAI-compatible client
/// with `fallback == true` so callers can surface the substitution.
pub fn route(model: &str) -> Route {
    match find_by_model(model) {
        Some(spec) => Route {
            spec,
            fallback: false,
        },
        None => Route {
            spec: default_spec(),
            fallback: true,
        },
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_by_model_claude() {
        let spec = find_by_model("claude-3-5-sonnet-20241022").unwrap();
        assert_eq!(spec.kind, ProviderKind::Anthropic);
    }

    #[test]
    fn test_find_by_model_gemini() {
        let spec = find_by_model("gemini-1.5-flash").unwrap();
        assert_eq!(spec.kind, ProviderKind::Gemini);
    }

    #[test]
    fn test_find_by_model_gpt() {
        let spec = find_by_model("gpt-4o-mini").unwrap();
        assert_eq!(spec.kind, ProviderKind::OpenAi);
    }

    #[test]
    fn test_find_by_model_is_case_insensitive() {
        let spec = find_by_model("Claude-3-Opus").unwrap();
        assert_eq!(spec.name, "anthropic");
    }

    #[test]
    fn test_find_by_model_first_match_wins() {
        // Matches both "claude" and "gemini"; Anthropic is declared first.
        let spec = find_by_model("claude-vs-gemini").unwrap();
        assert_eq!(spec.kind, ProviderKind::Anthropic);
    }

    #[test]
    fn test_find_by_model_unknown() {
        assert!(find_by_model("llama-3.1-8b").is_none());
    }

    #[test]
    fn test_route_known_model_is_not_fallback() {
        let r = route("gemini-2.0-flash");
        assert_eq!(r.spec.kind, ProviderKind::Gemini);
        assert!(!r.fallback);
    }

    #[test]
    fn test_route_unknown_model_falls_back_to_openai() {
        let r = route("unknown-model");
        assert_eq!(r.spec.kind, ProviderKind::OpenAi);
        assert!(r.fallback);
    }

    #[test]
    fn test_find_by_name() {
        let spec = find_by_name("gemini").unwrap();
        assert_eq!(spec.display_name, "Gemini");
        assert_eq!(spec.env_key, "GEMINI_API_KEY");
        assert!(find_by_name("groq").is_none());
    }

    #[test]
    fn test_spec_for_matches_table() {
        for spec in PROVIDERS {
            assert_eq!(spec_for(spec.kind).name, spec.name);
        }
    }

    #[test]
    fn test_role_names() {
        let gemini = spec_for(ProviderKind::Gemini);
        assert_eq!(gemini.role_name(Role::Assistant), "model");
        assert_eq!(gemini.role_name(Role::User), "user");
        let anthropic = spec_for(ProviderKind::Anthropic);
        assert_eq!(anthropic.role_name(Role::Assistant), "assistant");
    }

    #[test]
    fn test_only_openai_supports_images() {
        let with_images: Vec<&str> = PROVIDERS
            .iter()
            .filter(|s| s.supports_images)
            .map(|s| s.name)
            .collect();
        assert_eq!(with_images, vec!["openai"]);
    }

    #[test]
    fn test_timeouts_within_bounds() {
        for spec in PROVIDERS {
            let secs = spec.default_timeout.as_secs();
            assert!((30..=45).contains(&secs), "{} timeout {}", spec.name, secs);
        }
    }

    #[test]
    fn test_all_providers_have_unique_names() {
        let names: Vec<&str> = PROVIDERS.iter().map(|s| s.name).collect();
        let mut unique = names.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(names.len(), unique.len(), "Duplicate provider names found");
    }
}
