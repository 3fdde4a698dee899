//! Unified dispatch — pick a provider client from a model id and call it.
//!
//! Routing goes through the ordered [`PROVIDERS`](crate::registry::PROVIDERS)
//! table. Unknown ids fall back to the OpenAI-compatible client; the result
//! says so via [`Dispatched::fallback_used`].

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use ocrchat_core::config::Config;
use ocrchat_core::{CompletionRequest, Conversation, InlineImage, LlmError};

use crate::credentials::CredentialProvider;
use crate::http_provider::HttpProvider;
use crate::registry::{self, ProviderKind, Route};
use crate::traits::LlmProvider;

/// Outcome of a successful dispatch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Dispatched {
    pub text: String,
    pub provider: ProviderKind,
    /// The model id matched no keyword and went to the default provider.
    pub fallback_used: bool,
}

/// Holds one client per provider plus the request defaults from config.
#[derive(Clone)]
pub struct Dispatcher {
    anthropic: Arc<dyn LlmProvider>,
    gemini: Arc<dyn LlmProvider>,
    openai: Arc<dyn LlmProvider>,
    system_instruction: Option<String>,
    max_tokens: Option<u32>,
}

impl Dispatcher {
    /// Build all three clients from config; keys come from config, then env.
    pub fn from_config(config: &Config) -> Self {
        Self::with_credentials(config, &config.providers)
    }

    /// Build all three clients from config with an explicit key source.
    pub fn with_credentials(config: &Config, credentials: &dyn CredentialProvider) -> Self {
        let timeout = config.defaults.timeout_secs.map(Duration::from_secs);
        let build = |kind: ProviderKind| -> Arc<dyn LlmProvider> {
            let spec = registry::spec_for(kind);
            let provider_config = config
                .providers
                .get_by_name(spec.name)
                .cloned()
                .unwrap_or_default();
            Arc::new(HttpProvider::from_config(
                spec,
                &provider_config,
                credentials,
                timeout,
            ))
        };

        Dispatcher {
            anthropic: build(ProviderKind::Anthropic),
            gemini: build(ProviderKind::Gemini),
            openai: build(ProviderKind::OpenAi),
            system_instruction: config
                .defaults
                .system_instruction
                .clone()
                .filter(|s| !s.trim().is_empty()),
            max_tokens: Some(config.defaults.max_tokens),
        }
    }

    /// Replace the client for `provider.kind()`.
    pub fn with_provider(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        match provider.kind() {
            ProviderKind::Anthropic => self.anthropic = provider,
            ProviderKind::Gemini => self.gemini = provider,
            ProviderKind::OpenAi => self.openai = provider,
        }
        self
    }

    pub fn with_system_instruction(mut self, instruction: Option<String>) -> Self {
        self.system_instruction = instruction;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Which provider `model` would go to. No I/O.
    pub fn route(&self, model: &str) -> Route {
        registry::route(model)
    }

    fn client(&self, kind: ProviderKind) -> &Arc<dyn LlmProvider> {
        match kind {
            ProviderKind::Anthropic => &self.anthropic,
            ProviderKind::Gemini => &self.gemini,
            ProviderKind::OpenAi => &self.openai,
        }
    }

    /// Send `prompt` (appended to `conversation`) to the provider for `model`.
    ///
    /// `conversation` is not modified; callers record the outcome themselves
    /// (see [`Conversation::record`]). An empty prompt sends the conversation
    /// as-is.
    ///
    /// `fallback_used` is only carried on success. On error, check
    /// [`route`](Self::route) for the same model to learn whether the id was
    /// recognized.
    pub async fn dispatch(
        &self,
        model: &str,
        prompt: &str,
        system_instruction: Option<&str>,
        conversation: &Conversation,
        image: Option<&InlineImage>,
    ) -> Result<Dispatched, LlmError> {
        let route = self.route(model);
        if route.fallback {
            warn!(
                model = %model,
                provider = route.spec.display_name,
                "Unrecognized model id, using default provider"
            );
        } else {
            debug!(model = %model, provider = route.spec.display_name, "Routed model");
        }

        let history = if prompt.trim().is_empty() {
            conversation.clone()
        } else {
            conversation.with_user(prompt)
        };

        let mut request = CompletionRequest::new(model, &history);
        if let Some(system) = system_instruction.or(self.system_instruction.as_deref()) {
            request = request.with_system(system);
        }
        if let Some(max_tokens) = self.max_tokens {
            request = request.with_max_output_tokens(max_tokens);
        }
        if let Some(image) = image {
            request = request.with_image(image.clone());
        }

        let text = self.client(route.spec.kind).complete(&request).await?;
        info!(
            provider = route.spec.display_name,
            chars = text.chars().count(),
            "Completion received"
        );

        Ok(Dispatched {
            text,
            provider: route.spec.kind,
            fallback_used: route.fallback,
        })
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("anthropic", &self.anthropic.display_name())
            .field("gemini", &self.gemini.display_name())
            .field("openai", &self.openai.display_name())
            .field("system_instruction", &self.system_instruction)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::StaticCredentials;
    use async_trait::async_trait;
    use ocrchat_core::config::ProviderConfig;
    use ocrchat_core::{ConversationTurn, ErrorKind, Role};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Records every request and answers with a fixed string.
    struct FakeProvider {
        kind: ProviderKind,
        calls: AtomicUsize,
        last: Mutex<Option<CompletionRequest>>,
    }

    impl FakeProvider {
        fn new(kind: ProviderKind) -> Arc<Self> {
            Arc::new(Self {
                kind,
                calls: AtomicUsize::new(0),
                last: Mutex::new(None),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn last(&self) -> CompletionRequest {
            self.last.lock().unwrap().clone().unwrap()
        }
    }

    #[async_trait]
    impl LlmProvider for FakeProvider {
        async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last.lock().unwrap() = Some(request.clone());
            Ok(format!("reply from {:?}", self.kind))
        }

        fn kind(&self) -> ProviderKind {
            self.kind
        }

        fn display_name(&self) -> &str {
            "fake"
        }
    }

    struct Fakes {
        anthropic: Arc<FakeProvider>,
        gemini: Arc<FakeProvider>,
        openai: Arc<FakeProvider>,
        dispatcher: Dispatcher,
    }

    fn fakes() -> Fakes {
        let anthropic = FakeProvider::new(ProviderKind::Anthropic);
        let gemini = FakeProvider::new(ProviderKind::Gemini);
        let openai = FakeProvider::new(ProviderKind::OpenAi);
        let dispatcher = Dispatcher::with_credentials(&Config::default(), &StaticCredentials::new())
            .with_provider(anthropic.clone())
            .with_provider(gemini.clone())
            .with_provider(openai.clone());
        Fakes {
            anthropic,
            gemini,
            openai,
            dispatcher,
        }
    }

    #[tokio::test]
    async fn test_routes_by_keyword() {
        let f = fakes();
        let empty = Conversation::new();

        let r = f.dispatcher.dispatch("claude-x", "hi", None, &empty, None).await.unwrap();
        assert_eq!(r.provider, ProviderKind::Anthropic);
        assert!(!r.fallback_used);

        let r = f.dispatcher.dispatch("gemini-y", "hi", None, &empty, None).await.unwrap();
        assert_eq!(r.provider, ProviderKind::Gemini);

        let r = f.dispatcher.dispatch("gpt-z", "hi", None, &empty, None).await.unwrap();
        assert_eq!(r.provider, ProviderKind::OpenAi);
        assert!(!r.fallback_used);

        assert_eq!(f.anthropic.calls(), 1);
        assert_eq!(f.gemini.calls(), 1);
        assert_eq!(f.openai.calls(), 1);
    }

    #[tokio::test]
    async fn test_unknown_model_falls_back_to_openai() {
        let f = fakes();
        let r = f
            .dispatcher
            .dispatch("unknown-model", "hi", None, &Conversation::new(), None)
            .await
            .unwrap();

        assert_eq!(r.provider, ProviderKind::OpenAi);
        assert!(r.fallback_used);
        assert_eq!(r.text, "reply from OpenAi");
        assert_eq!(f.anthropic.calls() + f.gemini.calls(), 0);
    }

    #[test]
    fn test_route_has_no_side_effects() {
        let f = fakes();
        assert_eq!(f.dispatcher.route("CLAUDE-3-OPUS").spec.kind, ProviderKind::Anthropic);
        assert!(f.dispatcher.route("mistral-large").fallback);
        assert_eq!(f.anthropic.calls() + f.gemini.calls() + f.openai.calls(), 0);
    }

    #[tokio::test]
    async fn test_prompt_appended_without_touching_conversation() {
        let f = fakes();
        let conv = Conversation::from_turns(vec![
            ConversationTurn::user("first"),
            ConversationTurn::assistant("answer"),
        ]);

        f.dispatcher
            .dispatch("gpt-4o", "second", None, &conv, None)
            .await
            .unwrap();

        let sent = f.openai.last();
        assert_eq!(sent.history.len(), 3);
        assert_eq!(sent.history[2].role(), Role::User);
        assert_eq!(sent.history[2].text(), "second");
        assert_eq!(conv.len(), 2);
    }

    #[tokio::test]
    async fn test_blank_prompt_sends_conversation_as_is() {
        let f = fakes();
        let conv = Conversation::from_turns(vec![ConversationTurn::user("only")]);

        f.dispatcher
            .dispatch("gemini-pro", "   ", None, &conv, None)
            .await
            .unwrap();

        assert_eq!(f.gemini.last().history.len(), 1);
    }

    #[tokio::test]
    async fn test_blank_prompt_recorded_as_sent() {
        let f = fakes();
        let mut conv = Conversation::from_turns(vec![ConversationTurn::user("only")]);

        let outcome = f
            .dispatcher
            .dispatch("gpt-4o", "   ", None, &conv, None)
            .await
            .map(|d| d.text);
        conv.record("   ", &outcome);

        let sent = f.openai.last().history;
        assert_eq!(sent, vec![ConversationTurn::user("only")]);
        assert_eq!(
            conv.turns(),
            &[
                ConversationTurn::user("only"),
                ConversationTurn::assistant("reply from OpenAi"),
            ]
        );
    }

    #[tokio::test]
    async fn test_failed_fallback_call_is_visible_through_route() {
        let dispatcher = Dispatcher::with_credentials(&Config::default(), &StaticCredentials::new());

        let err = dispatcher
            .dispatch("unknown-model", "hi", None, &Conversation::new(), None)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::CredentialMissing);
        let route = dispatcher.route("unknown-model");
        assert!(route.fallback);
        assert_eq!(route.spec.kind, ProviderKind::OpenAi);
    }

    #[tokio::test]
    async fn test_defaults_apply_when_caller_passes_none() {
        let f = fakes();
        let dispatcher = f
            .dispatcher
            .with_system_instruction(Some("Fix OCR errors.".into()))
            .with_max_tokens(Some(256));

        dispatcher
            .dispatch("claude-3", "text", None, &Conversation::new(), None)
            .await
            .unwrap();
        let sent = f.anthropic.last();
        assert_eq!(sent.system(), Some("Fix OCR errors."));
        assert_eq!(sent.max_output_tokens, Some(256));

        dispatcher
            .dispatch("claude-3", "text", Some("Translate."), &Conversation::new(), None)
            .await
            .unwrap();
        assert_eq!(f.anthropic.last().system(), Some("Translate."));
    }

    #[tokio::test]
    async fn test_image_forwarded() {
        let f = fakes();
        let image = InlineImage::with_mime(vec![9, 9], "image/png");
        f.dispatcher
            .dispatch("gpt-4o", "read", None, &Conversation::new(), Some(&image))
            .await
            .unwrap();
        assert_eq!(f.openai.last().image, Some(image));
    }

    #[tokio::test]
    async fn test_missing_key_surfaces_without_request() {
        let server = MockServer::start().await;
        let mut config = Config::default();
        config.providers.anthropic = ProviderConfig {
            api_key: String::new(),
            api_base: Some(server.uri()),
        };

        let dispatcher = Dispatcher::with_credentials(&config, &StaticCredentials::new());
        let err = dispatcher
            .dispatch("claude-3", "hi", None, &Conversation::new(), None)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::CredentialMissing);
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_end_to_end_with_config() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/gemini-1.5-flash:generateContent"))
            .and(query_param("key", "g-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [{"content": {"parts": [{"text": "Bonjour"}], "role": "model"}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let mut config = Config::default();
        config.providers.gemini = ProviderConfig {
            api_key: "g-key".into(),
            api_base: Some(server.uri()),
        };

        let dispatcher = Dispatcher::from_config(&config);
        let mut conv = Conversation::new();
        let outcome = dispatcher
            .dispatch("gemini-1.5-flash", "Hello", Some("Translate to French."), &conv, None)
            .await
            .map(|d| d.text);
        conv.record("Hello", &outcome);

        assert_eq!(outcome.unwrap(), "Bonjour");
        assert_eq!(conv.len(), 2);
        assert_eq!(conv.last().unwrap().role(), Role::Assistant);
    }
}
