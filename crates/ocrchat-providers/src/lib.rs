//! LLM provider layer for Ocrchat.
//!
//! Direct HTTP clients for Anthropic, Gemini, and OpenAI-compatible APIs.
//!
//! # Architecture
//!
//! - [`traits::LlmProvider`] — trait that all providers implement
//! - [`registry`] — static specs for the three supported providers + model routing
//! - [`wire`] — per-provider request/response schemas
//! - [`http_provider::HttpProvider`] — generic HTTP client driven by a spec + codec
//! - [`dispatch::Dispatcher`] — model id → provider client
//! - [`credentials`] — API key lookup
//! - [`ocr`] — image → text, upstream of the LLM call

pub mod credentials;
pub mod dispatch;
pub mod http_provider;
pub mod ocr;
pub mod registry;
pub mod traits;
pub mod wire;

// Re-export main types for convenience
pub use credentials::{CredentialProvider, EnvCredentials, StaticCredentials};
pub use dispatch::{Dispatched, Dispatcher};
pub use http_provider::HttpProvider;
pub use ocr::{is_image_file, TesseractRecognizer, TextRecognizer};
pub use registry::{ProviderKind, ProviderSpec, Route, PROVIDERS};
pub use traits::LlmProvider;
