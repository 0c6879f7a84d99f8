//! Chat-completion backends and the router that chains them (spec §4.E).
//!
//! Every backend is unified behind one contract:
//! `chat(system, user, model, temperature) -> text`. There is no tools
//! parameter at this layer — tool-calling is carried entirely in prose via
//! the system-prompt manifest (see `crate::tools::dispatch`); the Anthropic
//! backend's `tool_use`-block translation exists purely so that a model
//! which emits native tool_use content still produces text the dispatcher
//! can parse.

pub mod anthropic;
pub mod echo;
pub mod ollama;
pub mod openai_compatible;
pub mod router;

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// Connect timeout for provider HTTP clients.
pub(crate) const PROVIDER_CONNECT_TIMEOUT_SECS: u64 = 30;
/// Overall request timeout for provider HTTP clients.
pub(crate) const PROVIDER_REQUEST_TIMEOUT_SECS: u64 = 120;

/// Default `max_tokens` sent to backends that require it explicitly.
pub const DEFAULT_MAX_TOKENS: u32 = 8096;

pub(crate) fn provider_http_client() -> Client {
    Client::builder()
        .connect_timeout(Duration::from_secs(PROVIDER_CONNECT_TIMEOUT_SECS))
        .timeout(Duration::from_secs(PROVIDER_REQUEST_TIMEOUT_SECS))
        .build()
        .unwrap_or_else(|_| Client::new())
}

/// A chat-completion backend. Implementors never panic on malformed remote
/// responses; they surface a best-effort text description instead (see
/// §7's `TransportError` non-2xx handling).
#[async_trait]
pub trait Provider: Send + Sync {
    async fn chat(&self, system: &str, user: &str, model: &str, temperature: f32) -> anyhow::Result<String>;

    /// Short label used in logs and `bareclaw status` output.
    fn name(&self) -> &str;
}

/// Render a non-2xx HTTP response as the synthetic success string the spec
/// requires (`HTTP <n>: <body>`) so the model can see and react to it
/// instead of the turn aborting.
pub(crate) fn synthetic_http_error(status: u16, body: &str) -> String {
    format!("HTTP {status}: {body}")
}
