//! Anthropic Messages API backend, including the `tool_use` → `tool_calls`
//! translation that keeps the agent loop provider-agnostic (spec §4.E).

use super::{provider_http_client, synthetic_http_error, Provider, DEFAULT_MAX_TOKENS};
use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

const API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

pub struct AnthropicProvider {
    base_url: String,
    api_key: String,
    client: Client,
}

impl AnthropicProvider {
    pub fn new(api_key: String) -> Self {
        Self {
            base_url: API_URL.to_string(),
            api_key,
            client: provider_http_client(),
        }
    }

    #[cfg(test)]
    fn with_base_url(api_key: String, base_url: String) -> Self {
        Self {
            base_url,
            api_key,
            client: provider_http_client(),
        }
    }
}

#[async_trait]
impl Provider for AnthropicProvider {
    async fn chat(&self, system: &str, user: &str, model: &str, temperature: f32) -> anyhow::Result<String> {
        let payload = json!({
            "model": model,
            "max_tokens": DEFAULT_MAX_TOKENS,
            "temperature": temperature,
            "system": system,
            "messages": [{"role": "user", "content": user}],
        });

        let response = self
            .client
            .post(&self.base_url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&payload)
            .send()
            .await
            .context("anthropic request failed")?;

        let status = response.status();
        let body: Value = response.json().await.context("anthropic returned a non-JSON body")?;

        if !status.is_success() {
            return Ok(synthetic_http_error(status.as_u16(), &body.to_string()));
        }

        Ok(render_content_blocks(&body))
    }

    fn name(&self) -> &str {
        "anthropic"
    }
}

/// Render an Anthropic Messages API response body into the text the rest of
/// the pipeline consumes: text blocks newline-joined, `tool_use` blocks
/// translated into a `{"tool_calls":[...]}` JSON object the dispatcher's
/// extractor can find embedded in the surrounding text.
fn render_content_blocks(body: &Value) -> String {
    let Some(blocks) = body["content"].as_array() else {
        return String::new();
    };

    let mut text_parts = Vec::new();
    let mut tool_calls = Vec::new();

    for block in blocks {
        match block["type"].as_str() {
            Some("text") => {
                if let Some(text) = block["text"].as_str() {
                    text_parts.push(text.to_string());
                }
            }
            Some("tool_use") => {
                tool_calls.push(translate_tool_use(block));
            }
            _ => {}
        }
    }

    let mut rendered = text_parts.join("\n");
    if !tool_calls.is_empty() {
        if !rendered.is_empty() {
            rendered.push('\n');
        }
        rendered.push_str(&json!({"tool_calls": tool_calls}).to_string());
    }
    rendered
}

/// Translate one `{type:"tool_use", name, input}` block into the internal
/// OpenAI-style `{"function":{"name":N,"arguments":A}}` shape, serializing
/// `input` into a JSON string as `arguments` (testable property 10).
fn translate_tool_use(block: &Value) -> Value {
    let name = block["name"].as_str().unwrap_or_default();
    let input = block.get("input").cloned().unwrap_or(Value::Null);
    json!({
        "function": {
            "name": name,
            "arguments": input.to_string(),
        }
    })
}
