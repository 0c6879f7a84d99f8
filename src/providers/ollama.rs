//! Ollama backend: keyless, local, no `temperature` field in the wire
//! format (spec §4.E).

use super::{provider_http_client, synthetic_http_error, Provider};
use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

const DEFAULT_URL: &str = "http://localhost:11434";

pub struct OllamaProvider {
    base_url: String,
    client: Client,
}

impl OllamaProvider {
    pub fn new(base_url: Option<String>) -> Self {
        Self {
            base_url: base_url.unwrap_or_else(|| DEFAULT_URL.to_string()),
            client: provider_http_client(),
        }
    }
}

#[async_trait]
impl Provider for OllamaProvider {
    async fn chat(&self, system: &str, user: &str, model: &str, _temperature: f32) -> anyhow::Result<String> {
        let payload = json!({
            "model": model,
            "stream": false,
            "messages": [
                {"role": "system", "content": system},
                {"role": "user", "content": user},
            ],
        });

        let url = format!("{}/api/chat", self.base_url.trim_end_matches('/'));
        let response = self
            .client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .context("ollama request failed")?;

        let status = response.status();
        let body: serde_json::Value = response.json().await.context("ollama returned a non-JSON body")?;

        if !status.is_success() {
            return Ok(synthetic_http_error(status.as_u16(), &body.to_string()));
        }

        let content = body["message"]["content"].as_str().unwrap_or_default();
        Ok(content.to_string())
    }

    fn name(&self) -> &str {
        "ollama"
    }
}
