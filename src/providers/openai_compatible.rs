//! OpenAI, OpenAI-compatible, and OpenRouter backends. All three speak the
//! same `chat/completions` wire format; OpenRouter additionally attaches
//! `HTTP-Referer`/`X-Title` headers.

use super::{provider_http_client, synthetic_http_error, Provider};
use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

const OPENAI_URL: &str = "https://api.openai.com/v1/chat/completions";
const OPENROUTER_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

pub struct OpenAiCompatibleProvider {
    label: String,
    base_url: String,
    api_key: String,
    client: Client,
    extra_headers: Vec<(&'static str, String)>,
}

impl OpenAiCompatibleProvider {
    pub fn openai(api_key: String) -> Self {
        Self {
            label: "openai".to_string(),
            base_url: OPENAI_URL.to_string(),
            api_key,
            client: provider_http_client(),
            extra_headers: Vec::new(),
        }
    }

    pub fn openai_compatible(base_url: String, api_key: String) -> Self {
        Self {
            label: "openai-compatible".to_string(),
            base_url,
            api_key,
            client: provider_http_client(),
            extra_headers: Vec::new(),
        }
    }

    pub fn openrouter(api_key: String) -> Self {
        Self {
            label: "openrouter".to_string(),
            base_url: OPENROUTER_URL.to_string(),
            api_key,
            client: provider_http_client(),
            extra_headers: vec![
                ("HTTP-Referer", "https://github.com/bareclaw/bareclaw".to_string()),
                ("X-Title", "BareClaw".to_string()),
            ],
        }
    }
}

#[async_trait]
impl Provider for OpenAiCompatibleProvider {
    async fn chat(&self, system: &str, user: &str, model: &str, temperature: f32) -> anyhow::Result<String> {
        let payload = json!({
            "model": model,
            "temperature": temperature,
            "messages": [
                {"role": "system", "content": system},
                {"role": "user", "content": user},
            ],
        });

        let mut request = self
            .client
            .post(&self.base_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&payload);
        for (name, value) in &self.extra_headers {
            request = request.header(*name, value);
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("{} request failed", self.label))?;

        let status = response.status();
        let body: serde_json::Value = response
            .json()
            .await
            .with_context(|| format!("{} returned a non-JSON body", self.label))?;

        if !status.is_success() {
            return Ok(synthetic_http_error(status.as_u16(), &body.to_string()));
        }

        let content = body["choices"][0]["message"]["content"].as_str().unwrap_or_default();
        Ok(content.to_string())
    }

    fn name(&self) -> &str {
        &self.label
    }
}
