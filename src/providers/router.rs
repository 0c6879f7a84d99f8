//! Holds providers in priority order and tries each in turn, returning the
//! first non-error result (spec §4.E, S6).

use super::Provider;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::warn;

pub struct Router {
    providers: Vec<Arc<dyn Provider>>,
}

impl Router {
    pub fn new(providers: Vec<Arc<dyn Provider>>) -> Self {
        Self { providers }
    }
}

#[async_trait]
impl Provider for Router {
    async fn chat(&self, system: &str, user: &str, model: &str, temperature: f32) -> anyhow::Result<String> {
        let mut last_error = None;

        for provider in &self.providers {
            match provider.chat(system, user, model, temperature).await {
                Ok(reply) => return Ok(reply),
                Err(e) => {
                    warn!("provider {} failed, trying next: {e}", provider.name());
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| anyhow::anyhow!("no providers configured")))
    }

    fn name(&self) -> &str {
        "router"
    }
}
