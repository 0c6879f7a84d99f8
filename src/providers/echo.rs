//! The no-op backend used when no keyed provider is configured. Always
//! succeeds; never touches the network.

use super::Provider;
use async_trait::async_trait;

pub struct EchoProvider;

#[async_trait]
impl Provider for EchoProvider {
    async fn chat(&self, _system: &str, user: &str, _model: &str, _temperature: f32) -> anyhow::Result<String> {
        Ok(format!("BareClaw echo (no API key configured): {user}"))
    }

    fn name(&self) -> &str {
        "echo"
    }
}
