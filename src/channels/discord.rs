//! Discord gateway adapter (spec §6, collaborator), built with `serenity`
//! the way the teacher connects a transport to the agent loop — minus the
//! teacher's allow-list, slash-command, and embed/button UI, which are out
//! of this core's scope.

use crate::agent::AgentLoop;
use crate::runtime::Runtime;
use anyhow::{bail, Result};
use serenity::async_trait;
use serenity::model::channel::Message;
use serenity::model::gateway::{GatewayIntents, Ready};
use serenity::prelude::*;
use std::sync::Arc;

struct Handler {
    runtime: Arc<Runtime>,
}

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, _ctx: Context, ready: Ready) {
        tracing::info!("discord: connected as {}", ready.user.name);
    }

    async fn message(&self, ctx: Context, msg: Message) {
        if msg.author.bot {
            return;
        }
        if msg.content.trim().is_empty() {
            return;
        }

        let agent = AgentLoop::new(
            self.runtime.provider.as_ref(),
            &self.runtime.registry,
            &self.runtime.tool_ctx,
            self.runtime.config.default_model.clone(),
        );
        let reply = agent.run_once(&msg.content).await;

        if let Err(e) = msg.channel_id.say(&ctx.http, reply).await {
            tracing::warn!("discord: failed to send reply: {e}");
        }
    }
}

pub async fn run(runtime: Runtime) -> Result<()> {
    let Some(token) = runtime.config.discord_token.clone() else {
        bail!("discord: no discord_token configured");
    };

    let intents = GatewayIntents::GUILD_MESSAGES | GatewayIntents::DIRECT_MESSAGES | GatewayIntents::MESSAGE_CONTENT;
    let handler = Handler {
        runtime: Arc::new(runtime),
    };

    let mut client = Client::builder(&token, intents)
        .event_handler(handler)
        .await?;

    tracing::info!("starting discord gateway client");
    client.start().await?;
    Ok(())
}
