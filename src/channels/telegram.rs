//! Telegram long-poll adapter (spec §6, collaborator), built with `teloxide`
//! the way the teacher's channel adapters are — minus the teacher's
//! allow-list/pairing flow, which is out of this core's scope.

use crate::agent::AgentLoop;
use crate::runtime::Runtime;
use anyhow::{bail, Result};
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::Message as TgMessage;

pub async fn run(runtime: Runtime) -> Result<()> {
    let Some(token) = runtime.config.telegram_token.clone() else {
        bail!("telegram: no telegram_token configured");
    };

    let bot = Bot::new(token);
    let runtime = Arc::new(runtime);
    let dispatch_bot = bot.clone();

    let handler = Update::filter_message().endpoint(move |msg: TgMessage| {
        let runtime = runtime.clone();
        let bot = dispatch_bot.clone();
        async move {
            if let Some(text) = msg.text() {
                let agent = AgentLoop::new(
                    runtime.provider.as_ref(),
                    &runtime.registry,
                    &runtime.tool_ctx,
                    runtime.config.default_model.clone(),
                );
                let reply = agent.run_once(text).await;

                if let Err(e) = bot.send_message(msg.chat.id, reply).await {
                    tracing::warn!("telegram: failed to send reply: {e}");
                }
            }
            Ok::<(), anyhow::Error>(())
        }
    });

    tracing::info!("starting telegram long-poll dispatcher");
    Dispatcher::builder(bot, handler).build().dispatch().await;
    Ok(())
}
