//! Interactive stdin REPL front-end. Each line is a fresh user message run
//! through one bounded agent turn (spec §4.F); there is no cross-turn
//! conversation state beyond whatever the agent persists to memory.

use crate::agent::AgentLoop;
use crate::runtime::Runtime;
use anyhow::Result;
use std::io::Write as _;
use tokio::io::{AsyncBufReadExt, BufReader};

const PROMPT: &str = "bareclaw> ";

pub async fn run(runtime: Runtime) -> Result<()> {
    println!("BareClaw REPL. Type 'exit' or press Ctrl-D to quit.");
    let stdin = tokio::io::stdin();
    let mut lines = BufReader::new(stdin).lines();

    loop {
        print!("{PROMPT}");
        std::io::stdout().flush().ok();

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if trimmed == "exit" || trimmed == "quit" {
            break;
        }

        let agent = AgentLoop::new(
            runtime.provider.as_ref(),
            &runtime.registry,
            &runtime.tool_ctx,
            runtime.config.default_model.clone(),
        );
        let reply = agent.run_once(trimmed).await;
        println!("{reply}");
    }

    Ok(())
}
