//! The bounded multi-round tool-calling conversation protocol (spec §4.F)
//! and the rolling conversation history it persists across turns.

use crate::providers::Provider;
use crate::tools::dispatch::{self, DEFAULT_MAX_CONTEXT_CHARS};
use crate::tools::{ToolContext, ToolRegistry};

pub const MAX_TOOL_ROUNDS: usize = 8;

const SYSTEM_PREAMBLE: &str = "You are BareClaw, a self-hosted assistant with access to a small set of tools.";

const TOOL_CALL_INSTRUCTIONS: &str = "When you need a tool, respond with a JSON object of the exact shape {\"tool_calls\":[{\"function\":\"<name>\",\"arguments\":{...}}]} and nothing else. After you receive tool results, answer in plain text — do NOT output any JSON or tool_calls.";

const ROUND_INSTRUCTIONS: &str =
    "[Instructions] Use the tool results above to answer the user. Respond in plain friendly text. Do NOT output any JSON or tool_calls.";

const MAX_ROUNDS_MESSAGE: &str = "(agent reached max tool-call rounds)";

/// Build the system prompt: a fixed preamble plus, when the registry is
/// non-empty, the tool manifest and calling instructions.
pub fn build_system_prompt(registry: &ToolRegistry) -> String {
    if registry.is_empty() {
        return SYSTEM_PREAMBLE.to_string();
    }
    format!(
        "{SYSTEM_PREAMBLE}\n\nAvailable tools:\n{}\n\n{TOOL_CALL_INSTRUCTIONS}",
        registry.manifest()
    )
}

/// A bounded log of past `(role, text)` turns, evicted from the front once
/// it exceeds a caller-chosen character budget.
#[derive(Default)]
pub struct ConversationHistory {
    messages: Vec<String>,
}

impl ConversationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: impl Into<String>) {
        self.messages.push(entry.into());
    }

    pub fn total_chars(&self) -> usize {
        self.messages.iter().map(|m| m.len()).sum()
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    /// Drop the oldest messages until `total_chars() <= budget`, but never
    /// drop the single most recent message even if it alone exceeds the
    /// budget (testable property 3).
    pub fn trim(&mut self, budget: usize) {
        while self.messages.len() > 1 && self.total_chars() > budget {
            self.messages.remove(0);
        }
    }
}

/// Everything one agent turn needs: the provider to call, the tool registry
/// and shared context to dispatch against, and the model/temperature pair.
pub struct AgentLoop<'a> {
    pub provider: &'a dyn Provider,
    pub registry: &'a ToolRegistry,
    pub tool_ctx: &'a ToolContext,
    pub model: String,
}

impl<'a> AgentLoop<'a> {
    pub fn new(provider: &'a dyn Provider, registry: &'a ToolRegistry, tool_ctx: &'a ToolContext, model: impl Into<String>) -> Self {
        Self {
            provider,
            registry,
            tool_ctx,
            model: model.into(),
        }
    }

    /// Run one bounded agent turn for `user_message`, returning the final
    /// plain-text reply. Persists the original user message under the
    /// `last_message` memory key once a final answer is produced.
    pub async fn run_once(&self, user_message: &str) -> String {
        let system = build_system_prompt(self.registry);
        let mut context_buffer = String::new();

        for _round in 0..MAX_TOOL_ROUNDS {
            let effective_user = if context_buffer.is_empty() {
                user_message.to_string()
            } else {
                format!("{user_message}\n\n[Tool results]\n{context_buffer}\n{ROUND_INSTRUCTIONS}")
            };

            let response = match self.provider.chat(&system, &effective_user, &self.model, 0.7).await {
                Ok(text) => text,
                Err(e) => return format!("(provider error: {e})"),
            };

            let outcome = dispatch::dispatch(
                self.tool_ctx,
                self.registry,
                &response,
                &mut context_buffer,
                DEFAULT_MAX_CONTEXT_CHARS,
            )
            .await;

            if !outcome.dispatched {
                let _ = self.tool_ctx.memory.store("last_message", user_message);
                return response;
            }
        }

        MAX_ROUNDS_MESSAGE.to_string()
    }
}
