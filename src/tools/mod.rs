//! The tool registry and dispatch layer (spec §4.D): a uniform
//! `(name, args-json) -> result` interface over built-in tools and proxied
//! (MCP) tools.

pub mod builtin;
pub mod dispatch;

use crate::mcp::McpSessionPool;
use crate::memory::MemoryBackend;
use crate::security::SecurityPolicy;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// Lower bound for `MAX_TOOL_OUTPUT_CHARS`.
pub const MIN_TOOL_OUTPUT_CHARS: usize = 1000;
/// Upper bound for `MAX_TOOL_OUTPUT_CHARS`.
pub const MAX_TOOL_OUTPUT_CHARS_CEIL: usize = 32000;
/// Default cap on a single tool result's output length.
pub const DEFAULT_MAX_TOOL_OUTPUT_CHARS: usize = 8000;

/// Clamp a configured tool-output budget into the documented range.
pub fn clamp_max_tool_output_chars(requested: usize) -> usize {
    requested.clamp(MIN_TOOL_OUTPUT_CHARS, MAX_TOOL_OUTPUT_CHARS_CEIL)
}

/// The result of one tool invocation.
#[derive(Debug, Clone)]
pub struct ToolResult {
    pub success: bool,
    pub output: String,
}

impl ToolResult {
    pub fn ok(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: output.into(),
        }
    }

    pub fn err(output: impl Into<String>) -> Self {
        Self {
            success: false,
            output: output.into(),
        }
    }

    /// Cap `output` to `max_chars`, appending a truncation marker if it was
    /// cut. The returned value always begins with `output[0..min(len, max)]`.
    pub fn capped(mut self, max_chars: usize) -> Self {
        self.output = cap_output(&self.output, max_chars);
        self
    }
}

/// Truncate `raw` to at most `max_chars` chars, appending
/// `\n[... output truncated at N chars ...]` when truncation occurred.
pub fn cap_output(raw: &str, max_chars: usize) -> String {
    let char_count = raw.chars().count();
    if char_count <= max_chars {
        return raw.to_string();
    }
    let truncated: String = raw.chars().take(max_chars).collect();
    format!("{truncated}\n[... output truncated at {max_chars} chars ...]")
}

/// Per-call context: references to the collaborating subsystems a tool may
/// need. Built once per agent turn and shared across every tool invocation
/// within it.
pub struct ToolContext {
    pub security: Arc<SecurityPolicy>,
    pub memory: Arc<MemoryBackend>,
    pub mcp_pool: Option<Arc<McpSessionPool>>,
    pub max_tool_output_chars: usize,
}

/// A tool's executable behavior. Built-in tools and MCP-proxied tools both
/// implement this trait; proxied tools close over their own `McpProxyMeta`
/// state (the subprocess argv and remote tool name) directly in their struct
/// fields rather than through a shared "current tool" context slot.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn execute(&self, ctx: &ToolContext, args: Value) -> ToolResult;
}

/// A named, described, callable tool. `name` is the stable identifier the
/// model emits in its `tool_calls` JSON.
pub struct Tool {
    pub name: String,
    pub description: String,
    pub handler: Arc<dyn ToolHandler>,
}

impl Tool {
    pub fn new(name: impl Into<String>, description: impl Into<String>, handler: Arc<dyn ToolHandler>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            handler,
        }
    }
}

/// Uniform registry over built-in and proxied tools. Lookup is a linear scan
/// (first match wins), matching spec §4.D's dispatch description.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Tool>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    pub fn register(&mut self, tool: Tool) {
        self.tools.push(tool);
    }

    pub fn find(&self, name: &str) -> Option<&Tool> {
        self.tools.iter().find(|t| t.name == name)
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tool> {
        self.tools.iter()
    }

    /// Render the manifest section injected into the system prompt when the
    /// registry is non-empty: `- <name>: <description>` per line.
    pub fn manifest(&self) -> String {
        self.tools
            .iter()
            .map(|t| format!("- {}: {}", t.name, t.description))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub async fn execute(&self, ctx: &ToolContext, name: &str, args: Value) -> Option<ToolResult> {
        let tool = self.find(name)?;
        Some(tool.handler.execute(ctx, args).await)
    }
}
