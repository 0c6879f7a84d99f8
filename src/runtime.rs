//! Assembles the collaborating subsystems (security policy, memory,
//! provider/router, tool registry, capability pool) from a loaded `Config`.
//! Shared by every entry point — REPL, gateway, Discord, Telegram, cron —
//! so none of them duplicates the wiring.

use crate::config::Config;
use crate::mcp::{McpProxyMeta, McpSessionPool};
use crate::memory::MemoryBackend;
use crate::providers::anthropic::AnthropicProvider;
use crate::providers::echo::EchoProvider;
use crate::providers::ollama::OllamaProvider;
use crate::providers::openai_compatible::OpenAiCompatibleProvider;
use crate::providers::router::Router;
use crate::providers::Provider;
use crate::security::SecurityPolicy;
use crate::tools::builtin::{
    AgentStatusTool, AuditLogReadTool, FileReadTool, FileWriteTool, GitOperationsTool, HttpRequestTool,
    McpProxyHandler, MemoryDeletePrefixTool, MemoryForgetTool, MemoryListKeysTool, MemoryRecallTool,
    MemoryStoreTool, ShellTool,
};
use crate::tools::{Tool, ToolContext, ToolRegistry, DEFAULT_MAX_TOOL_OUTPUT_CHARS};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Everything one process needs to run agent turns: the provider chain, the
/// tool registry, and the per-call context that ties security/memory/mcp
/// together.
pub struct Runtime {
    pub config: Config,
    pub provider: Arc<dyn Provider>,
    pub registry: ToolRegistry,
    pub tool_ctx: ToolContext,
    pub home: PathBuf,
}

/// Resolve `$HOME`, following spec §6's environment-variable list.
pub fn home_dir() -> PathBuf {
    std::env::var("HOME")
        .ok()
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

pub fn workspace_dir(home: &Path) -> PathBuf {
    home.join(".bareclaw").join("workspace")
}

/// Build one named backend provider from resolved config.
fn build_named_provider(name: &str, config: &Config) -> Arc<dyn Provider> {
    match name {
        "anthropic" => {
            let key = crate::config::resolve_api_key("anthropic", config).unwrap_or_default();
            if key.is_empty() {
                Arc::new(EchoProvider)
            } else {
                Arc::new(AnthropicProvider::new(key))
            }
        }
        "openai" => {
            let key = crate::config::resolve_api_key("openai", config).unwrap_or_default();
            if key.is_empty() {
                Arc::new(EchoProvider)
            } else {
                Arc::new(OpenAiCompatibleProvider::openai(key))
            }
        }
        "openai-compatible" => {
            let key = crate::config::resolve_api_key("openai-compatible", config).unwrap_or_default();
            let base = crate::config::resolve_openai_compatible_url()
                .unwrap_or_else(|| "http://localhost:8000/v1/chat/completions".to_string());
            Arc::new(OpenAiCompatibleProvider::openai_compatible(base, key))
        }
        "openrouter" => {
            let key = crate::config::resolve_api_key("openrouter", config).unwrap_or_default();
            if key.is_empty() {
                Arc::new(EchoProvider)
            } else {
                Arc::new(OpenAiCompatibleProvider::openrouter(key))
            }
        }
        "ollama" => Arc::new(OllamaProvider::new(crate::config::resolve_ollama_url())),
        _ => Arc::new(EchoProvider),
    }
}

/// Build the provider chain: the configured `default_provider` first, then
/// each of `fallback_providers` in order (spec §4.E Router).
pub fn build_provider(config: &Config) -> Arc<dyn Provider> {
    let mut providers = vec![build_named_provider(&config.default_provider, config)];
    for name in &config.fallback_providers {
        providers.push(build_named_provider(name, config));
    }
    if providers.len() == 1 {
        providers.into_iter().next().unwrap()
    } else {
        Arc::new(Router::new(providers))
    }
}

/// Register the fixed set of built-in tools (spec §4.D table).
pub fn register_builtin_tools(registry: &mut ToolRegistry) {
    registry.register(Tool::new("shell", "Run a shell command in the workspace.", Arc::new(ShellTool)));
    registry.register(Tool::new("file_read", "Read a file from the workspace.", Arc::new(FileReadTool)));
    registry.register(Tool::new(
        "file_write",
        "Write a file in the workspace, creating parent directories as needed.",
        Arc::new(FileWriteTool),
    ));
    registry.register(Tool::new(
        "memory_store",
        "Store content under a memory key for later recall.",
        Arc::new(MemoryStoreTool),
    ));
    registry.register(Tool::new("memory_recall", "Recall content stored under a memory key.", Arc::new(MemoryRecallTool)));
    registry.register(Tool::new("memory_forget", "Delete a memory key.", Arc::new(MemoryForgetTool)));
    registry.register(Tool::new("memory_list_keys", "List all stored memory keys.", Arc::new(MemoryListKeysTool)));
    registry.register(Tool::new(
        "memory_delete_prefix",
        "Delete every memory key starting with a given prefix.",
        Arc::new(MemoryDeletePrefixTool),
    ));
    registry.register(Tool::new("http_request", "Make an HTTP GET or POST request.", Arc::new(HttpRequestTool)));
    registry.register(Tool::new(
        "git_operations",
        "Run an allowlisted git subcommand against a workspace-relative repo path.",
        Arc::new(GitOperationsTool),
    ));
    registry.register(Tool::new("agent_status", "Report workspace, memory, and security policy status.", Arc::new(AgentStatusTool)));
    registry.register(Tool::new("audit_log_read", "Read the last N lines of the audit log.", Arc::new(AuditLogReadTool)));
}

/// Probe every configured MCP server's `tools/list` and register each
/// remote tool under the registry as `<server>__<tool>` (spec §4.C, §4.D).
pub async fn register_mcp_tools(registry: &mut ToolRegistry, pool: &McpSessionPool, config: &Config) {
    for server in &config.mcp_servers {
        let remote_tools = pool.list_tools(&server.argv).await;
        for (remote_name, description) in remote_tools {
            let qualified = McpProxyHandler::qualified_name(&server.name, &remote_name);
            let meta = McpProxyMeta {
                argv: server.argv.clone(),
                remote_tool_name: remote_name,
            };
            registry.register(Tool::new(qualified, description, Arc::new(McpProxyHandler::new(meta))));
        }
    }
}

/// Build a fully wired `Runtime` from a loaded config: ensures the
/// workspace directory exists, constructs the security policy, memory
/// backend, provider chain, capability pool, and tool registry (built-ins
/// plus any configured MCP servers).
pub async fn build_runtime(config: Config, home: PathBuf) -> anyhow::Result<Runtime> {
    let workspace = workspace_dir(&home);
    std::fs::create_dir_all(&workspace)?;

    let security = Arc::new(SecurityPolicy::new(workspace.clone()));
    let memory = Arc::new(MemoryBackend::new(&workspace));
    let provider = build_provider(&config);

    let mut registry = ToolRegistry::new();
    register_builtin_tools(&mut registry);

    let mcp_pool = if config.mcp_servers.is_empty() {
        None
    } else {
        let pool = Arc::new(McpSessionPool::new());
        register_mcp_tools(&mut registry, &pool, &config).await;
        Some(pool)
    };

    let tool_ctx = ToolContext {
        security,
        memory,
        mcp_pool,
        max_tool_output_chars: DEFAULT_MAX_TOOL_OUTPUT_CHARS,
    };

    Ok(Runtime {
        config,
        provider,
        registry,
        tool_ctx,
        home,
    })
}
