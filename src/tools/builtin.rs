//! Built-in tool implementations (spec §4.D table).

use crate::mcp::McpProxyMeta;
use crate::tools::{ToolContext, ToolHandler, ToolResult};
use async_trait::async_trait;
use serde_json::Value;
use std::process::Stdio;
use tokio::io::AsyncReadExt;

fn missing(field: &str) -> ToolResult {
    ToolResult::err(format!("missing required field: {field}"))
}

fn str_arg<'a>(args: &'a Value, field: &str) -> Option<&'a str> {
    args.get(field).and_then(Value::as_str)
}

/// `shell` — run a command via `/bin/sh -c`, after the blocklist check.
pub struct ShellTool;

#[async_trait]
impl ToolHandler for ShellTool {
    async fn execute(&self, ctx: &ToolContext, args: Value) -> ToolResult {
        let Some(command) = str_arg(&args, "command") else {
            return missing("command");
        };

        ctx.security.audit_log("shell", command);

        if !ctx.security.allow_shell_command(command) {
            return ToolResult::err("shell: command blocked by security policy");
        }

        let output = tokio::process::Command::new("/bin/sh")
            .arg("-c")
            .arg(command)
            .stdin(Stdio::null())
            .output()
            .await;

        match output {
            Ok(out) => {
                let stdout = String::from_utf8_lossy(&out.stdout).to_string();
                let stderr = String::from_utf8_lossy(&out.stderr).to_string();
                let text = if stdout.is_empty() { stderr } else { stdout };
                let result = if out.status.success() {
                    ToolResult::ok(text)
                } else {
                    ToolResult::err(text)
                };
                result.capped(ctx.max_tool_output_chars)
            }
            Err(e) => ToolResult::err(format!("shell: failed to spawn: {e}")),
        }
    }
}

/// `file_read` — read up to 4 MiB from a workspace-relative path.
pub struct FileReadTool;

const MAX_READ_BYTES: u64 = 4 * 1024 * 1024;

#[async_trait]
impl ToolHandler for FileReadTool {
    async fn execute(&self, ctx: &ToolContext, args: Value) -> ToolResult {
        let Some(path) = str_arg(&args, "path") else {
            return missing("path");
        };

        ctx.security.audit_log("file_read", path);

        if !ctx.security.allow_path(path) {
            return ToolResult::err("file_read: path outside workspace is not allowed");
        }

        let resolved = ctx.security.resolve(path);
        match tokio::fs::File::open(&resolved).await {
            Ok(mut file) => {
                let mut buf = Vec::new();
                match (&mut file).take(MAX_READ_BYTES).read_to_end(&mut buf).await {
                    Ok(_) => {
                        let content = String::from_utf8_lossy(&buf).into_owned();
                        ToolResult::ok(content).capped(ctx.max_tool_output_chars)
                    }
                    Err(e) => ToolResult::err(format!("file_read: {e}")),
                }
            }
            Err(e) => ToolResult::err(format!("file_read: {e}")),
        }
    }
}

/// `file_write` — create parent dirs, truncate-write.
pub struct FileWriteTool;

#[async_trait]
impl ToolHandler for FileWriteTool {
    async fn execute(&self, ctx: &ToolContext, args: Value) -> ToolResult {
        let Some(path) = str_arg(&args, "path") else {
            return missing("path");
        };
        let content = str_arg(&args, "content").unwrap_or("");

        ctx.security.audit_log("file_write", path);

        if !ctx.security.allow_path(path) {
            return ToolResult::err("file_write: path outside workspace is not allowed");
        }

        let resolved = ctx.security.resolve(path);
        if let Some(parent) = resolved.parent() {
            if let Err(e) = tokio::fs::create_dir_all(parent).await {
                return ToolResult::err(format!("file_write: {e}"));
            }
        }

        match tokio::fs::write(&resolved, content).await {
            Ok(()) => ToolResult::ok(format!("wrote {} bytes to {}", content.len(), path)),
            Err(e) => ToolResult::err(format!("file_write: {e}")),
        }
    }
}

/// `memory_store` — default key `"default"`.
pub struct MemoryStoreTool;

#[async_trait]
impl ToolHandler for MemoryStoreTool {
    async fn execute(&self, ctx: &ToolContext, args: Value) -> ToolResult {
        let key = str_arg(&args, "key").unwrap_or("default");
        let content = str_arg(&args, "content").unwrap_or("");

        ctx.security.audit_log("memory_store", key);

        match ctx.memory.store(key, content) {
            Ok(()) => ToolResult::ok(format!("stored under key '{key}'")),
            Err(e) => ToolResult::err(format!("memory_store: {e}")),
        }
    }
}

/// `memory_recall`
pub struct MemoryRecallTool;

#[async_trait]
impl ToolHandler for MemoryRecallTool {
    async fn execute(&self, ctx: &ToolContext, args: Value) -> ToolResult {
        let Some(key) = str_arg(&args, "key") else {
            return missing("key");
        };
        ctx.security.audit_log("memory_recall", key);
        ToolResult::ok(ctx.memory.recall(key)).capped(ctx.max_tool_output_chars)
    }
}

/// `memory_forget`
pub struct MemoryForgetTool;

#[async_trait]
impl ToolHandler for MemoryForgetTool {
    async fn execute(&self, ctx: &ToolContext, args: Value) -> ToolResult {
        let Some(key) = str_arg(&args, "key") else {
            return missing("key");
        };
        ctx.security.audit_log("memory_forget", key);
        match ctx.memory.forget(key) {
            Ok(()) => ToolResult::ok(format!("forgot key '{key}'")),
            Err(e) => ToolResult::err(format!("memory_forget: {e}")),
        }
    }
}

/// `memory_list_keys`
pub struct MemoryListKeysTool;

#[async_trait]
impl ToolHandler for MemoryListKeysTool {
    async fn execute(&self, ctx: &ToolContext, _args: Value) -> ToolResult {
        ctx.security.audit_log("memory_list_keys", "");
        ToolResult::ok(ctx.memory.list_keys()).capped(ctx.max_tool_output_chars)
    }
}

/// `memory_delete_prefix`
pub struct MemoryDeletePrefixTool;

#[async_trait]
impl ToolHandler for MemoryDeletePrefixTool {
    async fn execute(&self, ctx: &ToolContext, args: Value) -> ToolResult {
        let Some(prefix) = str_arg(&args, "prefix") else {
            return missing("prefix");
        };
        ctx.security.audit_log("memory_delete_prefix", prefix);
        let count = ctx.memory.delete_prefix(prefix);
        ToolResult::ok(format!("deleted {count} entries with prefix '{prefix}'"))
    }
}

/// `http_request`
pub struct HttpRequestTool;

#[async_trait]
impl ToolHandler for HttpRequestTool {
    async fn execute(&self, ctx: &ToolContext, args: Value) -> ToolResult {
        let Some(url) = str_arg(&args, "url") else {
            return missing("url");
        };
        let method = str_arg(&args, "method").unwrap_or("GET");
        let body = str_arg(&args, "body").unwrap_or("").to_string();

        ctx.security.audit_log("http_request", &format!("{method} {url}"));

        if url::Url::parse(url).is_err() {
            return ToolResult::err(format!("http_request: invalid URL: {url}"));
        }

        let client = reqwest::Client::new();
        let request = if method.eq_ignore_ascii_case("POST") {
            client.post(url).body(body)
        } else {
            client.get(url)
        };

        match request.send().await {
            Ok(resp) => {
                let status = resp.status();
                let text = resp.text().await.unwrap_or_default();
                let result = if status.as_u16() >= 400 {
                    ToolResult::err(format!("HTTP {}: {text}", status.as_u16()))
                } else {
                    ToolResult::ok(text)
                };
                result.capped(ctx.max_tool_output_chars)
            }
            Err(e) => ToolResult::err(format!("http_request: {e}")),
        }
    }
}

const GIT_ALLOWED_OPS: &[&str] = &[
    "status", "log", "diff", "add", "commit", "push", "pull", "clone", "init", "branch",
    "checkout", "fetch", "stash",
];

/// `git_operations` — argv built explicitly, never passed through a shell.
pub struct GitOperationsTool;

#[async_trait]
impl ToolHandler for GitOperationsTool {
    async fn execute(&self, ctx: &ToolContext, args: Value) -> ToolResult {
        let Some(op) = str_arg(&args, "op") else {
            return missing("op");
        };
        let path = str_arg(&args, "path").unwrap_or(".");
        let extra = str_arg(&args, "args").unwrap_or("");

        ctx.security
            .audit_log("git_operations", &format!("{op} {path} {extra}"));

        if !GIT_ALLOWED_OPS.contains(&op) {
            return ToolResult::err(format!("git_operations: unsupported op '{op}'"));
        }
        if !ctx.security.allow_path(path) {
            return ToolResult::err("git_operations: path outside workspace is not allowed");
        }

        let mut argv: Vec<&str> = vec!["-C", path, op];
        let extra_args: Vec<&str> = extra.split(' ').filter(|s| !s.is_empty()).collect();
        argv.extend(extra_args);

        let output = tokio::process::Command::new("git")
            .args(&argv)
            .stdin(Stdio::null())
            .output()
            .await;

        match output {
            Ok(out) => {
                let stdout = String::from_utf8_lossy(&out.stdout).to_string();
                let stderr = String::from_utf8_lossy(&out.stderr).to_string();
                let text = if stdout.is_empty() { stderr } else { stdout };
                let result = if out.status.success() {
                    ToolResult::ok(text)
                } else {
                    ToolResult::err(text)
                };
                result.capped(ctx.max_tool_output_chars)
            }
            Err(e) => ToolResult::err(format!("git_operations: failed to spawn git: {e}")),
        }
    }
}

/// `agent_status`
pub struct AgentStatusTool;

#[async_trait]
impl ToolHandler for AgentStatusTool {
    async fn execute(&self, ctx: &ToolContext, _args: Value) -> ToolResult {
        ctx.security.audit_log("agent_status", "");
        let entry_count = count_memory_entries(ctx.memory.root());
        let workspace = ctx.security.workspace_dir().display();
        ToolResult::ok(format!(
            "workspace: {workspace}\nmemory entries: {entry_count}\nsecurity policy: path allowlist + shell blocklist active"
        ))
    }
}

fn count_memory_entries(root: &std::path::Path) -> usize {
    fn walk(dir: &std::path::Path) -> usize {
        let Ok(entries) = std::fs::read_dir(dir) else {
            return 0;
        };
        let mut count = 0;
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                count += walk(&path);
            } else if path.extension().is_some_and(|e| e == "md") {
                count += 1;
            }
        }
        count
    }
    walk(root)
}

/// `audit_log_read`
pub struct AuditLogReadTool;

#[async_trait]
impl ToolHandler for AuditLogReadTool {
    async fn execute(&self, ctx: &ToolContext, args: Value) -> ToolResult {
        let n = args.get("n").and_then(Value::as_u64).unwrap_or(50) as usize;
        ctx.security.audit_log("audit_log_read", &n.to_string());
        ToolResult::ok(ctx.security.tail_audit_log(n)).capped(ctx.max_tool_output_chars)
    }
}

/// Proxies a single remote MCP tool. Closes over its own subprocess argv
/// and remote tool name directly — see `tools::ToolHandler`'s doc comment.
pub struct McpProxyHandler {
    meta: McpProxyMeta,
}

impl McpProxyHandler {
    pub fn new(meta: McpProxyMeta) -> Self {
        Self { meta }
    }

    /// Build the registry-facing tool name `<server>__<tool>` from a server
    /// label and the remote tool's own name.
    pub fn qualified_name(server: &str, remote_tool_name: &str) -> String {
        format!("{server}__{remote_tool_name}")
    }
}

#[async_trait]
impl ToolHandler for McpProxyHandler {
    async fn execute(&self, ctx: &ToolContext, args: Value) -> ToolResult {
        ctx.security.audit_log("mcp_tool", &self.meta.remote_tool_name);

        let Some(pool) = &ctx.mcp_pool else {
            return ToolResult::err("mcp_tool: no capability-proxy pool configured");
        };

        let (success, output) = pool
            .call_tool(&self.meta.argv, &self.meta.remote_tool_name, args)
            .await;
        let result = if success {
            ToolResult::ok(output)
        } else {
            ToolResult::err(output)
        };
        result.capped(ctx.max_tool_output_chars)
    }
}

#[cfg(test)]
mod tests;
