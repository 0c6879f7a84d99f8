//! The capability proxy: a newline-delimited JSON-RPC 2.0 stdio client with
//! a persistent session pool, letting an external subprocess publish tools
//! at runtime (spec §4.C).

use crate::errors::{BareClawError, BareClawResult};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout};
use tokio::sync::Mutex;

/// Per-read deadline for probe sessions (startup capability discovery).
const PROBE_READ_DEADLINE: Duration = Duration::from_secs(8);

/// A single child-process capability server, speaking newline-delimited
/// JSON-RPC 2.0 on its stdin/stdout. stderr is discarded.
pub struct McpSession {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
    next_id: AtomicU64,
    /// `Some` for probe sessions (bounded reads); `None` for pool sessions
    /// (blocking reads).
    read_deadline: Option<Duration>,
}

impl McpSession {
    /// Spawn `argv[0] argv[1..]`, perform the mandatory handshake, and
    /// return the live session. `probe` selects the per-read deadline: probe
    /// sessions apply `PROBE_READ_DEADLINE` so a hung server can't stall
    /// startup; pool sessions read without a deadline.
    pub async fn start(argv: &[String], probe: bool) -> BareClawResult<Self> {
        if argv.is_empty() {
            return Err(BareClawError::InvalidInput("empty argv".into()));
        }

        let mut cmd = tokio::process::Command::new(&argv[0]);
        cmd.args(&argv[1..])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null());

        let mut child = cmd
            .spawn()
            .map_err(|e| BareClawError::Resource(format!("failed to spawn {}: {e}", argv[0])))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| BareClawError::Resource("no stdin handle".into()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| BareClawError::Resource("no stdout handle".into()))?;

        let mut session = Self {
            child,
            stdin,
            stdout: BufReader::new(stdout),
            next_id: AtomicU64::new(1),
            read_deadline: if probe { Some(PROBE_READ_DEADLINE) } else { None },
        };

        session.handshake().await?;
        Ok(session)
    }

    async fn handshake(&mut self) -> BareClawResult<()> {
        let init_id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let request = json!({
            "jsonrpc": "2.0",
            "id": init_id,
            "method": "initialize",
            "params": {
                "protocolVersion": "2025-03-26",
                "capabilities": {},
                "clientInfo": { "name": "bareclaw", "version": env!("CARGO_PKG_VERSION") }
            }
        });
        self.write_frame(&request).await?;
        // Response content is not inspected — only its arrival matters.
        let _ = self.read_line().await?;

        let notification = json!({
            "jsonrpc": "2.0",
            "method": "notifications/initialized",
            "params": {}
        });
        self.write_frame(&notification).await?;
        Ok(())
    }

    async fn write_frame(&mut self, value: &Value) -> BareClawResult<()> {
        let mut line =
            serde_json::to_string(value).map_err(|e| BareClawError::Protocol(e.to_string()))?;
        line.push('\n');
        self.stdin
            .write_all(line.as_bytes())
            .await
            .map_err(|e| BareClawError::Transport(e.to_string()))?;
        self.stdin
            .flush()
            .await
            .map_err(|e| BareClawError::Transport(e.to_string()))?;
        Ok(())
    }

    async fn read_line(&mut self) -> BareClawResult<String> {
        let mut line = String::new();
        let read = self.stdout.read_line(&mut line);
        match self.read_deadline {
            Some(deadline) => match tokio::time::timeout(deadline, read).await {
                Ok(Ok(0)) => Err(BareClawError::Protocol("capability server closed stdout".into())),
                Ok(Ok(_)) => Ok(line),
                Ok(Err(e)) => Err(BareClawError::Transport(e.to_string())),
                Err(_) => Err(BareClawError::Timeout(deadline)),
            },
            None => match read.await {
                Ok(0) => Err(BareClawError::Protocol("capability server closed stdout".into())),
                Ok(_) => Ok(line),
                Err(e) => Err(BareClawError::Transport(e.to_string())),
            },
        }
    }

    /// Send a request and return its parsed JSON-RPC response (the whole
    /// envelope, not just `result`).
    async fn request(&mut self, method: &str, params: Value) -> BareClawResult<Value> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let frame = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params
        });
        self.write_frame(&frame).await?;
        let line = self.read_line().await?;
        serde_json::from_str(&line).map_err(|e| BareClawError::Protocol(e.to_string()))
    }

    /// `tools/list`. Tolerant of malformed responses: if JSON is invalid or
    /// `result.tools` is missing/not an array, returns an empty list.
    pub async fn list_tools(&mut self) -> Vec<(String, String)> {
        let response = match self.request("tools/list", json!({})).await {
            Ok(v) => v,
            Err(_) => return Vec::new(),
        };

        let Some(tools) = response["result"]["tools"].as_array() else {
            return Vec::new();
        };

        tools
            .iter()
            .filter_map(|t| {
                let name = t["name"].as_str()?.to_string();
                let description = t["description"].as_str().unwrap_or("").to_string();
                Some((name, description))
            })
            .collect()
    }

    /// `tools/call`. The transport succeeding but the remote tool failing is
    /// reported as `(success=true, "(mcp error: ...)")`, consistent with
    /// spec §4.C/§7 ProtocolError handling.
    pub async fn call_tool(&mut self, tool_name: &str, arguments: Value) -> (bool, String) {
        let response = match self
            .request("tools/call", json!({ "name": tool_name, "arguments": arguments }))
            .await
        {
            Ok(v) => v,
            Err(e) => return (false, format!("mcp transport error: {e}")),
        };

        if let Some(message) = response["error"]["message"].as_str() {
            return (true, format!("(mcp error: {message})"));
        }

        let result = &response["result"];
        let is_error = result["isError"].as_bool().unwrap_or(false);

        let text = collect_text_content(result);
        if text.is_empty() {
            if is_error {
                (true, "(mcp: tool returned empty error)".to_string())
            } else {
                (true, "(ok)".to_string())
            }
        } else {
            (true, text)
        }
    }

    /// Close stdin and wait for the child to exit.
    pub async fn shutdown(mut self) {
        let _ = self.stdin.shutdown().await;
        let _ = self.child.wait().await;
    }
}

/// Collect all `type: "text"` content blocks, newline-joined. Tolerates a
/// bare array, a bare string, or an object with a `content` array.
fn collect_text_content(result: &Value) -> String {
    let blocks: Vec<&Value> = match result {
        Value::Array(arr) => arr.iter().collect(),
        Value::String(s) => return s.clone(),
        Value::Object(_) => result["content"]
            .as_array()
            .map(|arr| arr.iter().collect())
            .unwrap_or_default(),
        _ => Vec::new(),
    };

    blocks
        .into_iter()
        .filter(|block| block["type"] == "text")
        .filter_map(|block| block["text"].as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Mapping from argv-joined-by-space to a live session. A session is
/// created on first `get_or_start`; every session is destroyed when the
/// pool is dropped.
pub struct McpSessionPool {
    sessions: Mutex<HashMap<String, McpSession>>,
}

impl McpSessionPool {
    pub fn new() -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
        }
    }

    fn key_for(argv: &[String]) -> String {
        argv.join(" ")
    }

    /// Run `f` against the session for `argv`, starting it first if needed.
    pub async fn with_session<F, T>(&self, argv: &[String], f: F) -> BareClawResult<T>
    where
        F: for<'a> FnOnce(
            &'a mut McpSession,
        ) -> std::pin::Pin<Box<dyn std::future::Future<Output = T> + 'a>>,
    {
        let key = Self::key_for(argv);
        let mut sessions = self.sessions.lock().await;
        if !sessions.contains_key(&key) {
            let session = McpSession::start(argv, false).await?;
            sessions.insert(key.clone(), session);
        }
        let session = sessions.get_mut(&key).expect("just inserted");
        Ok(f(session).await)
    }

    /// Call a tool on the (possibly newly-started) session for `argv`.
    pub async fn call_tool(&self, argv: &[String], tool_name: &str, arguments: Value) -> (bool, String) {
        let tool_name = tool_name.to_string();
        let result = self
            .with_session(argv, move |session| {
                Box::pin(async move { session.call_tool(&tool_name, arguments).await })
            })
            .await;
        match result {
            Ok(r) => r,
            Err(e) => (false, format!("mcp error: {e}")),
        }
    }

    /// List tools on the (possibly newly-started) session for `argv`.
    pub async fn list_tools(&self, argv: &[String]) -> Vec<(String, String)> {
        self.with_session(argv, |session| Box::pin(session.list_tools()))
            .await
            .unwrap_or_default()
    }

    /// Tear down every session, closing stdin and awaiting child exit.
    pub async fn shutdown(&self) {
        let mut sessions = self.sessions.lock().await;
        for (_, session) in sessions.drain() {
            session.shutdown().await;
        }
    }
}

impl Default for McpSessionPool {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-tool metadata carried for a proxied (MCP-backed) tool entry: the
/// subprocess argv to start/reuse, and the remote tool name to invoke.
#[derive(Debug, Clone)]
pub struct McpProxyMeta {
    pub argv: Vec<String>,
    pub remote_tool_name: String,
}
