use super::*;
use crate::memory::MemoryBackend;
use crate::security::SecurityPolicy;
use crate::tools::builtin::MemoryRecallTool;
use crate::tools::{Tool, ToolContext, ToolHandler, ToolRegistry};
use async_trait::async_trait;
use std::sync::Arc;
use tempfile::tempdir;

fn ctx(dir: &std::path::Path) -> ToolContext {
    ToolContext {
        security: Arc::new(SecurityPolicy::new(dir.to_path_buf())),
        memory: Arc::new(MemoryBackend::new(dir)),
        mcp_pool: None,
        max_tool_output_chars: crate::tools::DEFAULT_MAX_TOOL_OUTPUT_CHARS,
    }
}

// Property 9 / extractor behavior.
#[test]
fn extracts_balanced_object_from_prose_wrapping() {
    let obj = r#"{"tool_calls":[{"function":"x","arguments":{}}]}"#;
    let text = format!("x{obj}y");
    assert_eq!(extract_json_object(&text), Some(obj));
}

#[test]
fn extracts_from_markdown_fence() {
    let obj = r#"{"a": 1}"#;
    let fenced = format!("```json\n{obj}\n```");
    assert_eq!(extract_json_object(&fenced), Some(obj));
}

#[test]
fn extractor_respects_quoted_braces() {
    let obj = r#"{"msg": "a } b \" c { d"}"#;
    assert_eq!(extract_json_object(obj), Some(obj));
}

#[test]
fn extractor_returns_none_without_braces() {
    assert_eq!(extract_json_object("no json here"), None);
}

// S1 — prose-wrapped tool call.
#[tokio::test]
async fn s1_prose_wrapped_tool_call_dispatches_and_audits() {
    let dir = tempdir().unwrap();
    let ctx = ctx(dir.path());
    ctx.memory.store("x", "hello").unwrap();

    let mut registry = ToolRegistry::new();
    registry.register(Tool::new(
        "memory_recall",
        "Recall a memory entry.",
        Arc::new(MemoryRecallTool),
    ));

    let response = "Sure!\n{\"tool_calls\":[{\"function\":\"memory_recall\",\"arguments\":{\"key\":\"x\"}}]}\nHope that helps.";
    let mut buffer = String::new();
    let outcome = dispatch(&ctx, &registry, response, &mut buffer, DEFAULT_MAX_CONTEXT_CHARS).await;

    assert!(outcome.dispatched);
    assert_eq!(buffer, "[ok] memory_recall: hello\n\n");

    let audit = std::fs::read_to_string(ctx.security.audit_log_path()).unwrap();
    let matches = audit.lines().filter(|l| l.contains("memory_recall")).count();
    assert_eq!(matches, 1);
}

#[tokio::test]
async fn shape_b_function_name_with_object_arguments() {
    let dir = tempdir().unwrap();
    let ctx = ctx(dir.path());
    ctx.memory.store("x", "hi").unwrap();

    let mut registry = ToolRegistry::new();
    registry.register(Tool::new("memory_recall", "desc", Arc::new(MemoryRecallTool)));

    let response = r#"{"tool_calls":[{"function":"memory_recall","arguments":{"key":"x"}}]}"#;
    let mut buffer = String::new();
    let outcome = dispatch(&ctx, &registry, response, &mut buffer, DEFAULT_MAX_CONTEXT_CHARS).await;
    assert!(outcome.dispatched);
    assert!(buffer.contains("hi"));
}

#[tokio::test]
async fn no_tool_calls_field_means_not_dispatched() {
    let dir = tempdir().unwrap();
    let ctx = ctx(dir.path());
    let registry = ToolRegistry::new();
    let mut buffer = String::new();
    let outcome = dispatch(&ctx, &registry, "just {\"a\":1} text", &mut buffer, DEFAULT_MAX_CONTEXT_CHARS).await;
    assert!(!outcome.dispatched);
    assert!(buffer.is_empty());
}

#[tokio::test]
async fn unknown_tool_name_is_silently_skipped() {
    let dir = tempdir().unwrap();
    let ctx = ctx(dir.path());
    let registry = ToolRegistry::new();
    let response = r#"{"tool_calls":[{"function":"nonexistent","arguments":{}}]}"#;
    let mut buffer = String::new();
    let outcome = dispatch(&ctx, &registry, response, &mut buffer, DEFAULT_MAX_CONTEXT_CHARS).await;
    assert!(outcome.dispatched);
    assert!(buffer.is_empty());
}

#[tokio::test]
async fn tool_error_is_captured_not_aborted() {
    let dir = tempdir().unwrap();
    let ctx = ctx(dir.path());

    struct Failing;
    #[async_trait]
    impl ToolHandler for Failing {
        async fn execute(&self, _ctx: &ToolContext, _args: serde_json::Value) -> ToolResult {
            ToolResult::err("boom")
        }
    }
    let mut registry = ToolRegistry::new();
    registry.register(Tool::new("flaky", "desc", Arc::new(Failing)));

    let response = r#"{"tool_calls":[{"function":"flaky","arguments":{}}]}"#;
    let mut buffer = String::new();
    let outcome = dispatch(&ctx, &registry, response, &mut buffer, DEFAULT_MAX_CONTEXT_CHARS).await;
    assert!(outcome.dispatched);
    assert_eq!(buffer, "[error] flaky: boom\n");
}

// S4 — context eviction under repeated large tool results.
#[tokio::test]
async fn s4_context_buffer_evicts_from_front_under_budget() {
    let dir = tempdir().unwrap();
    let ctx = ctx(dir.path());

    struct Big;
    #[async_trait]
    impl ToolHandler for Big {
        async fn execute(&self, _ctx: &ToolContext, _args: serde_json::Value) -> ToolResult {
            ToolResult::ok("x".repeat(1000))
        }
    }
    let mut registry = ToolRegistry::new();
    registry.register(Tool::new("big", "desc", Arc::new(Big)));

    let mut buffer = String::new();
    let entry_len = format!("[ok] big: {}\n", "x".repeat(1000)).len();
    for _ in 0..20 {
        let response = r#"{"tool_calls":[{"function":"big","arguments":{}}]}"#;
        dispatch(&ctx, &registry, response, &mut buffer, DEFAULT_MAX_CONTEXT_CHARS).await;
    }

    assert!(buffer.starts_with(TRUNCATION_MARKER));
    assert!(buffer.len() <= DEFAULT_MAX_CONTEXT_CHARS + entry_len);
    // Most recent result is still present.
    assert!(buffer.ends_with(&format!("{}\n", "x".repeat(1000))));
}

#[test]
fn clamp_context_chars_respects_bounds() {
    assert_eq!(clamp_max_context_chars(0), MIN_CONTEXT_CHARS);
    assert_eq!(clamp_max_context_chars(1_000_000), MAX_CONTEXT_CHARS_CEIL);
    assert_eq!(clamp_max_context_chars(8000), 8000);
}
