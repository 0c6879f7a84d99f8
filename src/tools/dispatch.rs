//! Extracting a balanced JSON object from noisy model output, parsing the
//! two tolerated `tool_calls` shapes, and running them through the registry
//! while evicting the running context buffer against a char budget
//! (spec §4.D).

use crate::tools::{ToolContext, ToolRegistry, ToolResult};
use serde_json::Value;

/// Lower bound for `MAX_CONTEXT_CHARS`.
pub const MIN_CONTEXT_CHARS: usize = 4000;
/// Upper bound for `MAX_CONTEXT_CHARS`.
pub const MAX_CONTEXT_CHARS_CEIL: usize = 64000;
/// Default budget for the running tool-results context buffer.
pub const DEFAULT_MAX_CONTEXT_CHARS: usize = 12000;

pub const TRUNCATION_MARKER: &str = "[... earlier tool results truncated due to context budget ...]\n";

pub fn clamp_max_context_chars(requested: usize) -> usize {
    requested.clamp(MIN_CONTEXT_CHARS, MAX_CONTEXT_CHARS_CEIL)
}

/// Extract the first balanced `{...}` substring from `text`, tolerating
/// Markdown code fences (``` or ```json) around it. Quoted strings are
/// tracked so that braces inside them (escaped or not) never affect depth.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let bytes = text.as_bytes();
    let start = text.find('{')?;

    let mut depth: i32 = 0;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, &byte) in bytes[start..].iter().enumerate() {
        let ch = byte as char;
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    let end = start + offset + 1;
                    return Some(&text[start..end]);
                }
            }
            _ => {}
        }
    }

    None
}

/// One entry from a model's `tool_calls` array, normalized from either
/// tolerated wire shape.
struct ParsedCall {
    name: String,
    arguments: Value,
}

/// Parse `tool_calls` entries, accepting:
/// - Shape A (OpenAI-style): `{"function":{"name":N,"arguments":A}}` where
///   `A` is a JSON string holding arguments.
/// - Shape B: `{"function":N,"arguments":A_obj}` where `A_obj` is an object.
fn parse_tool_calls(value: &Value) -> Vec<ParsedCall> {
    let Some(calls) = value.get("tool_calls").and_then(Value::as_array) else {
        return Vec::new();
    };

    calls
        .iter()
        .filter_map(|call| {
            let function = call.get("function")?;
            if let Some(name) = function.as_str() {
                // Shape B
                let arguments = call.get("arguments").cloned().unwrap_or(Value::Null);
                return Some(ParsedCall {
                    name: name.to_string(),
                    arguments,
                });
            }

            // Shape A
            let name = function.get("name")?.as_str()?.to_string();
            let arguments = function
                .get("arguments")
                .and_then(Value::as_str)
                .and_then(|s| serde_json::from_str(s).ok())
                .unwrap_or(Value::Object(serde_json::Map::new()));
            Some(ParsedCall { name, arguments })
        })
        .collect()
}

/// Outcome of one `dispatch` call.
pub struct DispatchOutcome {
    /// Whether a tool_calls JSON object was found and parsed.
    pub dispatched: bool,
}

/// Run the tool-calling round described in spec §4.D.
///
/// Extracts a tool_calls JSON object from `model_response`, executes each
/// call against `registry` in emission order, and appends
/// `[ok|error] <name>: <output>\n` entries into `context_buffer`, evicting
/// from the front when the buffer would exceed `max_context_chars`.
pub async fn dispatch(
    ctx: &ToolContext,
    registry: &ToolRegistry,
    model_response: &str,
    context_buffer: &mut String,
    max_context_chars: usize,
) -> DispatchOutcome {
    let Some(json_text) = extract_json_object(model_response) else {
        return DispatchOutcome { dispatched: false };
    };

    let Ok(parsed) = serde_json::from_str::<Value>(json_text) else {
        return DispatchOutcome { dispatched: false };
    };

    let calls = parse_tool_calls(&parsed);
    if calls.is_empty() {
        return DispatchOutcome { dispatched: false };
    }

    for call in calls {
        let result = match registry.execute(ctx, &call.name, call.arguments).await {
            Some(result) => result,
            // An unrecognised tool name is silently skipped (open question,
            // spec §9): we still want the model to see *something* went
            // nowhere, but per spec behavior no entry is appended at all.
            None => continue,
        };
        append_entry(context_buffer, &call.name, &result, max_context_chars);
    }

    DispatchOutcome { dispatched: true }
}

fn append_entry(buffer: &mut String, tool_name: &str, result: &ToolResult, max_context_chars: usize) {
    let tag = if result.success { "ok" } else { "error" };
    let entry = format!("[{tag}] {tool_name}: {}\n", result.output);
    buffer.push_str(&entry);
    evict_if_needed(buffer, max_context_chars, entry.len());
}

/// Evict from the front of `buffer` at the next `\n` boundary past the
/// overflow amount, then prepend the truncation marker.
fn evict_if_needed(buffer: &mut String, max_context_chars: usize, last_entry_len: usize) {
    if buffer.len() <= max_context_chars {
        return;
    }

    let already_marked = buffer.starts_with(TRUNCATION_MARKER);
    let search_from = if already_marked {
        TRUNCATION_MARKER.len()
    } else {
        0
    };

    let overflow = buffer.len() - max_context_chars;
    let cut_target = search_from + overflow;
    let cut_at = buffer[cut_target.min(buffer.len())..]
        .find('\n')
        .map(|offset| cut_target + offset + 1)
        .unwrap_or(buffer.len().saturating_sub(last_entry_len.min(buffer.len())));

    let remainder = buffer[cut_at.min(buffer.len())..].to_string();
    *buffer = format!("{TRUNCATION_MARKER}{remainder}");
}

#[cfg(test)]
mod tests;
