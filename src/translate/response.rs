//! Codex → Anthropic response translation
//!
//! Maps the assembled backend response into an Anthropic Messages response.
//! The backend's output items are loose (see `protocol::backend`), so every
//! extraction has a documented fallback; this translator never fails.

use crate::protocol::anthropic::{MessagesResponse, ResponseBlock, StopReason, Usage};
use crate::protocol::backend::{BackendResponse, OutputItem, OutputPart};

/// Translate a backend response, restoring the caller's original model id.
pub fn translate_response(response: &BackendResponse, original_model: &str) -> MessagesResponse {
    let mut content: Vec<ResponseBlock> = Vec::new();

    for item in &response.output {
        match item.item_type.as_deref() {
            Some("function_call") => {
                content.push(tool_use_from_item(item));
            }
            _ => {
                for part in &item.content {
                    if let Some(block) = block_from_part(part) {
                        content.push(block);
                    }
                }
            }
        }
    }

    // The public response is never content-less
    if content.is_empty() {
        content.push(ResponseBlock::Text {
            text: String::new(),
        });
    }

    let stop_reason = if content.iter().any(ResponseBlock::is_tool_use) {
        StopReason::ToolUse
    } else {
        StopReason::EndTurn
    };

    let usage = response
        .usage
        .map(|u| Usage {
            input_tokens: u.input_tokens,
            output_tokens: u.output_tokens,
        })
        .unwrap_or_default();

    MessagesResponse {
        id: response.id.clone().unwrap_or_default(),
        response_type: "message",
        role: "assistant",
        model: original_model.to_string(),
        content,
        stop_reason,
        stop_sequence: None,
        usage,
    }
}

/// Build a tool_use block from a function_call output item.
///
/// Id falls back call_id → item id → "tool_call"; name falls back to
/// "tool"; arguments parse best-effort.
fn tool_use_from_item(item: &OutputItem) -> ResponseBlock {
    ResponseBlock::ToolUse {
        id: first_non_empty(&[item.call_id.as_deref(), item.id.as_deref()])
            .unwrap_or("tool_call")
            .to_string(),
        name: item
            .name
            .clone()
            .unwrap_or_else(|| "tool".to_string()),
        input: parse_arguments(item.arguments.as_deref()),
    }
}

/// Map a message-item content part to a response block, if it carries one.
///
/// `output_text` parts with non-empty text become text blocks; tool-use
/// shaped parts (a name plus some identifier) become tool_use blocks under
/// the same fallback rules as standalone function_call items.
fn block_from_part(part: &OutputPart) -> Option<ResponseBlock> {
    if part.part_type.as_deref() == Some("output_text") {
        let text = part.text.as_deref().unwrap_or("");
        if text.is_empty() {
            return None;
        }
        return Some(ResponseBlock::Text {
            text: text.to_string(),
        });
    }

    let name = part.name.as_deref()?;
    let id = first_non_empty(&[part.call_id.as_deref(), part.id.as_deref()])?;

    Some(ResponseBlock::ToolUse {
        id: id.to_string(),
        name: name.to_string(),
        input: parse_arguments(part.arguments.as_deref()),
    })
}

fn first_non_empty<'a>(candidates: &[Option<&'a str>]) -> Option<&'a str> {
    candidates
        .iter()
        .flatten()
        .copied()
        .find(|s| !s.is_empty())
}

/// Parse a function-call arguments string; unparseable strings are wrapped
/// rather than lost, absent arguments become an empty object.
fn parse_arguments(arguments: Option<&str>) -> serde_json::Value {
    match arguments {
        None => serde_json::json!({}),
        Some(raw) => {
            serde_json::from_str(raw).unwrap_or_else(|_| serde_json::json!({ "raw": raw }))
        }
    }
}
