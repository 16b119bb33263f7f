//! Anthropic → Codex request translation
//!
//! Converts an Anthropic Messages request into the backend's Responses
//! request shape.
//!
//! # Key Differences
//!
//! | Anthropic                       | Codex Responses                       |
//! |---------------------------------|---------------------------------------|
//! | Top-level `system` field        | `instructions` string                 |
//! | `messages[].content` blocks     | flattened `input` item sequence       |
//! | `tool_use` block                | standalone `function_call` item       |
//! | `tool_result` block             | standalone `function_call_output` item|
//! | image source (media type + b64) | `input_image` data URL part           |
//! | `tool_choice: {type: "any"}`    | `tool_choice: "required"`             |
//!
//! A run of text/image blocks inside one message collapses into a single
//! `message` input item; tool interactions always flush that pending item
//! first so the backend sees turn-internal ordering intact.

use crate::models::ModelResolver;
use crate::protocol::anthropic::{
    ContentBlock, Message, MessageContent, MessagesRequest, Role, SystemPrompt, ToolChoice,
    ToolResultContent, ToolSpec,
};
use crate::protocol::backend::{
    BackendRequest, BackendTool, BackendToolChoice, ContentPart, InputItem, Reasoning,
    TextControls,
};

/// Translate a validated Anthropic request into a backend request.
///
/// `stream` mirrors the caller's flag: the backend is asked in the mode
/// consistent with how the public response will be shaped.
pub fn translate_request(request: &MessagesRequest, resolver: &ModelResolver) -> BackendRequest {
    let resolved = resolver.resolve(&request.model);
    let instructions = extract_system(request.system.as_ref());

    let mut input: Vec<InputItem> = Vec::new();
    for message in &request.messages {
        message_to_items(message, &mut input);
    }

    let tools: Option<Vec<BackendTool>> = request.tools.as_ref().and_then(|tools| {
        if tools.is_empty() {
            None
        } else {
            Some(tools.iter().map(map_tool).collect())
        }
    });

    let tool_choice = request.tool_choice.as_ref().map(map_tool_choice);

    // Safety policy: evaluated on the final tool list and choice. A mutating
    // tool in play forces parallel_tool_calls off the wire entirely so the
    // backend cannot race concurrent mutations.
    let parallel_tool_calls = if mutating_tool_in_play(tools.as_deref(), tool_choice.as_ref()) {
        if request.parallel_tool_calls.is_some() {
            tracing::debug!("Dropping parallel_tool_calls: mutating tool in play");
        }
        None
    } else {
        request.parallel_tool_calls
    };

    tracing::debug!(
        "Translated request: model={} -> {}, input_items={}, tools={}",
        request.model,
        resolved.model,
        input.len(),
        tools.as_ref().map(Vec::len).unwrap_or(0)
    );

    BackendRequest {
        model: resolved.model,
        instructions,
        input,
        stream: request.stream.unwrap_or(false),
        store: false,
        reasoning: Reasoning {
            effort: resolved.effort,
            summary: "auto",
        },
        text: TextControls {
            verbosity: "medium",
        },
        tools,
        tool_choice,
        parallel_tool_calls,
    }
}

/// Flatten the system prompt: strings pass through, block arrays keep only
/// their text blocks joined by newlines.
fn extract_system(system: Option<&SystemPrompt>) -> String {
    match system {
        None => String::new(),
        Some(SystemPrompt::Text(text)) => text.clone(),
        Some(SystemPrompt::Blocks(blocks)) => blocks
            .iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } if !text.is_empty() => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

/// Convert one public message into zero or more backend input items,
/// appending to `items`.
fn message_to_items(message: &Message, items: &mut Vec<InputItem>) {
    let role_tag = match message.role {
        Role::User => "user",
        Role::Assistant => "assistant",
    };

    let mut pending: Vec<ContentPart> = Vec::new();

    let flush = |pending: &mut Vec<ContentPart>, items: &mut Vec<InputItem>| {
        if !pending.is_empty() {
            items.push(InputItem::Message {
                role: role_tag,
                content: std::mem::take(pending),
            });
        }
    };

    let blocks: Vec<ContentBlock>;
    let block_slice: &[ContentBlock] = match &message.content {
        MessageContent::Text(text) => {
            blocks = vec![ContentBlock::Text { text: text.clone() }];
            &blocks
        }
        MessageContent::Blocks(b) => b,
    };

    for block in block_slice {
        match block {
            ContentBlock::Text { text } => {
                // Text is trimmed; whitespace-only text produces no part at all
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    continue;
                }
                let part = match message.role {
                    Role::User => ContentPart::InputText {
                        text: trimmed.to_string(),
                    },
                    Role::Assistant => ContentPart::OutputText {
                        text: trimmed.to_string(),
                    },
                };
                pending.push(part);
            }
            ContentBlock::Image { source } => {
                // An image without both media type and payload is dropped
                if let (Some(media_type), Some(data)) =
                    (source.media_type.as_deref(), source.data.as_deref())
                {
                    pending.push(ContentPart::InputImage {
                        image_url: format!("data:{};base64,{}", media_type, data),
                    });
                }
            }
            ContentBlock::ToolUse { id, name, input } => {
                flush(&mut pending, items);
                items.push(InputItem::FunctionCall {
                    call_id: id.clone(),
                    name: name.clone(),
                    arguments: serialize_tool_input(input.as_ref()),
                });
            }
            ContentBlock::ToolResult {
                tool_use_id,
                content,
                is_error,
            } => {
                flush(&mut pending, items);
                items.push(InputItem::FunctionCallOutput {
                    call_id: tool_use_id.clone(),
                    output: resolve_tool_result(content.as_ref(), is_error.unwrap_or(false)),
                });
            }
            // Block kinds we don't translate (thinking, etc.) carry
            // nothing forwardable
            ContentBlock::Unknown => {}
        }
    }

    flush(&mut pending, items);
}

/// Serialize a tool_use input value to the backend's arguments string.
///
/// Strings pass through verbatim; anything else is JSON-stringified with a
/// plain string coercion as the last resort. Absent input becomes `{}`.
fn serialize_tool_input(input: Option<&serde_json::Value>) -> String {
    match input {
        None => "{}".to_string(),
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(value) => serde_json::to_string(value).unwrap_or_else(|_| value.to_string()),
    }
}

/// Resolve tool_result content to the output text the backend expects.
fn resolve_tool_result(content: Option<&ToolResultContent>, is_error: bool) -> String {
    match content {
        Some(ToolResultContent::Text(text)) => text.clone(),
        Some(ToolResultContent::Blocks(blocks)) => blocks
            .iter()
            .filter_map(|block| match block {
                crate::protocol::anthropic::ToolResultBlock::Text { text }
                    if !text.is_empty() =>
                {
                    Some(text.as_str())
                }
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n"),
        None if is_error => "Tool execution failed".to_string(),
        None => String::new(),
    }
}

/// Map an Anthropic tool declaration, normalizing its schema on the way.
fn map_tool(tool: &ToolSpec) -> BackendTool {
    BackendTool {
        tool_type: "function",
        name: tool.name.clone(),
        description: tool.description.clone(),
        parameters: normalize_tool_schema(tool.input_schema.as_ref()),
    }
}

/// Normalize a JSON-Schema-ish object into a shape the backend accepts:
/// `type` defaults to "object"; object schemas get a `properties` mapping,
/// lose a non-array `required`, and default `additionalProperties` to true.
fn normalize_tool_schema(schema: Option<&serde_json::Value>) -> serde_json::Value {
    let mut normalized = match schema {
        Some(serde_json::Value::Object(map)) => map.clone(),
        _ => serde_json::Map::new(),
    };

    if !normalized.get("type").map(|t| t.is_string()).unwrap_or(false) {
        normalized.insert("type".to_string(), serde_json::json!("object"));
    }

    if normalized.get("type").and_then(|t| t.as_str()) == Some("object") {
        if !normalized
            .get("properties")
            .map(|p| p.is_object())
            .unwrap_or(false)
        {
            normalized.insert(
                "properties".to_string(),
                serde_json::Value::Object(serde_json::Map::new()),
            );
        }
        if let Some(required) = normalized.get("required") {
            if !required.is_array() {
                normalized.remove("required");
            }
        }
        if !normalized.contains_key("additionalProperties") {
            normalized.insert("additionalProperties".to_string(), serde_json::json!(true));
        }
    }

    serde_json::Value::Object(normalized)
}

/// Convert Anthropic tool_choice to the backend's representation
fn map_tool_choice(choice: &ToolChoice) -> BackendToolChoice {
    match choice {
        ToolChoice::Auto => BackendToolChoice::Mode("auto"),
        ToolChoice::None => BackendToolChoice::Mode("none"),
        ToolChoice::Any => BackendToolChoice::Mode("required"),
        ToolChoice::Tool { name } => BackendToolChoice::Function {
            choice_type: "function",
            name: name.clone(),
        },
    }
}

// ============================================================================
// Parallel Tool Call Guard
// ============================================================================

/// Patterns that mark a tool as mutating. Matched case-insensitively as
/// substrings of the tool name and description. Policy lives here and only
/// here; translation logic goes through `is_mutating_tool`.
const MUTATING_PATTERNS: &[&str] = &[
    "write", "edit", "update", "delete", "remove", "create", "patch", "move", "rename",
];

/// Heuristic: does this tool mutate state?
fn is_mutating_tool(name: &str, description: Option<&str>) -> bool {
    let name = name.to_lowercase();
    if MUTATING_PATTERNS.iter().any(|p| name.contains(p)) {
        return true;
    }
    if let Some(description) = description {
        let description = description.to_lowercase();
        return MUTATING_PATTERNS.iter().any(|p| description.contains(p));
    }
    false
}

/// True when the resolved tool set contains a mutating tool, or the tool
/// choice directly selects one.
fn mutating_tool_in_play(
    tools: Option<&[BackendTool]>,
    tool_choice: Option<&BackendToolChoice>,
) -> bool {
    if let Some(tools) = tools {
        if tools
            .iter()
            .any(|t| is_mutating_tool(&t.name, t.description.as_deref()))
        {
            return true;
        }
    }

    if let Some(BackendToolChoice::Function { name, .. }) = tool_choice {
        // The chosen tool may be absent from the list; the name alone still
        // goes through the heuristic
        let chosen = tools
            .into_iter()
            .flatten()
            .find(|t| t.name == *name);
        return match chosen {
            Some(tool) => is_mutating_tool(&tool.name, tool.description.as_deref()),
            None => is_mutating_tool(name, None),
        };
    }

    false
}
