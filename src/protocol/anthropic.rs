//! Anthropic Messages API wire types (the public protocol)
//!
//! Requests deserialize leniently: `content` and `system` accept both the
//! legacy bare-string form and the block-array form, and unknown optional
//! fields are simply ignored. Responses serialize the subset of the
//! Messages shape this bridge can actually produce.

use serde::{Deserialize, Serialize};

// ============================================================================
// Request Types (Input - Deserialize)
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct MessagesRequest {
    pub model: String,
    pub messages: Vec<Message>,
    #[serde(default)]
    pub system: Option<SystemPrompt>,
    #[serde(default)]
    pub stream: Option<bool>,
    #[serde(default)]
    pub tools: Option<Vec<ToolSpec>>,
    #[serde(default)]
    pub tool_choice: Option<ToolChoice>,
    #[serde(default)]
    pub parallel_tool_calls: Option<bool>,
    // Sampling controls have no Responses-API counterpart in this mapping
    #[serde(default)]
    #[allow(dead_code)]
    pub max_tokens: Option<u32>,
    #[serde(default)]
    #[allow(dead_code)]
    pub temperature: Option<f32>,
    #[serde(default)]
    #[allow(dead_code)]
    pub metadata: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum SystemPrompt {
    Text(String),
    Blocks(Vec<ContentBlock>),
}

#[derive(Debug, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: MessageContent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    /// Legacy form: a bare string is a single text block
    Text(String),
    Blocks(Vec<ContentBlock>),
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "image")]
    Image { source: ImageSource },
    #[serde(rename = "tool_use")]
    ToolUse {
        id: String,
        name: String,
        #[serde(default)]
        input: Option<serde_json::Value>,
    },
    #[serde(rename = "tool_result")]
    ToolResult {
        tool_use_id: String,
        #[serde(default)]
        content: Option<ToolResultContent>,
        #[serde(default)]
        is_error: Option<bool>,
    },
    /// Any block kind we don't translate (thinking, redacted_thinking, ...).
    /// Accepted so one exotic block never rejects the whole request.
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Deserialize)]
pub struct ImageSource {
    /// Image source kind (e.g., "base64") - captured for shape validation
    #[serde(rename = "type", default)]
    #[allow(dead_code)]
    pub source_type: Option<String>,
    #[serde(default)]
    pub media_type: Option<String>,
    #[serde(default)]
    pub data: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ToolResultContent {
    Text(String),
    Blocks(Vec<ToolResultBlock>),
}

/// Nested tool-result blocks; only text carries over to the backend
#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub enum ToolResultBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub input_schema: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub enum ToolChoice {
    #[serde(rename = "auto")]
    Auto,
    #[serde(rename = "none")]
    None,
    #[serde(rename = "any")]
    Any,
    #[serde(rename = "tool")]
    Tool { name: String },
}

// ============================================================================
// Response Types (Output - Serialize)
// ============================================================================

#[derive(Debug, Serialize)]
pub struct MessagesResponse {
    pub id: String,
    #[serde(rename = "type")]
    pub response_type: &'static str,
    pub role: &'static str,
    pub model: String,
    pub content: Vec<ResponseBlock>,
    pub stop_reason: StopReason,
    pub stop_sequence: Option<String>,
    pub usage: Usage,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type")]
pub enum ResponseBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "tool_use")]
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },
}

impl ResponseBlock {
    pub fn is_tool_use(&self) -> bool {
        matches!(self, ResponseBlock::ToolUse { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    EndTurn,
    ToolUse,
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct Usage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legacy_string_content_deserializes() {
        let body = r#"{
            "model": "claude-sonnet-4-20250514",
            "messages": [{"role": "user", "content": "Hello"}]
        }"#;

        let request: MessagesRequest = serde_json::from_str(body).unwrap();
        assert_eq!(request.messages.len(), 1);
        assert!(matches!(
            request.messages[0].content,
            MessageContent::Text(ref t) if t == "Hello"
        ));
    }

    #[test]
    fn test_block_content_deserializes() {
        let body = r#"{
            "model": "claude-sonnet-4-20250514",
            "messages": [{
                "role": "assistant",
                "content": [
                    {"type": "text", "text": "Let me check."},
                    {"type": "tool_use", "id": "tu_1", "name": "Read", "input": {"path": "a.txt"}}
                ]
            }]
        }"#;

        let request: MessagesRequest = serde_json::from_str(body).unwrap();
        let MessageContent::Blocks(blocks) = &request.messages[0].content else {
            panic!("expected block content");
        };
        assert_eq!(blocks.len(), 2);
        assert!(matches!(blocks[1], ContentBlock::ToolUse { .. }));
    }

    #[test]
    fn test_tool_result_without_content() {
        let body = r#"{
            "model": "m",
            "messages": [{
                "role": "user",
                "content": [{"type": "tool_result", "tool_use_id": "tu_1", "is_error": true}]
            }]
        }"#;

        let request: MessagesRequest = serde_json::from_str(body).unwrap();
        let MessageContent::Blocks(blocks) = &request.messages[0].content else {
            panic!("expected block content");
        };
        assert!(matches!(
            blocks[0],
            ContentBlock::ToolResult {
                content: None,
                is_error: Some(true),
                ..
            }
        ));
    }

    #[test]
    fn test_unknown_block_type_deserializes_as_unknown() {
        let body = r#"{
            "model": "m",
            "messages": [{
                "role": "assistant",
                "content": [
                    {"type": "thinking", "thinking": "hmm", "signature": "sig"},
                    {"type": "text", "text": "answer"}
                ]
            }]
        }"#;

        let request: MessagesRequest = serde_json::from_str(body).unwrap();
        let MessageContent::Blocks(blocks) = &request.messages[0].content else {
            panic!("expected block content");
        };
        assert!(matches!(blocks[0], ContentBlock::Unknown));
        assert!(matches!(blocks[1], ContentBlock::Text { .. }));
    }

    #[test]
    fn test_response_serializes_with_snake_case_stop_reason() {
        let response = MessagesResponse {
            id: "resp_1".to_string(),
            response_type: "message",
            role: "assistant",
            model: "claude-sonnet-4-20250514".to_string(),
            content: vec![ResponseBlock::Text {
                text: "hi".to_string(),
            }],
            stop_reason: StopReason::EndTurn,
            stop_sequence: None,
            usage: Usage::default(),
        };

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["type"], "message");
        assert_eq!(json["stop_reason"], "end_turn");
        assert_eq!(json["content"][0]["type"], "text");
        assert_eq!(json["usage"]["input_tokens"], 0);
    }
}
