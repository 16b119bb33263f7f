//! ChatGPT Codex wire types (OpenAI Responses API dialect)
//!
//! The request side is strict - we control what we send. The response side
//! is deliberately loose: the backend's output item schema varies across
//! event payloads, so every field is optional and the translator applies
//! the documented fallbacks instead of failing deserialization.

use serde::{Deserialize, Serialize};

// ============================================================================
// Request Types (Output - Serialize)
// ============================================================================

#[derive(Debug, Serialize)]
pub struct BackendRequest {
    pub model: String,
    pub instructions: String,
    pub input: Vec<InputItem>,
    pub stream: bool,
    pub store: bool,
    pub reasoning: Reasoning,
    pub text: TextControls,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<BackendTool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<BackendToolChoice>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parallel_tool_calls: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct Reasoning {
    pub effort: String,
    pub summary: &'static str,
}

#[derive(Debug, Serialize)]
pub struct TextControls {
    pub verbosity: &'static str,
}

/// One entry in the backend's flattened `input` sequence.
///
/// A single public message may expand to several items: tool interactions
/// are standalone items, while runs of text/image content collapse into
/// one `message` item with direction-tagged parts.
#[derive(Debug, Serialize, PartialEq)]
#[serde(tag = "type")]
pub enum InputItem {
    #[serde(rename = "message")]
    Message {
        role: &'static str,
        content: Vec<ContentPart>,
    },
    #[serde(rename = "function_call")]
    FunctionCall {
        call_id: String,
        name: String,
        arguments: String,
    },
    #[serde(rename = "function_call_output")]
    FunctionCallOutput { call_id: String, output: String },
}

/// Content part tagged by direction: `input_*` for user-authored parts,
/// `output_text` for assistant-authored parts.
#[derive(Debug, Serialize, PartialEq)]
#[serde(tag = "type")]
pub enum ContentPart {
    #[serde(rename = "input_text")]
    InputText { text: String },
    #[serde(rename = "output_text")]
    OutputText { text: String },
    #[serde(rename = "input_image")]
    InputImage { image_url: String },
}

#[derive(Debug, Serialize)]
pub struct BackendTool {
    #[serde(rename = "type")]
    pub tool_type: &'static str,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub parameters: serde_json::Value,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(untagged)]
pub enum BackendToolChoice {
    Mode(&'static str), // "auto", "none", "required"
    Function {
        #[serde(rename = "type")]
        choice_type: &'static str,
        name: String,
    },
}

// ============================================================================
// Response Types (Input - Deserialize)
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct BackendResponse {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    #[allow(dead_code)]
    pub model: Option<String>,
    #[serde(default)]
    pub output: Vec<OutputItem>,
    #[serde(default)]
    pub usage: Option<BackendUsage>,
    #[serde(default)]
    #[allow(dead_code)]
    pub stop_reason: Option<String>,
}

/// Output item: either a `function_call` or a message carrying parts.
/// Kept as one loose struct because the backend mixes the shapes freely.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputItem {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "type", default)]
    pub item_type: Option<String>,
    #[serde(default)]
    #[allow(dead_code)]
    pub role: Option<String>,
    #[serde(default)]
    pub call_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub arguments: Option<String>,
    #[serde(default)]
    pub content: Vec<OutputPart>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputPart {
    #[serde(rename = "type", default)]
    pub part_type: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub call_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub arguments: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct BackendUsage {
    #[serde(default)]
    pub input_tokens: u64,
    #[serde(default)]
    pub output_tokens: u64,
    #[serde(default)]
    #[allow(dead_code)]
    pub total_tokens: u64,
}
