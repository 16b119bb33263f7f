//! Streaming re-emitter
//!
//! The backend is consumed fully buffered (see `backend::assemble`), so no
//! true incremental stream exists to forward. Streaming callers instead get
//! a synthetic replay of the finished response: the ordered event sequence a
//! real incremental stream would have produced, with one delta per content
//! block.
//!
//! # Event Sequence
//!
//! | Event                 | Payload                                      |
//! |-----------------------|----------------------------------------------|
//! | `message_start`       | Message shell: empty content, zero usage     |
//! | `content_block_start` | Per block: empty text / tool_use header      |
//! | `content_block_delta` | Per block: full text or full input as one delta |
//! | `content_block_stop`  | Per block                                    |
//! | `message_delta`       | Real stop_reason and usage                   |
//! | `message_stop`        | —                                            |
//!
//! Block indices start at 0 and increment per block.

use serde::Serialize;

use crate::protocol::anthropic::{MessagesResponse, ResponseBlock};

/// One replayed event: name plus the JSON payload, framed by the caller
/// as `event: <name>\ndata: <payload>\n\n`.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplayEvent {
    pub name: &'static str,
    pub payload: serde_json::Value,
}

// ============================================================================
// Event Payloads
// ============================================================================

#[derive(Debug, Serialize)]
struct MessageStartEvent {
    #[serde(rename = "type")]
    event_type: &'static str,
    message: MessageShell,
}

/// The message as it looks before any content arrived
#[derive(Debug, Serialize)]
struct MessageShell {
    id: String,
    #[serde(rename = "type")]
    msg_type: &'static str,
    role: &'static str,
    content: Vec<serde_json::Value>,
    model: String,
    stop_reason: Option<String>,
    stop_sequence: Option<String>,
    usage: ShellUsage,
}

#[derive(Debug, Serialize)]
struct ShellUsage {
    input_tokens: u64,
    output_tokens: u64,
}

#[derive(Debug, Serialize)]
struct ContentBlockStartEvent {
    #[serde(rename = "type")]
    event_type: &'static str,
    index: usize,
    content_block: BlockHeader,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type")]
enum BlockHeader {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "tool_use")]
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },
}

#[derive(Debug, Serialize)]
struct ContentBlockDeltaEvent {
    #[serde(rename = "type")]
    event_type: &'static str,
    index: usize,
    delta: BlockDelta,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type")]
enum BlockDelta {
    #[serde(rename = "text_delta")]
    TextDelta { text: String },
    #[serde(rename = "input_json_delta")]
    InputJsonDelta { partial_json: String },
}

#[derive(Debug, Serialize)]
struct ContentBlockStopEvent {
    #[serde(rename = "type")]
    event_type: &'static str,
    index: usize,
}

#[derive(Debug, Serialize)]
struct MessageDeltaEvent {
    #[serde(rename = "type")]
    event_type: &'static str,
    delta: MessageDelta,
    usage: DeltaUsage,
}

#[derive(Debug, Serialize)]
struct MessageDelta {
    stop_reason: crate::protocol::anthropic::StopReason,
    stop_sequence: Option<String>,
}

/// Full usage totals, so streaming callers see the same numbers a
/// non-streaming response carries
#[derive(Debug, Serialize)]
struct DeltaUsage {
    input_tokens: u64,
    output_tokens: u64,
}

#[derive(Debug, Serialize)]
struct MessageStopEvent {
    #[serde(rename = "type")]
    event_type: &'static str,
}

// ============================================================================
// Replay
// ============================================================================

/// Expand a finished response into its synthetic event sequence.
pub fn replay(response: &MessagesResponse) -> Vec<ReplayEvent> {
    let mut events = Vec::with_capacity(response.content.len() * 3 + 3);

    events.push(event(
        "message_start",
        &MessageStartEvent {
            event_type: "message_start",
            message: MessageShell {
                id: response.id.clone(),
                msg_type: "message",
                role: "assistant",
                content: Vec::new(),
                model: response.model.clone(),
                stop_reason: None,
                stop_sequence: None,
                usage: ShellUsage {
                    input_tokens: 0,
                    output_tokens: 0,
                },
            },
        },
    ));

    for (index, block) in response.content.iter().enumerate() {
        let (header, delta) = match block {
            ResponseBlock::Text { text } => (
                BlockHeader::Text {
                    text: String::new(),
                },
                BlockDelta::TextDelta { text: text.clone() },
            ),
            ResponseBlock::ToolUse { id, name, input } => (
                BlockHeader::ToolUse {
                    id: id.clone(),
                    name: name.clone(),
                    input: serde_json::json!({}),
                },
                BlockDelta::InputJsonDelta {
                    partial_json: input.to_string(),
                },
            ),
        };

        events.push(event(
            "content_block_start",
            &ContentBlockStartEvent {
                event_type: "content_block_start",
                index,
                content_block: header,
            },
        ));
        events.push(event(
            "content_block_delta",
            &ContentBlockDeltaEvent {
                event_type: "content_block_delta",
                index,
                delta,
            },
        ));
        events.push(event(
            "content_block_stop",
            &ContentBlockStopEvent {
                event_type: "content_block_stop",
                index,
            },
        ));
    }

    events.push(event(
        "message_delta",
        &MessageDeltaEvent {
            event_type: "message_delta",
            delta: MessageDelta {
                stop_reason: response.stop_reason,
                stop_sequence: None,
            },
            usage: DeltaUsage {
                input_tokens: response.usage.input_tokens,
                output_tokens: response.usage.output_tokens,
            },
        },
    ));
    events.push(event(
        "message_stop",
        &MessageStopEvent {
            event_type: "message_stop",
        },
    ));

    events
}

fn event<T: Serialize>(name: &'static str, payload: &T) -> ReplayEvent {
    ReplayEvent {
        name,
        // Payloads are plain Serialize structs; serialization cannot fail
        payload: serde_json::to_value(payload).unwrap_or(serde_json::Value::Null),
    }
}

/// Frame one event for the wire.
pub fn format_sse_event(event: &ReplayEvent) -> String {
    format!("event: {}\ndata: {}\n\n", event.name, event.payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::anthropic::{StopReason, Usage};

    fn text_response() -> MessagesResponse {
        MessagesResponse {
            id: "resp_1".to_string(),
            response_type: "message",
            role: "assistant",
            model: "claude-sonnet-4-20250514".to_string(),
            content: vec![ResponseBlock::Text {
                text: "Hello!".to_string(),
            }],
            stop_reason: StopReason::EndTurn,
            stop_sequence: None,
            usage: Usage {
                input_tokens: 10,
                output_tokens: 4,
            },
        }
    }

    #[test]
    fn test_event_order_for_single_text_block() {
        let names: Vec<&str> = replay(&text_response()).iter().map(|e| e.name).collect();
        assert_eq!(
            names,
            vec![
                "message_start",
                "content_block_start",
                "content_block_delta",
                "content_block_stop",
                "message_delta",
                "message_stop",
            ]
        );
    }

    #[test]
    fn test_message_start_shell_is_empty() {
        let events = replay(&text_response());
        let message = &events[0].payload["message"];

        assert_eq!(message["id"], "resp_1");
        assert_eq!(message["model"], "claude-sonnet-4-20250514");
        assert_eq!(message["content"], serde_json::json!([]));
        assert_eq!(message["stop_reason"], serde_json::Value::Null);
        assert_eq!(message["usage"]["input_tokens"], 0);
        assert_eq!(message["usage"]["output_tokens"], 0);
    }

    #[test]
    fn test_full_text_arrives_as_one_delta() {
        let events = replay(&text_response());

        assert_eq!(events[1].payload["content_block"]["text"], "");
        assert_eq!(events[2].payload["delta"]["type"], "text_delta");
        assert_eq!(events[2].payload["delta"]["text"], "Hello!");
    }

    #[test]
    fn test_final_stop_reason_and_usage_in_message_delta() {
        let events = replay(&text_response());
        let delta = &events[4];

        assert_eq!(delta.payload["delta"]["stop_reason"], "end_turn");
        assert_eq!(delta.payload["usage"]["input_tokens"], 10);
        assert_eq!(delta.payload["usage"]["output_tokens"], 4);
    }

    #[test]
    fn test_tool_use_block_replays_input_as_json_delta() {
        let mut response = text_response();
        response.content.push(ResponseBlock::ToolUse {
            id: "call_1".to_string(),
            name: "get_weather".to_string(),
            input: serde_json::json!({"city": "London"}),
        });
        response.stop_reason = StopReason::ToolUse;

        let events = replay(&response);

        // Second block sits at index 1
        let start = &events[4];
        assert_eq!(start.name, "content_block_start");
        assert_eq!(start.payload["index"], 1);
        assert_eq!(start.payload["content_block"]["type"], "tool_use");
        assert_eq!(start.payload["content_block"]["id"], "call_1");
        assert_eq!(start.payload["content_block"]["input"], serde_json::json!({}));

        let delta = &events[5];
        assert_eq!(delta.payload["delta"]["type"], "input_json_delta");
        assert_eq!(
            delta.payload["delta"]["partial_json"],
            "{\"city\":\"London\"}"
        );

        assert_eq!(events[7].payload["delta"]["stop_reason"], "tool_use");
    }

    #[test]
    fn test_sse_framing() {
        let framed = format_sse_event(&ReplayEvent {
            name: "message_stop",
            payload: serde_json::json!({"type": "message_stop"}),
        });
        assert_eq!(framed, "event: message_stop\ndata: {\"type\":\"message_stop\"}\n\n");
    }
}
