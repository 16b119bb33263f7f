//! Backend response assembly
//!
//! The backend is consumed fully buffered: the SSE stream is drained into
//! a single [`BackendResponse`] before anything flows back to the client.
//!
//! Streaming mode accumulates `response.output_text.delta` payloads and
//! watches for a terminal `response.done` / `response.completed` event
//! (last one wins). If the stream ends without a terminal event, a
//! response is synthesized from the accumulated deltas - streaming
//! assembly always succeeds. Buffered mode only searches `data: ` lines
//! for the terminal event and fails hard without one.

use bytes::Bytes;
use futures::{Stream, StreamExt};

use super::sse::{SseDecoder, SseFrame};
use crate::error::BackendError;
use crate::protocol::backend::{BackendResponse, OutputItem, OutputPart};

/// Stream-end sentinel some backends emit before closing
const DONE_SENTINEL: &str = "[DONE]";

#[derive(Default)]
struct Assembly {
    text: String,
    terminal: Option<BackendResponse>,
}

impl Assembly {
    /// Apply one frame. Returns false when consumption should stop.
    fn apply(&mut self, frame: &SseFrame) -> bool {
        if frame.data == DONE_SENTINEL {
            return false;
        }

        // Malformed payloads are skipped, never fatal
        let Ok(payload) = serde_json::from_str::<serde_json::Value>(&frame.data) else {
            return true;
        };

        match payload.get("type").and_then(|t| t.as_str()) {
            Some("response.output_text.delta") => {
                if let Some(delta) = payload.get("delta").and_then(|d| d.as_str()) {
                    self.text.push_str(delta);
                }
            }
            Some("response.done") | Some("response.completed") => {
                if let Some(response) = payload.get("response") {
                    if let Ok(parsed) =
                        serde_json::from_value::<BackendResponse>(response.clone())
                    {
                        // Last terminal event wins
                        self.terminal = Some(parsed);
                    }
                }
            }
            _ => {}
        }

        true
    }

    fn into_response(self) -> BackendResponse {
        if let Some(terminal) = self.terminal {
            return terminal;
        }

        tracing::debug!(
            "No terminal event in stream; synthesizing response from {} delta bytes",
            self.text.len()
        );

        BackendResponse {
            id: Some(generate_response_id()),
            model: Some("codex".to_string()),
            output: vec![OutputItem {
                item_type: Some("message".to_string()),
                role: Some("assistant".to_string()),
                content: vec![OutputPart {
                    part_type: Some("output_text".to_string()),
                    text: Some(self.text),
                    ..Default::default()
                }],
                ..Default::default()
            }],
            usage: None,
            stop_reason: Some("end_turn".to_string()),
        }
    }
}

/// Drain a backend SSE byte stream into one response. Never fails on
/// missing terminal events; a broken transport is still an error.
pub async fn assemble_stream<S, E>(mut stream: S) -> Result<BackendResponse, BackendError>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
    E: std::fmt::Display,
{
    let mut decoder = SseDecoder::new();
    let mut assembly = Assembly::default();
    let mut done = false;

    while let Some(chunk) = stream.next().await {
        let chunk =
            chunk.map_err(|e| BackendError::Protocol(format!("backend stream failed: {}", e)))?;

        for frame in decoder.feed(&chunk) {
            if !assembly.apply(&frame) {
                done = true;
                break;
            }
        }
        if done {
            break;
        }
    }

    if !done {
        if let Some(frame) = decoder.finish() {
            assembly.apply(&frame);
        }
    }

    Ok(assembly.into_response())
}

/// Find the terminal event in a buffered (non-streaming) backend body.
///
/// No delta accumulation here: a body without a terminal `data: ` line is
/// a protocol error, unlike the streaming fallback.
pub fn parse_buffered(body: &str) -> Result<BackendResponse, BackendError> {
    for line in body.lines() {
        let Some(data) = line.strip_prefix("data: ") else {
            continue;
        };
        let Ok(payload) = serde_json::from_str::<serde_json::Value>(data) else {
            continue;
        };

        if matches!(
            payload.get("type").and_then(|t| t.as_str()),
            Some("response.done") | Some("response.completed")
        ) {
            if let Some(response) = payload.get("response") {
                if let Ok(parsed) = serde_json::from_value::<BackendResponse>(response.clone()) {
                    return Ok(parsed);
                }
            }
        }
    }

    Err(BackendError::Protocol(
        "no terminal event in backend response".to_string(),
    ))
}

/// Dependency-free response id: timestamp plus four random hex chars.
fn generate_response_id() -> String {
    use std::collections::hash_map::RandomState;
    use std::hash::{BuildHasher, Hasher};

    let timestamp = chrono::Utc::now().format("%Y%m%d-%H%M%S");
    let random = RandomState::new().build_hasher().finish();

    format!("resp_{}-{:04x}", timestamp, random & 0xFFFF)
}
