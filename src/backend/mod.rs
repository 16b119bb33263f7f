//! ChatGPT Codex backend client
//!
//! Sends translated requests to the Codex responses endpoint and hands the
//! body to the assembler. The response is always assembled fully before
//! returning, whether or not the caller asked for streaming.

pub mod assemble;
pub mod sse;

use anyhow::{Context, Result};

use crate::auth::Credentials;
use crate::error::BackendError;
use crate::protocol::backend::{BackendRequest, BackendResponse};

pub const DEFAULT_BASE_URL: &str = "https://chatgpt.com/backend-api";

pub struct BackendClient {
    client: reqwest::Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(base_url: String) -> Result<Self> {
        // No engine-side timeout: upstream generation can legitimately run
        // for minutes, and the client controls its own deadline.
        let client = reqwest::Client::builder()
            .pool_max_idle_per_host(10)
            .http1_only()
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Execute one translated request and assemble the full backend
    /// response from its SSE body.
    pub async fn execute(
        &self,
        request: &BackendRequest,
        credentials: &Credentials,
    ) -> Result<BackendResponse, BackendError> {
        let url = format!("{}/codex/responses", self.base_url);

        tracing::debug!("POST {} (model {}, stream {})", url, request.model, request.stream);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&credentials.access_token)
            .header("chatgpt-account-id", &credentials.account_id)
            .header("OpenAI-Beta", "responses=experimental")
            .header("originator", "codex_cli_rs")
            .header("accept", "text/event-stream")
            .json(request)
            .send()
            .await
            .map_err(|e| BackendError::Protocol(format!("backend request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_failure(status.as_u16(), &body));
        }

        if request.stream {
            assemble::assemble_stream(response.bytes_stream()).await
        } else {
            let body = response
                .text()
                .await
                .map_err(|e| BackendError::Protocol(format!("failed to read backend body: {}", e)))?;
            assemble::parse_buffered(&body)
        }
    }
}

/// Map a non-success backend status to the error taxonomy, pulling a
/// message out of the body when one is discoverable.
fn classify_failure(status: u16, body: &str) -> BackendError {
    let message = extract_message(body);

    match status {
        401 | 403 => BackendError::Auth(
            message.unwrap_or_else(|| "Backend rejected the credentials".to_string()),
        ),
        429 => BackendError::RateLimit(
            message.unwrap_or_else(|| "Backend rate limit exceeded".to_string()),
        ),
        400 => {
            // Keep the raw body when nothing structured is present: the
            // backend's 400s describe which translated field it disliked.
            BackendError::Request(message.unwrap_or_else(|| body.to_string()))
        }
        _ => BackendError::Upstream {
            status,
            message: message.unwrap_or_else(|| format!("backend returned status {}", status)),
        },
    }
}

/// Best-effort message extraction: `error.message`, then top-level
/// `message`, else nothing.
fn extract_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;

    value
        .pointer("/error/message")
        .or_else(|| value.get("message"))
        .and_then(|m| m.as_str())
        .map(|m| m.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_classification() {
        assert!(matches!(
            classify_failure(401, "{}"),
            BackendError::Auth(_)
        ));
        assert!(matches!(
            classify_failure(403, "{}"),
            BackendError::Auth(_)
        ));
        assert!(matches!(
            classify_failure(429, "{}"),
            BackendError::RateLimit(_)
        ));
        assert!(matches!(
            classify_failure(400, "bad field"),
            BackendError::Request(_)
        ));
        assert!(matches!(
            classify_failure(503, ""),
            BackendError::Upstream { status: 503, .. }
        ));
    }

    #[test]
    fn test_message_extraction() {
        assert_eq!(
            extract_message(r#"{"error": {"message": "nested"}}"#).as_deref(),
            Some("nested")
        );
        assert_eq!(
            extract_message(r#"{"message": "flat"}"#).as_deref(),
            Some("flat")
        );
        assert_eq!(extract_message("not json"), None);
    }

    #[test]
    fn test_raw_body_kept_for_unstructured_400() {
        let err = classify_failure(400, "parallel_tool_calls is not allowed");
        assert_eq!(err.message(), "parallel_tool_calls is not allowed");
    }
}
