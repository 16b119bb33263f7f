//! HTTP server setup and the gateway endpoints
//!
//! Two routes: `GET /health` for liveness and `POST /v1/messages`, the
//! Anthropic-shaped endpoint. A messages call runs the full pipeline:
//! validate → translate request → backend call (fully buffered assembly)
//! → translate response → plain JSON or synthetic SSE replay.

use std::convert::Infallible;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    body::Body,
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use bytes::Bytes;
use tokio::net::TcpListener;

use crate::auth;
use crate::backend::BackendClient;
use crate::config::{Config, VERSION};
use crate::error::invalid_request;
use crate::models::ModelResolver;
use crate::protocol::anthropic::{MessagesRequest, MessagesResponse};
use crate::stream;
use crate::translate;

#[derive(Clone)]
pub struct AppState {
    client: Arc<BackendClient>,
    resolver: Arc<ModelResolver>,
}

/// Start the gateway server
pub async fn start_server(
    config: Config,
    shutdown_rx: tokio::sync::oneshot::Receiver<()>,
) -> Result<()> {
    let bind_addr = config.bind_addr;

    let state = AppState {
        client: Arc::new(BackendClient::new(config.base_url.clone())?),
        resolver: Arc::new(ModelResolver::new(config.overrides.clone())),
    };

    let app = Router::new()
        .route("/health", get(health))
        .route("/v1/messages", post(messages))
        .with_state(state);

    tracing::info!("Starting server on {}", bind_addr);

    let listener = TcpListener::bind(bind_addr)
        .await
        .context("Failed to bind to address")?;

    tracing::info!("Listening on {}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_rx.await.ok();
        })
        .await
        .context("Server error")?;

    tracing::info!("Server shut down gracefully");
    Ok(())
}

/// GET /health - liveness probe
async fn health() -> Response {
    Json(serde_json::json!({
        "status": "ok",
        "service": "codex-bridge",
        "version": VERSION,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
    .into_response()
}

/// POST /v1/messages - the Anthropic-shaped gateway endpoint
async fn messages(State(state): State<AppState>, body: Bytes) -> Response {
    // Parse by hand so every rejection wears the public error envelope
    let body: serde_json::Value = match serde_json::from_slice(&body) {
        Ok(body) => body,
        Err(e) => return invalid_request(format!("Request body is not valid JSON: {}", e)),
    };

    // Shape-check before the typed parse so the caller gets a pointed
    // message instead of a serde path
    if let Some(problem) = validation_error(&body) {
        return invalid_request(problem);
    }

    let request: MessagesRequest = match serde_json::from_value(body) {
        Ok(request) => request,
        Err(e) => return invalid_request(format!("Malformed request: {}", e)),
    };

    let credentials = match auth::credentials() {
        Ok(credentials) => credentials,
        Err(e) => return e.into_response(),
    };

    let backend_request = translate::translate_request(&request, &state.resolver);

    let backend_response = match state.client.execute(&backend_request, &credentials).await {
        Ok(response) => response,
        Err(e) => return e.into_response(),
    };

    let response = translate::translate_response(&backend_response, &request.model);

    if request.stream.unwrap_or(false) {
        replay_response(&response)
    } else {
        Json(response).into_response()
    }
}

/// Pre-parse validation: model and messages must be present and shaped.
fn validation_error(body: &serde_json::Value) -> Option<&'static str> {
    match body.get("model").and_then(|m| m.as_str()) {
        Some(model) if !model.is_empty() => {}
        _ => return Some("model is required and must be a non-empty string"),
    }

    match body.get("messages") {
        Some(serde_json::Value::Array(_)) => None,
        _ => Some("messages is required and must be an array"),
    }
}

/// Stream the synthetic event replay. Writing through a body stream means
/// a disconnected client stops the replay instead of buffering it.
fn replay_response(response: &MessagesResponse) -> Response {
    let frames: Vec<Result<Bytes, Infallible>> = stream::replay(response)
        .iter()
        .map(|event| Ok(Bytes::from(stream::format_sse_event(event))))
        .collect();

    (
        [
            (header::CONTENT_TYPE, "text/event-stream"),
            (header::CACHE_CONTROL, "no-cache"),
            (header::CONNECTION, "keep-alive"),
        ],
        Body::from_stream(futures::stream::iter(frames)),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_requires_model() {
        let body = serde_json::json!({"messages": []});
        assert!(validation_error(&body).unwrap().contains("model"));

        let body = serde_json::json!({"model": "", "messages": []});
        assert!(validation_error(&body).unwrap().contains("model"));
    }

    #[test]
    fn test_validation_requires_messages_array() {
        let body = serde_json::json!({"model": "m"});
        assert!(validation_error(&body).unwrap().contains("messages"));

        let body = serde_json::json!({"model": "m", "messages": "hi"});
        assert!(validation_error(&body).unwrap().contains("messages"));
    }

    #[test]
    fn test_validation_accepts_minimal_request() {
        let body = serde_json::json!({
            "model": "claude-sonnet-4-20250514",
            "messages": [{"role": "user", "content": "Hello"}]
        });
        assert!(validation_error(&body).is_none());
    }
}
