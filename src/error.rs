//! Backend error taxonomy and the public error envelope
//!
//! Every failure that escapes the engine is one of these variants, and
//! each renders as the Anthropic-style envelope the client expects:
//! `{"type": "error", "error": {"type": ..., "message": ...}}`.
//!
//! Translation-layer defects never surface here - malformed optional
//! fields are repaired in place by the translators. This taxonomy covers
//! preconditions (credentials), backend rejections, and wire-protocol
//! breakage only.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

#[derive(Debug)]
pub enum BackendError {
    /// Missing or expired credential, or no account id (401)
    Auth(String),
    /// Backend signalled throttling (429)
    RateLimit(String),
    /// Backend rejected the translated request shape (400)
    Request(String),
    /// Backend reply had no discoverable terminal event or no body (502)
    Protocol(String),
    /// Any other non-success backend status (502)
    Upstream { status: u16, message: String },
}

impl BackendError {
    pub fn status(&self) -> StatusCode {
        match self {
            BackendError::Auth(_) => StatusCode::UNAUTHORIZED,
            BackendError::RateLimit(_) => StatusCode::TOO_MANY_REQUESTS,
            BackendError::Request(_) => StatusCode::BAD_REQUEST,
            BackendError::Protocol(_) | BackendError::Upstream { .. } => StatusCode::BAD_GATEWAY,
        }
    }

    /// Error type tag in the public protocol's vocabulary
    pub fn error_type(&self) -> &'static str {
        match self {
            BackendError::Auth(_) => "authentication_error",
            BackendError::RateLimit(_) => "rate_limit_error",
            BackendError::Request(_) => "invalid_request_error",
            BackendError::Protocol(_) | BackendError::Upstream { .. } => "api_error",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            BackendError::Auth(m)
            | BackendError::RateLimit(m)
            | BackendError::Request(m)
            | BackendError::Protocol(m)
            | BackendError::Upstream { message: m, .. } => m,
        }
    }
}

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendError::Upstream { status, message } => {
                write!(f, "backend returned {}: {}", status, message)
            }
            other => write!(f, "{}", other.message()),
        }
    }
}

impl std::error::Error for BackendError {}

/// Render a 400 invalid_request_error envelope for pre-translation
/// validation failures (missing model/messages, unparseable body).
pub fn invalid_request(message: impl Into<String>) -> Response {
    error_response(StatusCode::BAD_REQUEST, "invalid_request_error", &message.into())
}

impl IntoResponse for BackendError {
    fn into_response(self) -> Response {
        let status = self.status();
        tracing::error!("Backend error: {} - {}", status, self);
        error_response(status, self.error_type(), self.message())
    }
}

fn error_response(status: StatusCode, error_type: &str, message: &str) -> Response {
    let body = serde_json::json!({
        "type": "error",
        "error": {
            "type": error_type,
            "message": message,
        }
    });
    (status, Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            BackendError::Auth("no token".into()).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            BackendError::RateLimit("slow down".into()).status(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            BackendError::Request("bad shape".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            BackendError::Protocol("no terminal event".into()).status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            BackendError::Upstream {
                status: 503,
                message: "unavailable".into()
            }
            .status(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_error_type_vocabulary() {
        assert_eq!(
            BackendError::Auth(String::new()).error_type(),
            "authentication_error"
        );
        assert_eq!(
            BackendError::RateLimit(String::new()).error_type(),
            "rate_limit_error"
        );
        assert_eq!(
            BackendError::Request(String::new()).error_type(),
            "invalid_request_error"
        );
        assert_eq!(
            BackendError::Protocol(String::new()).error_type(),
            "api_error"
        );
    }
}
