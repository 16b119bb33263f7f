//! File-backed credential store
//!
//! Credentials are written by an external login flow into
//! `~/.codex-bridge/tokens.json` and only read here. This module never
//! refreshes a token: an expired or missing credential is reported as an
//! authentication failure and the user re-runs their login tooling.

use serde::Deserialize;
use std::path::PathBuf;

use crate::error::BackendError;

/// Treat tokens expiring within this window as already expired
const EXPIRY_SKEW_MS: i64 = 5 * 60 * 1000;

/// On-disk token file shape. Unknown fields are ignored so other tools
/// can share the file.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenData {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Expiry as Unix epoch milliseconds
    #[serde(default)]
    pub expires_at: Option<i64>,
    #[serde(default)]
    pub account_id: Option<String>,
}

impl TokenData {
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires_at) => expires_at - EXPIRY_SKEW_MS <= chrono::Utc::now().timestamp_millis(),
            None => false,
        }
    }
}

/// What the backend client needs per request
#[derive(Debug, Clone)]
pub struct Credentials {
    pub access_token: String,
    pub account_id: String,
}

/// Token file path: ~/.codex-bridge/tokens.json
pub fn tokens_path() -> Option<PathBuf> {
    dirs::home_dir().map(|p| p.join(".codex-bridge").join("tokens.json"))
}

/// Load the token file if present. Unreadable or unparseable files are
/// treated as absent (with a warning), not as fatal.
pub fn load_tokens() -> Option<TokenData> {
    let path = tokens_path()?;
    let contents = std::fs::read_to_string(&path).ok()?;

    match serde_json::from_str(&contents) {
        Ok(tokens) => Some(tokens),
        Err(e) => {
            tracing::warn!("Failed to parse {}: {}", path.display(), e);
            None
        }
    }
}

/// Resolve usable credentials or explain why there are none.
pub fn credentials() -> Result<Credentials, BackendError> {
    let tokens = load_tokens().ok_or_else(|| {
        BackendError::Auth(
            "No credentials found. Run your ChatGPT login tooling to create ~/.codex-bridge/tokens.json".to_string(),
        )
    })?;

    if tokens.is_expired() {
        return Err(BackendError::Auth(
            "Access token is expired. Re-run your ChatGPT login tooling".to_string(),
        ));
    }

    let account_id = tokens.account_id.filter(|id| !id.is_empty()).ok_or_else(|| {
        BackendError::Auth("Token file has no account_id".to_string())
    })?;

    Ok(Credentials {
        access_token: tokens.access_token,
        account_id,
    })
}

/// Human-readable credential state for `auth status`.
pub fn status_line() -> String {
    match load_tokens() {
        None => "not logged in (no token file)".to_string(),
        Some(tokens) => {
            let account = tokens.account_id.as_deref().unwrap_or("<no account id>");
            if tokens.is_expired() {
                format!("expired (account {})", account)
            } else {
                match tokens.expires_at {
                    Some(millis) => {
                        let when = chrono::DateTime::<chrono::Utc>::from_timestamp_millis(millis)
                            .map(|t| t.to_rfc3339())
                            .unwrap_or_else(|| millis.to_string());
                        format!("valid until {} (account {})", when, account)
                    }
                    None => format!("valid, no recorded expiry (account {})", account),
                }
            }
        }
    }
}
