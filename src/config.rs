// Configuration for the bridge server
//
// Configuration is loaded in order of precedence:
// 1. Environment variables (highest priority)
// 2. Config file (~/.config/codex-bridge/config.toml)
// 3. Built-in defaults (lowest priority)

use serde::Deserialize;
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::backend::DEFAULT_BASE_URL;
use crate::models::ModelOverrides;

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Address to bind the server to
    pub bind_addr: SocketAddr,

    /// Backend base URL
    pub base_url: String,

    /// Per-family backend model overrides
    pub overrides: ModelOverrides,

    /// Logging settings
    pub logging: LoggingConfig,
}

/// File config structure (all fields optional)
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    bind_addr: Option<String>,
    base_url: Option<String>,
    /// Optional [models] section
    models: Option<FileModels>,
    /// Optional [logging] section
    logging: Option<FileLogging>,
}

#[derive(Debug, Default, Deserialize)]
struct FileModels {
    haiku: Option<String>,
    sonnet: Option<String>,
    opus: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct FileLogging {
    level: Option<String>,
}

impl Config {
    /// Get the config file path: ~/.config/codex-bridge/config.toml
    /// Uses Unix-style ~/.config on all platforms for consistency
    pub fn config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|p| p.join(".config").join("codex-bridge").join("config.toml"))
    }

    /// Create config template if it doesn't exist
    /// Called during startup to help users discover configuration options
    pub fn ensure_config_exists() {
        let Some(path) = Self::config_path() else {
            return;
        };

        // Don't overwrite existing config
        if path.exists() {
            return;
        }

        // Create parent directory
        if let Some(parent) = path.parent() {
            if std::fs::create_dir_all(parent).is_err() {
                return; // Silently fail - config is optional
            }
        }

        let template = r#"# codex-bridge configuration
# Uncomment and modify options as needed

# Server bind address (default: 127.0.0.1:8084)
# bind_addr = "127.0.0.1:8084"

# Backend base URL (default: https://chatgpt.com/backend-api)
# base_url = "https://chatgpt.com/backend-api"

# Per-family backend model overrides
# Values must name a supported backend model or they are ignored
# [models]
# haiku = "gpt-5.3-codex-spark"
# sonnet = "gpt-5.2-codex"
# opus = "gpt-5.3-codex-xhigh"

# Logging configuration
# [logging]
# level = "info"  # trace, debug, info, warn, error (RUST_LOG env var overrides this)
"#;

        // Write template (ignore errors - config is optional)
        let _ = std::fs::write(&path, template);
    }

    /// Load file config if it exists
    fn load_file_config() -> FileConfig {
        let Some(path) = Self::config_path() else {
            return FileConfig::default();
        };

        match std::fs::read_to_string(&path) {
            Ok(contents) => toml::from_str(&contents).unwrap_or_else(|e| {
                eprintln!("Warning: Failed to parse {}: {}", path.display(), e);
                FileConfig::default()
            }),
            Err(_) => FileConfig::default(), // File doesn't exist, use defaults
        }
    }

    /// Serialize config to TOML string (single source of truth for format)
    pub fn to_toml(&self) -> String {
        format!(
            r#"# codex-bridge configuration

# Server bind address
bind_addr = "{bind}"

# Backend base URL
base_url = "{base}"

# Per-family backend model overrides
[models]
haiku = "{haiku}"
sonnet = "{sonnet}"
opus = "{opus}"

# Logging configuration (RUST_LOG env var overrides)
[logging]
level = "{log_level}"
"#,
            bind = self.bind_addr,
            base = self.base_url,
            haiku = self.overrides.haiku.as_deref().unwrap_or(""),
            sonnet = self.overrides.sonnet.as_deref().unwrap_or(""),
            opus = self.overrides.opus.as_deref().unwrap_or(""),
            log_level = self.logging.level,
        )
    }

    /// Load configuration: env vars > file > defaults
    pub fn from_env() -> Self {
        let file = Self::load_file_config();

        // Bind address: env > file > default
        let bind_addr = std::env::var("CODEX_BRIDGE_BIND")
            .ok()
            .or(file.bind_addr)
            .unwrap_or_else(|| "127.0.0.1:8084".to_string())
            .parse()
            .expect("Invalid bind address");

        // Backend base URL: env > file > default
        let base_url = std::env::var("CODEX_BASE_URL")
            .ok()
            .or(file.base_url)
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        // Model overrides: env > file, no defaults
        let file_models = file.models.unwrap_or_default();
        let overrides = ModelOverrides {
            haiku: std::env::var("ANTHROPIC_DEFAULT_HAIKU_MODEL")
                .ok()
                .or(file_models.haiku),
            sonnet: std::env::var("ANTHROPIC_DEFAULT_SONNET_MODEL")
                .ok()
                .or(file_models.sonnet),
            opus: std::env::var("ANTHROPIC_DEFAULT_OPUS_MODEL")
                .ok()
                .or(file_models.opus),
        };

        // Logging settings: file config only (RUST_LOG env var handled in main.rs)
        let file_logging = file.logging.unwrap_or_default();
        let logging = LoggingConfig {
            level: file_logging.level.unwrap_or_else(|| "info".to_string()),
        };

        Self {
            bind_addr,
            base_url,
            overrides,
            logging,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8084".parse().unwrap(),
            base_url: DEFAULT_BASE_URL.to_string(),
            overrides: ModelOverrides::default(),
            logging: LoggingConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_config_parses_partial_toml() {
        let parsed: FileConfig = toml::from_str(
            r#"
            bind_addr = "0.0.0.0:9000"

            [models]
            sonnet = "gpt-5.2-codex-low"
            "#,
        )
        .unwrap();

        assert_eq!(parsed.bind_addr.as_deref(), Some("0.0.0.0:9000"));
        assert!(parsed.base_url.is_none());
        let models = parsed.models.unwrap();
        assert_eq!(models.sonnet.as_deref(), Some("gpt-5.2-codex-low"));
        assert!(models.haiku.is_none());
    }

    #[test]
    fn test_to_toml_round_trips_through_file_config() {
        let config = Config {
            bind_addr: "127.0.0.1:9999".parse().unwrap(),
            base_url: "https://example.test/api".to_string(),
            overrides: ModelOverrides {
                opus: Some("gpt-5.3-codex-xhigh".to_string()),
                ..Default::default()
            },
            logging: LoggingConfig {
                level: "debug".to_string(),
            },
        };

        let parsed: FileConfig = toml::from_str(&config.to_toml()).unwrap();
        assert_eq!(parsed.bind_addr.as_deref(), Some("127.0.0.1:9999"));
        assert_eq!(parsed.base_url.as_deref(), Some("https://example.test/api"));
        assert_eq!(
            parsed.models.unwrap().opus.as_deref(),
            Some("gpt-5.3-codex-xhigh")
        );
        assert_eq!(parsed.logging.unwrap().level.as_deref(), Some("debug"));
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.bind_addr.port(), 8084);
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.logging.level, "info");
    }
}
