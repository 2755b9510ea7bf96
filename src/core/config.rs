//! Configuration management for the dev tools server.
//!
//! This module provides a centralized configuration structure that can be
//! populated from environment variables or defaults.

use super::transport::HttpConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure for the dev tools server.
///
/// This struct contains all configurable aspects of the server, organized
/// by domain for clarity and maintainability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server identification and metadata.
    pub server: ServerConfig,

    /// Tool discovery configuration.
    pub tools: ToolsConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,

    /// HTTP transport configuration.
    pub http: HttpConfig,

    /// Upstream conversation service used by proxy tools.
    pub upstream: UpstreamConfig,
}

/// Server identification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The name of the server as reported to clients.
    pub name: String,

    /// The version of the server.
    pub version: String,
}

/// Where tool packages and their front-end assets live.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Root directory scanned for tool packages.
    pub tools_dir: PathBuf,

    /// Static asset root. Tool assets live under `<static_dir>/tools/<tool-id>/`.
    pub static_dir: PathBuf,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "trace").
    pub level: String,
}

/// Upstream service reached by the proxy tools.
#[derive(Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Base URL, without trailing slash.
    pub base_url: String,

    /// Static bearer token sent by tools that authenticate.
    pub token: String,

    /// Request timeout for authenticated calls, in seconds.
    pub timeout_secs: u64,
}

/// Token shipped in the defaults. Upstream calls made with it will be refused.
pub const PLACEHOLDER_TOKEN: &str = "CHANGE_ME_ADMIN_TOKEN";

impl UpstreamConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// True until a real token is configured.
    pub fn has_placeholder_token(&self) -> bool {
        self.token == PLACEHOLDER_TOKEN
    }
}

/// Custom Debug implementation to redact secrets from logs.
impl std::fmt::Debug for UpstreamConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpstreamConfig")
            .field("base_url", &self.base_url)
            .field("token", &"[REDACTED]")
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            tools_dir: PathBuf::from("tools"),
            static_dir: PathBuf::from("frontend/static"),
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8443".to_string(),
            token: PLACEHOLDER_TOKEN.to_string(),
            timeout_secs: 45,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                name: "devtools-server".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            tools: ToolsConfig::default(),
            logging: LoggingConfig {
                level: "info".to_string(),
            },
            http: HttpConfig::default(),
            upstream: UpstreamConfig::default(),
        }
    }
}

impl Config {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables.
    ///
    /// Environment variables are expected to be prefixed with `DEVTOOLS_`.
    /// For example: `DEVTOOLS_PORT`, `DEVTOOLS_LOG_LEVEL`.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let mut config = Self::default();

        if let Ok(name) = std::env::var("DEVTOOLS_SERVER_NAME") {
            config.server.name = name;
        }

        if let Ok(level) = std::env::var("DEVTOOLS_LOG_LEVEL") {
            config.logging.level = level;
        }

        config.http = HttpConfig::from_env();

        if let Ok(dir) = std::env::var("DEVTOOLS_TOOLS_DIR") {
            config.tools.tools_dir = PathBuf::from(dir);
        }

        if let Ok(dir) = std::env::var("DEVTOOLS_STATIC_DIR") {
            config.tools.static_dir = PathBuf::from(dir);
        }

        if let Ok(url) = std::env::var("DEVTOOLS_UPSTREAM_URL") {
            config.upstream.base_url = url.trim_end_matches('/').to_string();
        }

        if let Ok(token) = std::env::var("DEVTOOLS_UPSTREAM_TOKEN") {
            config.upstream.token = token;
        }

        if let Some(secs) = std::env::var("DEVTOOLS_UPSTREAM_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            config.upstream.timeout_secs = secs;
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Mutex to ensure env var tests run serially
    static ENV_TEST_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_upstream_from_env() {
        let _lock = ENV_TEST_LOCK.lock().unwrap();
        unsafe {
            std::env::set_var("DEVTOOLS_UPSTREAM_URL", "http://upstream.local:9000/");
            std::env::set_var("DEVTOOLS_UPSTREAM_TIMEOUT_SECS", "7");
        }
        let config = Config::from_env();
        assert_eq!(config.upstream.base_url, "http://upstream.local:9000");
        assert_eq!(config.upstream.timeout(), Duration::from_secs(7));
        unsafe {
            std::env::remove_var("DEVTOOLS_UPSTREAM_URL");
            std::env::remove_var("DEVTOOLS_UPSTREAM_TIMEOUT_SECS");
        }
    }

    #[test]
    fn test_tools_dirs_from_env() {
        let _lock = ENV_TEST_LOCK.lock().unwrap();
        unsafe {
            std::env::set_var("DEVTOOLS_TOOLS_DIR", "/srv/tools");
        }
        let config = Config::from_env();
        assert_eq!(config.tools.tools_dir, PathBuf::from("/srv/tools"));
        assert_eq!(config.tools.static_dir, PathBuf::from("frontend/static"));
        unsafe {
            std::env::remove_var("DEVTOOLS_TOOLS_DIR");
        }
    }

    #[test]
    fn test_placeholder_token_detection() {
        let _lock = ENV_TEST_LOCK.lock().unwrap();
        assert!(UpstreamConfig::default().has_placeholder_token());

        unsafe {
            std::env::set_var("DEVTOOLS_UPSTREAM_TOKEN", "real-token");
        }
        let config = Config::from_env();
        assert!(!config.upstream.has_placeholder_token());
        unsafe {
            std::env::remove_var("DEVTOOLS_UPSTREAM_TOKEN");
        }
    }

    #[test]
    fn test_token_redacted_in_debug() {
        let upstream = UpstreamConfig {
            token: "super_secret_token".to_string(),
            ..Default::default()
        };
        let debug_str = format!("{:?}", upstream);
        assert!(debug_str.contains("REDACTED"));
        assert!(!debug_str.contains("super_secret_token"));
    }

    #[test]
    fn test_config_defaults() {
        let config = Config::default();
        assert_eq!(config.http.port, 5000);
        assert_eq!(config.upstream.timeout_secs, 45);
        assert_eq!(config.tools.tools_dir, PathBuf::from("tools"));
    }
}
