/// Configuration for the Tradeflow editor and its reference backend
///
/// Handles server binding, the workflow database and how the editor reaches the
/// workflow service.

use serde::{Deserialize, Serialize};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Client-side gateway configuration
    pub gateway: GatewayConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server bind address (e.g., "0.0.0.0")
    pub host: String,
    /// Server port number
    pub port: u16,
}

/// Workflow database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite connection url, e.g. "sqlite://data/tradeflow.db" or "sqlite::memory:"
    pub url: String,
}

/// How the editor reaches the workflow service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Service root, without the `/api/workflows` suffix
    pub base_url: String,
    /// Session token from the external auth store, sent as a bearer token
    #[serde(default, skip_serializing)]
    pub bearer_token: Option<String>,
    /// Per-request timeout
    pub timeout_secs: u64,
}

impl Default for Config {
    /// Default configuration with ENV_VAR support for container deployment
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: std::env::var("TRADEFLOW_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: std::env::var("TRADEFLOW_PORT")
                    .unwrap_or_else(|_| "3004".to_string())
                    .parse()
                    .unwrap_or(3004),
            },
            database: DatabaseConfig {
                url: std::env::var("TRADEFLOW_DATABASE_URL")
                    .unwrap_or_else(|_| "sqlite://data/tradeflow.db".to_string()),
            },
            gateway: GatewayConfig::default(),
        }
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: std::env::var("TRADEFLOW_API_URL")
                .unwrap_or_else(|_| "http://127.0.0.1:3004".to_string()),
            bearer_token: std::env::var("TRADEFLOW_API_TOKEN")
                .ok()
                .filter(|token| !token.is_empty()),
            timeout_secs: std::env::var("TRADEFLOW_API_TIMEOUT_SECS")
                .ok()
                .and_then(|secs| secs.parse().ok())
                .unwrap_or(30),
        }
    }
}

impl GatewayConfig {
    /// Gateway pointed at an explicit service root
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            bearer_token: None,
            timeout_secs: 30,
        }
    }
}
