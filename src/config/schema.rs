//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Route definitions, in match priority order.
    pub routes: Vec<RouteConfig>,

    /// Compact route list (`prefix|target,prefix|target`), appended after `routes`.
    pub proxy_map: Option<String>,

    /// Outbound call settings.
    pub upstream: UpstreamConfig,

    /// Static site served for requests that match no route.
    pub static_files: Option<StaticFilesConfig>,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address as `host:port` (e.g., "0.0.0.0:8000" or "localhost:8000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8000".to_string(),
        }
    }
}

/// Route configuration mapping a path prefix to a backend base URL.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct RouteConfig {
    /// Route identifier for logging/metrics. Defaults to the prefix.
    #[serde(default)]
    pub name: Option<String>,

    /// Literal path prefix to match.
    pub path_prefix: String,

    /// Absolute backend base URL (scheme, host, optional base path).
    pub backend: String,

    /// Optional rewrite applied to the path before forwarding.
    #[serde(default)]
    pub rewrite: Option<RewriteConfig>,
}

impl RouteConfig {
    /// Route without a name or rewrite.
    pub fn new(path_prefix: impl Into<String>, backend: impl Into<String>) -> Self {
        Self {
            name: None,
            path_prefix: path_prefix.into(),
            backend: backend.into(),
            rewrite: None,
        }
    }

    pub fn with_rewrite(mut self, prefix: impl Into<String>, replacement: impl Into<String>) -> Self {
        self.rewrite = Some(RewriteConfig {
            prefix: prefix.into(),
            replacement: replacement.into(),
        });
        self
    }
}

/// Path rewrite: the leading `prefix` is replaced by `replacement`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct RewriteConfig {
    pub prefix: String,
    #[serde(default)]
    pub replacement: String,
}

/// Outbound call configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Maximum wait for the backend response head, in seconds.
    pub timeout_secs: u64,

    /// TCP connect timeout in seconds.
    pub connect_timeout_secs: u64,

    /// Skip verification of backend TLS certificates.
    ///
    /// This disables server authentication for every HTTPS backend. Only use
    /// it against backends with self-signed certificates on trusted networks.
    pub insecure_skip_verify: bool,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            connect_timeout_secs: 5,
            insecure_skip_verify: false,
        }
    }
}

/// Static site configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StaticFilesConfig {
    /// Directory to serve from.
    pub root: String,

    /// Serve `index.html` for paths without a file extension.
    #[serde(default = "default_spa_fallback")]
    pub spa_fallback: bool,
}

fn default_spa_fallback() -> bool {
    true
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
