//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check every route's prefix and backend URL
//! - Validate value ranges (timeouts > 0, addresses parse)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::{SocketAddr, ToSocketAddrs};
use std::path::Path;

use crate::config::proxy_map::{parse_proxy_map, ProxyMapError};
use crate::config::schema::{GatewayConfig, RouteConfig};
use crate::routing::{RouteEntry, RouteError};

/// A single semantic problem in a configuration.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("listener.bind_address {0:?} does not resolve to a socket address")]
    BindAddress(String),

    #[error("observability.metrics_address {0:?} is not a socket address")]
    MetricsAddress(String),

    #[error("upstream.{0} must be greater than zero")]
    ZeroTimeout(&'static str),

    #[error("route #{index} ({prefix:?}): {source}")]
    Route {
        index: usize,
        prefix: String,
        #[source]
        source: RouteError,
    },

    #[error("proxy_map: {0}")]
    ProxyMap(#[from] ProxyMapError),

    #[error("static_files.root {0:?} is not a directory")]
    StaticRoot(String),
}

impl GatewayConfig {
    /// File routes followed by the compact proxy map entries.
    pub fn route_configs(&self) -> Result<Vec<RouteConfig>, ProxyMapError> {
        let mut routes = self.routes.clone();
        if let Some(map) = &self.proxy_map {
            routes.extend(parse_proxy_map(map)?);
        }
        Ok(routes)
    }
}

/// Validate a configuration, collecting every problem found.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    // Resolved like the listener bind, so host names such as `localhost:8000` pass.
    let bind_resolves = config
        .listener
        .bind_address
        .to_socket_addrs()
        .is_ok_and(|mut addrs| addrs.next().is_some());
    if !bind_resolves {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::MetricsAddress(config.observability.metrics_address.clone()));
    }

    if config.upstream.timeout_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("timeout_secs"));
    }
    if config.upstream.connect_timeout_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("connect_timeout_secs"));
    }

    match config.route_configs() {
        Ok(routes) => {
            for (index, route) in routes.iter().enumerate() {
                if let Err(source) = RouteEntry::try_from(route) {
                    errors.push(ValidationError::Route {
                        index,
                        prefix: route.path_prefix.clone(),
                        source,
                    });
                }
            }
        }
        Err(e) => errors.push(ValidationError::ProxyMap(e)),
    }

    if let Some(static_files) = &config.static_files {
        if !Path::new(&static_files.root).is_dir() {
            errors.push(ValidationError::StaticRoot(static_files.root.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
