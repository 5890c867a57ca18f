//! Outbound request construction and execution.
//!
//! # Responsibilities
//! - Rebuild the inbound request for the backend (method, headers, body)
//! - Extend X-Forwarded-For and strip hop-by-hop headers
//! - Bound the wait for the backend response head
//! - Surface connect, TLS and timeout failures as `ForwardError`
//!
//! # Design Decisions
//! - Body is streamed through, never buffered
//! - One timeout covers connect + response head; body streaming is not bounded
//! - Redirects are relayed to the caller, not followed
//! - Dropping the returned future cancels the backend call

use std::net::SocketAddr;
use std::time::Duration;

use axum::body::{Body, HttpBody};
use axum::http::{header, HeaderMap, Method, Request, StatusCode};
use url::Url;

use crate::config::UpstreamConfig;
use crate::http::headers::{append_forwarded_for, strip_hop_by_hop};
use crate::http::relay::RelayResult;

/// Inbound request as seen by the forwarder.
pub struct ForwardContext {
    pub method: Method,
    pub headers: HeaderMap,
    pub path: String,
    pub query: Option<String>,
    pub body: Body,
    pub client_addr: SocketAddr,
}

impl ForwardContext {
    pub fn new(request: Request<Body>, client_addr: SocketAddr) -> Self {
        let (parts, body) = request.into_parts();
        Self {
            method: parts.method,
            headers: parts.headers,
            path: parts.uri.path().to_string(),
            query: parts.uri.query().map(str::to_string),
            body,
            client_addr,
        }
    }
}

/// Failure reaching the backend.
#[derive(Debug, thiserror::Error)]
pub enum ForwardError {
    #[error("backend did not respond within {0:?}")]
    Timeout(Duration),

    #[error("invalid target URL {url:?}: {source}")]
    InvalidTarget {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("backend request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

impl ForwardError {
    /// Status returned to the caller for this failure.
    pub fn status(&self) -> StatusCode {
        match self {
            ForwardError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            ForwardError::Transport(e) if e.is_timeout() => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::BAD_GATEWAY,
        }
    }

    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ForwardError::Timeout(_) => "timeout",
            ForwardError::InvalidTarget { .. } => "invalid_target",
            ForwardError::Transport(e) if e.is_connect() => "connect",
            ForwardError::Transport(e) if e.is_timeout() => "timeout",
            ForwardError::Transport(_) => "transport",
        }
    }
}

/// Executes outbound calls with a shared connection pool.
#[derive(Debug, Clone)]
pub struct RequestForwarder {
    client: reqwest::Client,
    timeout: Duration,
}

impl RequestForwarder {
    pub fn new(config: &UpstreamConfig) -> Result<Self, reqwest::Error> {
        if config.insecure_skip_verify {
            tracing::warn!("Backend TLS certificate verification is DISABLED (upstream.insecure_skip_verify)");
        }

        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .danger_accept_invalid_certs(config.insecure_skip_verify)
            .redirect(reqwest::redirect::Policy::none())
            .no_proxy()
            .build()?;

        Ok(Self {
            client,
            timeout: Duration::from_secs(config.timeout_secs),
        })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Headers sent to the backend for the given inbound headers.
    ///
    /// `Host` is dropped so the client derives it from the target URL.
    pub fn outbound_headers(mut headers: HeaderMap, client_addr: SocketAddr) -> HeaderMap {
        strip_hop_by_hop(&mut headers);
        headers.remove(header::HOST);
        append_forwarded_for(&mut headers, client_addr.ip());
        headers
    }

    /// Send `context` to `target` and wait for the response head.
    pub async fn forward(&self, target: &str, context: ForwardContext) -> Result<RelayResult, ForwardError> {
        let url = Url::parse(target).map_err(|source| ForwardError::InvalidTarget {
            url: target.to_string(),
            source,
        })?;

        let ForwardContext {
            method,
            headers,
            body,
            client_addr,
            ..
        } = context;

        let mut request = self
            .client
            .request(method, url)
            .headers(Self::outbound_headers(headers, client_addr));

        if !body.is_end_stream() {
            request = request.body(reqwest::Body::wrap_stream(body.into_data_stream()));
        }

        match tokio::time::timeout(self.timeout, request.send()).await {
            Ok(Ok(response)) => Ok(RelayResult::from(response)),
            Ok(Err(e)) => Err(ForwardError::Transport(e)),
            Err(_) => Err(ForwardError::Timeout(self.timeout)),
        }
    }
}
