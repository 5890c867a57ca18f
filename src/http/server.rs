//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the gateway handler as fallback
//! - Wire up middleware (request ID, tracing)
//! - Bind server to listener with client address info
//! - Hand every request to the dispatcher

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::Request,
    response::Response,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::{ConfigError, GatewayConfig};
use crate::http::dispatch::Dispatcher;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
}

/// HTTP server for the gateway.
pub struct GatewayServer {
    router: Router,
    config: GatewayConfig,
}

impl GatewayServer {
    /// Create a new server, building the route table from `config`.
    pub fn new(config: GatewayConfig) -> Result<Self, ConfigError> {
        let dispatcher = Dispatcher::from_config(&config)?;
        Ok(Self::with_dispatcher(config, dispatcher))
    }

    /// Create a server around an already-built dispatcher.
    pub fn with_dispatcher(config: GatewayConfig, dispatcher: Dispatcher) -> Self {
        tracing::info!(
            routes = dispatcher.routes().len(),
            static_root = ?dispatcher.static_site().map(|site| site.root().to_path_buf()),
            "Dispatcher ready"
        );
        for (priority, route) in dispatcher.routes().iter().enumerate() {
            tracing::info!(
                priority,
                route = %route.name(),
                prefix = %route.match_prefix(),
                backend = %route.backend(),
                rewrite = ?route.rewrite().map(|r| (r.prefix(), r.replacement())),
                "Route"
            );
        }

        let state = AppState {
            dispatcher: Arc::new(dispatcher),
        };
        Self {
            router: Self::build_router(state),
            config,
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .fallback(gateway_handler)
            .with_state(state)
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(self, listener: TcpListener, mut shutdown: broadcast::Receiver<()>) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            timeout_secs = self.config.upstream.timeout_secs,
            "HTTP server starting"
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }
}

/// Gateway handler: every request goes through the dispatcher.
async fn gateway_handler(
    State(state): State<AppState>,
    ConnectInfo(client_addr): ConnectInfo<SocketAddr>,
    request: Request<Body>,
) -> Response {
    state.dispatcher.dispatch(request, client_addr).await
}
