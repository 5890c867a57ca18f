//! HTTP edge gateway.
//!
//! # Architecture Overview
//!
//! ```text
//!                        ┌──────────────────────────────────────────────┐
//!                        │                 EDGE GATEWAY                 │
//!     Client Request     │  ┌────────┐   ┌──────────┐   ┌────────────┐  │
//!     ───────────────────┼─▶│  http  │──▶│ dispatch │──▶│  routing   │  │
//!                        │  │ server │   │ + stages │   │table+rewrite│ │
//!                        │  └────────┘   └────┬─────┘   └────────────┘  │
//!                        │                    │ no route                │
//!                        │                    ├──────▶ static site / 404│
//!                        │                    ▼                         │
//!     Client Response    │  ┌────────┐   ┌──────────┐                   │
//!     ◀──────────────────┼──│ relay  │◀──│forwarder │◀──────────────────┼──── Backend
//!                        │  └────────┘   └──────────┘                   │
//!                        └──────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tokio::net::TcpListener;

use edge_gateway::config::{load_config, validate_config, ConfigError, GatewayConfig, StaticFilesConfig};
use edge_gateway::http::endpoint::run_endpoint;
use edge_gateway::http::GatewayServer;
use edge_gateway::lifecycle::{spawn_signal_handler, Shutdown};
use edge_gateway::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "edge-gateway")]
#[command(about = "HTTP edge gateway routing requests to backends by path prefix", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the gateway
    Serve(ServeArgs),
    /// Run a fixed-content test backend
    Endpoint(EndpointArgs),
}

#[derive(Args)]
struct ServeArgs {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen address, e.g. 0.0.0.0:8000
    #[arg(short, long)]
    bind: Option<String>,

    /// Extra routes as `prefix|target,prefix|target`, after file routes
    #[arg(short, long)]
    routes: Option<String>,

    /// Backend response timeout in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Accept invalid backend TLS certificates (insecure)
    #[arg(long)]
    insecure_skip_verify: bool,

    /// Serve static files from this directory for unmatched paths
    #[arg(long)]
    static_dir: Option<PathBuf>,

    /// Log level (overridden by RUST_LOG)
    #[arg(long)]
    log_level: Option<String>,
}

impl ServeArgs {
    fn apply(&self, config: &mut GatewayConfig) {
        if let Some(bind) = &self.bind {
            config.listener.bind_address = bind.clone();
        }
        if let Some(routes) = &self.routes {
            config.proxy_map = Some(match config.proxy_map.take() {
                Some(existing) => format!("{existing},{routes}"),
                None => routes.clone(),
            });
        }
        if let Some(timeout) = self.timeout_secs {
            config.upstream.timeout_secs = timeout;
        }
        if self.insecure_skip_verify {
            config.upstream.insecure_skip_verify = true;
        }
        if let Some(dir) = &self.static_dir {
            config.static_files = Some(StaticFilesConfig {
                root: dir.display().to_string(),
                spa_fallback: true,
            });
        }
        if let Some(level) = &self.log_level {
            config.observability.log_level = level.clone();
        }
    }
}

#[derive(Args)]
struct EndpointArgs {
    /// Port to listen on
    #[arg(short, long, default_value_t = 5001)]
    port: u16,

    /// Content returned for every request (JSON is served as application/json)
    content: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    match Cli::parse().command {
        Command::Serve(args) => serve(args).await,
        Command::Endpoint(args) => endpoint(args).await,
    }
}

async fn serve(args: ServeArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => GatewayConfig::default(),
    };
    args.apply(&mut config);
    validate_config(&config).map_err(ConfigError::Validation)?;

    logging::init_tracing(&config.observability.log_level);
    tracing::info!("edge-gateway v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        timeout_secs = config.upstream.timeout_secs,
        insecure_skip_verify = config.upstream.insecure_skip_verify,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    // Routes are complete before the listener accepts anything.
    let server = GatewayServer::new(config.clone())?;
    let listener = TcpListener::bind(&config.listener.bind_address).await?;

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    spawn_signal_handler(shutdown);

    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

async fn endpoint(args: EndpointArgs) -> Result<(), Box<dyn std::error::Error>> {
    logging::init_tracing("info");

    let listener = TcpListener::bind(SocketAddr::from(([0, 0, 0, 0], args.port))).await?;

    let shutdown = Shutdown::new();
    let endpoint_shutdown = shutdown.subscribe();
    spawn_signal_handler(shutdown);

    run_endpoint(listener, args.content, endpoint_shutdown).await?;
    Ok(())
}
