//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, trace spans)
//!     → dispatch.rs (stages, route lookup, outcome selection)
//!     → forwarder.rs (outbound request, X-Forwarded-For, timeout)
//!     → relay.rs (status, filtered headers, streamed body)
//!     → Send to client
//!
//! No route:
//!     → static_files.rs (when configured) or 404 Not found
//! ```

pub mod dispatch;
pub mod endpoint;
pub mod forwarder;
pub mod headers;
pub mod relay;
pub mod server;
pub mod stages;
pub mod static_files;

pub use dispatch::Dispatcher;
pub use forwarder::{ForwardContext, ForwardError, RequestForwarder};
pub use relay::RelayResult;
pub use server::GatewayServer;
pub use stages::{Stage, StageOutcome};
pub use static_files::StaticSite;
