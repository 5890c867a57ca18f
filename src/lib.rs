//! HTTP edge gateway library.
//!
//! Routes requests by literal path prefix to backend services, optionally
//! rewriting the path, and relays backend responses as streams.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;

pub use config::GatewayConfig;
pub use http::{Dispatcher, GatewayServer};
pub use lifecycle::Shutdown;
pub use routing::{RouteEntry, RouteTable};
