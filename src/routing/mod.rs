//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request path
//!     → table.rs (first-match prefix scan)
//!     → rewrite.rs (optional leading-prefix replacement)
//!     → Return: target URL or NoMatch
//!
//! Route construction (at startup):
//!     RouteConfig[] (file routes, then compact proxy map)
//!     → Validate backend URLs
//!     → Freeze as RouteTable owned by the Dispatcher
//! ```
//!
//! # Design Decisions
//! - Routes built at startup, immutable at runtime
//! - No regex in hot path (literal prefixes only)
//! - Registration order is priority; first match wins

pub mod rewrite;
pub mod table;

pub use rewrite::{outbound_path, RewriteRule};
pub use table::{BackendUrl, RouteEntry, RouteError, RouteTable};
