//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML) + command-line overrides
//!     → loader.rs (parse & deserialize)
//!     → proxy_map.rs (expand compact `prefix|target` list)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!     → Dispatcher and listener built from it once, before serving
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; there is no hot reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod proxy_map;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::GatewayConfig;
pub use schema::ListenerConfig;
pub use schema::ObservabilityConfig;
pub use schema::RewriteConfig;
pub use schema::RouteConfig;
pub use schema::StaticFilesConfig;
pub use schema::UpstreamConfig;
pub use validation::{validate_config, ValidationError};
