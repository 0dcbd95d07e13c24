//! Configuration management subsystem.
//!
//! ```text
//! harness.toml
//!     → loader.rs (toml → HarnessConfig)
//!     → validation.rs (every semantic error, not just the first)
//!     → startup builds the route table and server from it, once
//! ```
//!
//! Every section and field has a default, so an empty file is a valid config.

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    ClientConfig, DiagnosticsConfig, HarnessConfig, ListenerConfig, LogFormat,
    ObservabilityConfig, ResourceConfig, TimeoutConfig,
};
