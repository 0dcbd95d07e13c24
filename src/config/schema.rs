//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the harness.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the request harness.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct HarnessConfig {
    /// Listener configuration (bind address, body limit).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Settings used by the client fetcher.
    pub client: ClientConfig,

    /// Diagnostics reporter settings.
    pub diagnostics: DiagnosticsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Resources exposed as CRUD routes.
    pub resources: Vec<ResourceConfig>,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "127.0.0.1:3000").
    pub bind_address: String,

    /// Largest request body accepted, in bytes.
    pub max_body_bytes: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:3000".to_string(),
            max_body_bytes: 1024 * 1024,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Client fetcher configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL requests are resolved against.
    pub base_url: String,

    /// Overall request timeout. `None` waits indefinitely.
    pub timeout_secs: Option<u64>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:3000".to_string(),
            timeout_secs: None,
        }
    }
}

/// Diagnostics reporter configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DiagnosticsConfig {
    /// Write every record to the log as it is appended.
    pub log_records: bool,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self { log_records: true }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    pub log_level: String,

    /// Log line format.
    pub log_format: LogFormat,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "request_harness=debug,tower_http=debug".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

/// A collection exposed under `/{name}` with index/show/create/update/destroy.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ResourceConfig {
    /// Collection name, used as the path prefix (e.g. "movies").
    pub name: String,

    /// Key wrapping the record fields in request bodies (e.g. "movie").
    /// Defaults to the name without a trailing "s".
    #[serde(default)]
    pub param_key: Option<String>,

    /// Fields accepted on create/update. Empty accepts every field.
    #[serde(default)]
    pub permitted: Vec<String>,

    /// Respond to create with the new record (201). When false, create
    /// stores the record and responds 204 with no body.
    #[serde(default = "default_render_created")]
    pub render_created: bool,
}

fn default_render_created() -> bool {
    true
}

impl ResourceConfig {
    /// Create a resource with default settings.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            param_key: None,
            permitted: Vec::new(),
            render_created: default_render_created(),
        }
    }

    /// The key wrapping record fields in request bodies.
    pub fn param_key(&self) -> String {
        match &self.param_key {
            Some(key) => key.clone(),
            None => self
                .name
                .strip_suffix('s')
                .filter(|s| !s.is_empty())
                .unwrap_or(&self.name)
                .to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_document() {
        let config: HarnessConfig = toml::from_str("").unwrap();
        assert_eq!(config.listener.bind_address, "127.0.0.1:3000");
        assert_eq!(config.timeouts.request_secs, 30);
        assert!(config.client.timeout_secs.is_none());
        assert!(config.diagnostics.log_records);
        assert!(config.resources.is_empty());
    }

    #[test]
    fn test_resource_section() {
        let config: HarnessConfig = toml::from_str(
            r#"
            [observability]
            log_format = "json"

            [[resources]]
            name = "movies"
            permitted = ["title", "year"]
            render_created = false
            "#,
        )
        .unwrap();

        assert_eq!(config.observability.log_format, LogFormat::Json);
        let movies = &config.resources[0];
        assert_eq!(movies.param_key(), "movie");
        assert_eq!(movies.permitted, vec!["title", "year"]);
        assert!(!movies.render_created);
    }

    #[test]
    fn test_param_key_override() {
        let mut people = ResourceConfig::new("people");
        assert_eq!(people.param_key(), "people");
        people.param_key = Some("person".into());
        assert_eq!(people.param_key(), "person");
        assert_eq!(ResourceConfig::new("s").param_key(), "s");
    }
}
