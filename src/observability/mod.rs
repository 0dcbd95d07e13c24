//! Observability subsystem.
//!
//! ```text
//! Router::dispatch, Fetcher, Diagnostics
//!     → logging.rs (tracing subscriber: pretty or JSON)
//!     → metrics.rs (request, fault and client-fault counters)
//!
//! Exposed as:
//!     → stdout log lines, one per diagnostic record
//!     → Prometheus scrape endpoint, when enabled
//! ```
//!
//! The request ID is a field on every log line about a request.

pub mod logging;
pub mod metrics;
