//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route registration (at startup):
//!     RouterBuilder.get/post/put/patch/delete(pattern, handler)
//!     → matcher.rs (compile pattern)
//!     → reject invalid or duplicate (verb, pattern)
//!     → Freeze as immutable Router
//!
//! Incoming Request (verb, path)
//!     → router.rs (route lookup)
//!     → matched Route: handler → encoder → Response
//!     → no match: 404 NotFound Response
//!     → exactly one DiagnosticRecord either way
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - No regex in hot path (segment matching only)
//! - Deterministic: first registered match wins
//! - Handler faults and panics stop at the router boundary

pub mod matcher;
pub mod router;

use axum::http::Method;
use thiserror::Error;

use crate::diagnostics::SourceLocation;

pub use matcher::PathPattern;
pub use router::{Route, Router, RouterBuilder};

/// Errors detected while building the route table.
#[derive(Debug, Error)]
pub enum RouteError {
    #[error("invalid route pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("route {method} {pattern} registered twice (first at {first})")]
    Duplicate {
        method: Method,
        pattern: String,
        first: SourceLocation,
    },
}
