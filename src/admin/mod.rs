//! Introspection API over the diagnostics log.
//!
//! Lives under the reserved `/_harness` prefix, which resource names may not use.

pub mod handlers;

use axum::{routing::get, Router};

use self::handlers::*;
use crate::http::server::AppState;

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/_harness/status", get(get_status))
        .route("/_harness/records", get(get_records))
}
