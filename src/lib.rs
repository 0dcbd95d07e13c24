//! Request harness library.
//!
//! A small HTTP dispatch harness: a route table of handlers, a JSON
//! encoder, a client fetcher, and an append-only diagnostics log that
//! records the outcome of every request.

pub mod admin;
pub mod client;
pub mod config;
pub mod diagnostics;
pub mod handler;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;
pub mod store;

pub use client::{ClientFault, Fetcher};
pub use config::HarnessConfig;
pub use diagnostics::{DiagnosticRecord, Diagnostics, Fault, FaultKind, RecordFilter};
pub use handler::{handler_fn, Handler, HandlerError, HandlerFault, Reply};
pub use http::{HttpServer, Payload, Request, Response};
pub use lifecycle::{start, Harness, Shutdown};
pub use routing::{Router, RouterBuilder};
