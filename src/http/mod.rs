//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (axum setup, body limits, request ID)
//!     → request.rs (verb, path, query, headers, body)
//!     → [routing::Router dispatches to a handler]
//!     → encoder.rs (payload → JSON bytes)
//!     → response.rs (status, headers, fault headers)
//!     → Send to client
//! ```

pub mod encoder;
pub mod request;
pub mod response;
pub mod server;

pub use encoder::{decode, encode, DecodeError, Payload};
pub use request::{Params, Request, X_REQUEST_ID};
pub use response::{Response, X_FAULT_KIND, X_FAULT_LOCATION, X_FAULT_MESSAGE};
pub use server::{AppState, HttpServer};
