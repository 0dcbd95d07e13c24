//! Client side of the harness.
//!
//! # Data Flow
//! ```text
//! Request
//!     → Fetcher::send (one suspension point)
//!     → Transport (HTTP via reqwest, or in-process via Router)
//!     → Response
//!     → encoder::decode, exactly once
//!     → Payload, or a ClientFault logged here
//! ```
//!
//! # Design Decisions
//! - No retries; a fault is reported once and returned
//! - Error statuses are still decoded; the status alone is not a fault
//! - Unset timeout means the request may pend indefinitely

pub mod fetcher;
pub mod transport;

pub use fetcher::{decode_response, ClientFault, Fetcher};
pub use transport::{HttpTransport, LocalTransport, Transport, TransportError};
