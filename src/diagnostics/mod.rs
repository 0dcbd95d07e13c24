//! Diagnostics subsystem.
//!
//! # Data Flow
//! ```text
//! Router finishes a request
//!     → reporter.rs (append one DiagnosticRecord, write log line)
//!
//! Readers (tests, admin API, CLI):
//!     → reporter.rs query(filter)
//!     → lazy, chronological sequence of records
//! ```
//!
//! # Design Decisions
//! - Append-only: records are immutable once written
//! - Faults share one taxonomy (fault.rs) between server and client
//! - Log lines use the `Display` form of `DiagnosticRecord`

pub mod fault;
pub mod record;
pub mod reporter;

pub use fault::{Fault, FaultKind, SourceLocation};
pub use record::{DiagnosticRecord, Encoding, Handling, RecordEntry, RecordFilter, Routing, Stage};
pub use reporter::{Diagnostics, Query, QueryIter};
