//! Lifecycle management subsystem.
//!
//! ```text
//! startup.rs:  validate config → Diagnostics → Router → bind → serve
//! signals.rs:  SIGINT/SIGTERM → Shutdown::trigger
//! shutdown.rs: trigger → stop accepting → drain in-flight requests
//! ```
//!
//! Any startup error is fatal and is returned before the listener binds.

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::{build_router, start, start_with, Harness, StartupError};
