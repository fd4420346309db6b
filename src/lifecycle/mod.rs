//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Shutdown::trigger
//!
//! Shutdown (shutdown.rs):
//!     broadcast → head tracker exits after the window in flight
//!               → admin server stops accepting
//!
//! Supervisor (supervisor.rs):
//!     tracker error → backoff → rerun from the stored checkpoint
//! ```

pub mod shutdown;
pub mod signals;
pub mod supervisor;

pub use shutdown::Shutdown;
pub use supervisor::run_with_restarts;
