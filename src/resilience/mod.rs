//! Resilience helpers.
//!
//! The sync engine never retries internally; the daemon restarts the head
//! tracker from the durable checkpoint after a jittered backoff.

pub mod backoff;

pub use backoff::{calculate_backoff, RestartBackoff};
