//! Chain synchronization subsystem.
//!
//! # Data Flow
//! ```text
//! ChainRpc::subscribe_heads
//!     → tracker.rs (head events, shutdown, window partitioning)
//!     → scanner.rs (logs + block bodies per window)
//!     → transfer::classifier (native / token rules)
//!     → sink.rs (TransferSink::on_transfer)
//!     → checkpoint.rs (increment after each completed height)
//!
//! status.rs: snapshot counters for the admin endpoint
//! ```
//!
//! # Invariants
//! - Windows run strictly one at a time and start at checkpoint + 1
//! - The checkpoint advances by one per height, after delivery
//! - A failed window leaves the checkpoint at the last completed height

pub mod checkpoint;
pub mod scanner;
pub mod sink;
pub mod status;
pub mod tracker;
pub mod types;
pub mod window;

pub use checkpoint::{CheckpointStore, FileCheckpoint, MemoryCheckpoint};
pub use scanner::{BatchScanner, ScanSummary};
pub use sink::{ChannelSink, LogSink, TransferSink};
pub use status::{StatusSnapshot, SyncStatus};
pub use tracker::HeadTracker;
pub use types::{SinkError, SyncError, SyncResult};
pub use window::{partition, ScanWindow, DEFAULT_WINDOW_SIZE};
