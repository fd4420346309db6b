//! Chain synchronization and transfer extraction engine.
//!
//! Follows chain heads, scans each new height exactly once for native and
//! ERC20 transfers, and builds, signs and broadcasts transfer transactions.

pub mod admin;
pub mod chain;
pub mod config;
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod sync;
pub mod transfer;
pub mod wallet;

pub use chain::{ChainRpc, RpcClient};
pub use config::schema::WatcherConfig;
pub use lifecycle::Shutdown;
pub use sync::{BatchScanner, CheckpointStore, HeadTracker, TransferSink};
pub use transfer::{Asset, TransferClassifier, TransferRecord};
pub use wallet::{NonceSource, TransferSigner, TxBuilder};
