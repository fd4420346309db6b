//! Chain integration subsystem.
//!
//! # Data Flow
//! ```text
//! ChainConfig (RPC URL, failovers, timeout)
//!     → client.rs (alloy providers, failover, timeouts)
//!     → rpc.rs (ChainRpc: the only surface the engine sees)
//!     → types.rs (BlockBody, HeadEvent, ChainError)
//! ```
//!
//! # Constraints
//! - Every RPC call has a deadline
//! - Head subscriptions require a WebSocket endpoint
//! - Broadcasts go to the primary endpoint only

pub mod client;
pub mod rpc;
pub mod types;

pub use client::RpcClient;
pub use rpc::ChainRpc;
pub use types::{BlockBody, BlockTx, ChainError, ChainId, ChainResult, HeadEvent, HeadStream};
