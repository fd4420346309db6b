//! Chain-facing data types and error definitions.

use alloy::primitives::{Address, Bytes, TxHash, U256};
use futures_util::stream::BoxStream;
use thiserror::Error;

pub use crate::config::schema::ChainConfig;

/// Chain ID type for strong typing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChainId(pub u64);

impl From<u64> for ChainId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<ChainId> for u64 {
    fn from(id: ChainId) -> Self {
        id.0
    }
}

/// Errors raised by the remote RPC endpoint (the transport class).
#[derive(Debug, Error)]
pub enum ChainError {
    /// RPC connection or request failed.
    #[error("RPC error: {0}")]
    Rpc(String),

    /// RPC request timed out.
    #[error("RPC timeout after {0} seconds")]
    Timeout(u64),

    /// The head subscription ended and must be re-established.
    #[error("Head subscription closed")]
    SubscriptionClosed,

    /// Chain configuration mismatch.
    #[error("Chain ID mismatch: expected {expected}, got {actual}")]
    ChainMismatch { expected: u64, actual: u64 },

    /// Endpoint URL could not be parsed.
    #[error("Invalid RPC URL: {0}")]
    InvalidUrl(String),
}

/// Result type for chain operations.
pub type ChainResult<T> = Result<T, ChainError>;

/// The parts of a block transaction needed to classify a native transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockTx {
    pub hash: TxHash,
    /// Recovered sender.
    pub from: Address,
    /// `None` for contract creation.
    pub to: Option<Address>,
    pub value: U256,
    pub input: Bytes,
}

/// A block body with its transactions in in-block order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockBody {
    pub number: u64,
    pub transactions: Vec<BlockTx>,
}

/// One item from the head subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeadEvent {
    /// A new chain head at the given height.
    NewHead(u64),
    /// The subscription reported a fault but is still open.
    Fault(String),
}

/// Stream of head events. The stream ending means the subscription closed.
pub type HeadStream = BoxStream<'static, HeadEvent>;
