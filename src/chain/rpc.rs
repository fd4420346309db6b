//! The remote RPC endpoint as seen by the engine.

use alloy::primitives::{Address, Bytes, TxHash, U256};
use alloy::rpc::types::{Filter, Log, TransactionRequest};
use async_trait::async_trait;

use crate::chain::types::{BlockBody, ChainResult, HeadStream};

/// Capabilities consumed from a chain node.
///
/// Connection handling, retries and serialization belong to the
/// implementation; callers see only [`ChainError`](crate::chain::ChainError).
#[async_trait]
pub trait ChainRpc: Send + Sync {
    /// Chain identifier reported by the node.
    async fn chain_id(&self) -> ChainResult<u64>;

    /// Current suggested gas price in wei.
    async fn gas_price(&self) -> ChainResult<u128>;

    /// Full block at `height`. A missing block is an error.
    async fn block_body(&self, height: u64) -> ChainResult<BlockBody>;

    /// Logs matching `filter`, in chain order.
    ///
    /// Must fail rather than answer from a node whose head is below the
    /// filter's upper bound.
    async fn logs(&self, filter: &Filter) -> ChainResult<Vec<Log>>;

    /// Subscribe to new chain heads.
    async fn subscribe_heads(&self) -> ChainResult<HeadStream>;

    /// Native balance of `address`, at `height` or latest.
    async fn balance(&self, address: Address, height: Option<u64>) -> ChainResult<U256>;

    /// Read-only contract call, at `height` or latest.
    async fn call(&self, tx: TransactionRequest, height: Option<u64>) -> ChainResult<Bytes>;

    /// Pending transaction count, used as the next nonce.
    async fn transaction_count(&self, address: Address) -> ChainResult<u64>;

    /// Broadcast an EIP-2718 encoded signed transaction.
    async fn send_raw_transaction(&self, raw: &[u8]) -> ChainResult<TxHash>;
}
