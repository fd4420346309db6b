//! Per-sender nonce allocation.

use alloy::primitives::Address;
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;

use crate::chain::ChainRpc;
use crate::wallet::types::{WalletError, WalletResult};

/// Supplies transaction nonces.
///
/// Two concurrent calls for the same address must never return the same
/// value.
#[async_trait]
pub trait NonceSource: Send + Sync {
    /// Next nonce to use for `address`.
    async fn next_nonce(&self, address: Address) -> WalletResult<u64>;

    /// Hand back a nonce whose transaction was never broadcast.
    async fn release(&self, _address: Address, _nonce: u64) {}
}

/// Nonces from the node's pending transaction count, reconciled with the
/// nonces this process already handed out.
#[derive(Clone)]
pub struct ChainNonceSource {
    chain: Arc<dyn ChainRpc>,
    /// Next unissued nonce per sender.
    issued: Arc<DashMap<Address, u64>>,
}

impl ChainNonceSource {
    pub fn new(chain: Arc<dyn ChainRpc>) -> Self {
        Self {
            chain,
            issued: Arc::new(DashMap::new()),
        }
    }
}

#[async_trait]
impl NonceSource for ChainNonceSource {
    async fn next_nonce(&self, address: Address) -> WalletResult<u64> {
        let pending = self
            .chain
            .transaction_count(address)
            .await
            .map_err(|e| WalletError::Nonce(format!("failed to read nonce for {}: {}", address, e)))?;

        // The entry guard serializes concurrent callers for one address
        let mut next = self.issued.entry(address).or_insert(pending);
        let nonce = (*next).max(pending);
        *next = nonce + 1;
        Ok(nonce)
    }

    async fn release(&self, address: Address, nonce: u64) {
        if let Some(mut next) = self.issued.get_mut(&address) {
            if *next == nonce + 1 {
                *next = nonce;
            }
        }
    }
}

impl std::fmt::Debug for ChainNonceSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainNonceSource")
            .field("tracked_senders", &self.issued.len())
            .finish()
    }
}
