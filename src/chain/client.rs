//! Chain RPC client with failover and timeout handling.
//!
//! # Responsibilities
//! - Connect to JSON-RPC endpoints (HTTP or WebSocket)
//! - Read blocks, logs, balances and nonces with failover
//! - Subscribe to new heads on the primary endpoint
//! - Broadcast signed transactions on the primary endpoint

use alloy::consensus::Transaction as _;
use alloy::eips::{BlockId, BlockNumberOrTag};
use alloy::network::TransactionResponse;
use alloy::primitives::{Address, Bytes, TxHash, U256};
use alloy::providers::{Provider, ProviderBuilder, WsConnect};
use alloy::rpc::types::{Block, Filter, Log, TransactionRequest};
use alloy::transports::{TransportErrorKind, TransportResult};
use async_trait::async_trait;
use futures_util::stream::{self, StreamExt};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tokio::time::timeout;

use crate::chain::rpc::ChainRpc;
use crate::chain::types::{
    BlockBody, BlockTx, ChainConfig, ChainError, ChainId, ChainResult, HeadEvent, HeadStream,
};
use crate::observability::metrics;

type DynProvider = Arc<dyn Provider + Send + Sync>;

/// Chain RPC client wrapper with failover support.
///
/// Reads fall through the provider list in order. Subscriptions and
/// broadcasts only use the primary endpoint.
#[derive(Clone)]
pub struct RpcClient {
    /// List of providers (primary + failovers).
    providers: Vec<DynProvider>,
    config: ChainConfig,
    timeout_duration: Duration,
}

impl RpcClient {
    /// Connect to the configured endpoints.
    ///
    /// An unreachable primary is tolerated here; the first real call
    /// reports it. A chain ID mismatch is fatal.
    pub async fn connect(config: ChainConfig) -> ChainResult<Self> {
        let mut providers = vec![connect_provider(&config.rpc_url).await?];

        for url_str in &config.failover_urls {
            match connect_provider(url_str).await {
                Ok(provider) => providers.push(provider),
                Err(e) => tracing::warn!(url = %url_str, error = %e, "Ignoring failover RPC URL"),
            }
        }

        let client = Self::from_providers(providers, config.clone());

        match client.verify_chain_id().await {
            Ok(()) => {
                tracing::info!(
                    rpc_url = %config.rpc_url,
                    chain_id = config.chain_id,
                    "Chain client initialized"
                );
            }
            Err(e @ ChainError::ChainMismatch { .. }) => return Err(e),
            Err(e) => {
                tracing::warn!(error = %e, "Chain client initialized but chain verification failed");
            }
        }

        Ok(client)
    }

    fn from_providers(providers: Vec<DynProvider>, config: ChainConfig) -> Self {
        Self {
            providers,
            timeout_duration: Duration::from_secs(config.rpc_timeout_secs),
            config,
        }
    }

    /// Verify the connected chain ID matches configuration. A configured
    /// chain ID of 0 accepts any chain.
    pub async fn verify_chain_id(&self) -> ChainResult<()> {
        let chain_id = ChainId(self.chain_id().await?);
        if self.config.chain_id != 0 && chain_id.0 != self.config.chain_id {
            return Err(ChainError::ChainMismatch {
                expected: self.config.chain_id,
                actual: chain_id.0,
            });
        }
        Ok(())
    }

    /// Check if the chain is reachable by querying the block number.
    pub async fn is_healthy(&self) -> bool {
        let healthy = self
            .with_failover("get_block_number", |p| async move { p.get_block_number().await })
            .await
            .is_ok();
        metrics::record_backend_health("chain_rpc", healthy);
        healthy
    }

    /// Get the configuration.
    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    fn primary(&self) -> &DynProvider {
        &self.providers[0]
    }

    /// Run `op` against each provider in turn until one succeeds.
    async fn with_failover<T, F, Fut>(&self, method: &'static str, op: F) -> ChainResult<T>
    where
        F: Fn(DynProvider) -> Fut,
        Fut: Future<Output = TransportResult<T>>,
    {
        let mut last_error = None;
        for (i, provider) in self.providers.iter().enumerate() {
            match timeout(self.timeout_duration, op(provider.clone())).await {
                Ok(Ok(result)) => return Ok(result),
                Ok(Err(e)) => {
                    tracing::warn!(provider_idx = i, method, error = %e, "RPC error, trying next provider");
                    last_error = Some(ChainError::Rpc(format!("{}: {}", method, e)));
                }
                Err(_) => {
                    tracing::warn!(provider_idx = i, method, "RPC timeout, trying next provider");
                    last_error = Some(ChainError::Timeout(self.config.rpc_timeout_secs));
                }
            }
        }
        Err(last_error.unwrap_or_else(|| ChainError::Rpc(format!("{}: no providers configured", method))))
    }
}

async fn connect_provider(url_str: &str) -> ChainResult<DynProvider> {
    let url: url::Url = url_str
        .parse()
        .map_err(|e| ChainError::InvalidUrl(format!("'{}': {}", url_str, e)))?;

    match url.scheme() {
        "ws" | "wss" => {
            let provider = ProviderBuilder::new()
                .connect_ws(WsConnect::new(url.as_str()))
                .await
                .map_err(|e| ChainError::Rpc(format!("WebSocket connect to {} failed: {}", url, e)))?;
            Ok(Arc::new(provider) as DynProvider)
        }
        "http" | "https" => Ok(Arc::new(ProviderBuilder::new().connect_http(url)) as DynProvider),
        other => Err(ChainError::InvalidUrl(format!("unsupported scheme '{}'", other))),
    }
}

fn block_body(block: Block) -> BlockBody {
    let transactions = block
        .transactions
        .txns()
        .map(|tx| BlockTx {
            hash: TransactionResponse::tx_hash(tx),
            from: TransactionResponse::from(tx),
            to: tx.to(),
            value: tx.value(),
            input: tx.input().clone(),
        })
        .collect();

    BlockBody {
        number: block.header.number,
        transactions,
    }
}

fn block_id(height: Option<u64>) -> BlockId {
    height.map(BlockId::number).unwrap_or_else(BlockId::latest)
}

#[async_trait]
impl ChainRpc for RpcClient {
    async fn chain_id(&self) -> ChainResult<u64> {
        self.with_failover("get_chain_id", |p| async move { p.get_chain_id().await })
            .await
    }

    async fn gas_price(&self) -> ChainResult<u128> {
        self.with_failover("get_gas_price", |p| async move { p.get_gas_price().await })
            .await
    }

    async fn block_body(&self, height: u64) -> ChainResult<BlockBody> {
        let block = self
            .with_failover("get_block_by_number", |p| async move {
                p.get_block_by_number(BlockNumberOrTag::Number(height))
                    .full()
                    .await
            })
            .await?;

        block
            .map(block_body)
            .ok_or_else(|| ChainError::Rpc(format!("block {} not found", height)))
    }

    /// A node whose head is below the filter's upper bound answers with a
    /// partial list instead of an error, so it is skipped like a failed one.
    async fn logs(&self, filter: &Filter) -> ChainResult<Vec<Log>> {
        let required = filter.get_to_block();
        self.with_failover("get_logs", |p| {
            let filter = filter.clone();
            async move {
                if let Some(required) = required {
                    let head = p.get_block_number().await?;
                    if head < required {
                        return Err(TransportErrorKind::custom_str(&format!(
                            "node head {} is behind requested block {}",
                            head, required
                        )));
                    }
                }
                p.get_logs(&filter).await
            }
        })
        .await
    }

    async fn subscribe_heads(&self) -> ChainResult<HeadStream> {
        let subscription = self
            .primary()
            .subscribe_blocks()
            .await
            .map_err(|e| ChainError::Rpc(format!("subscribe_blocks: {}", e)))?;

        let heads = stream::unfold(subscription, |mut sub| async move {
            match sub.recv().await {
                Ok(header) => Some((HeadEvent::NewHead(header.number), sub)),
                Err(RecvError::Lagged(skipped)) => Some((
                    HeadEvent::Fault(format!("subscription lagged by {} heads", skipped)),
                    sub,
                )),
                Err(RecvError::Closed) => None,
            }
        });

        Ok(heads.boxed())
    }

    async fn balance(&self, address: Address, height: Option<u64>) -> ChainResult<U256> {
        self.with_failover("get_balance", |p| async move {
            p.get_balance(address).block_id(block_id(height)).await
        })
        .await
    }

    async fn call(&self, tx: TransactionRequest, height: Option<u64>) -> ChainResult<Bytes> {
        self.with_failover("call", |p| {
            let tx = tx.clone();
            async move { p.call(tx).block(block_id(height)).await }
        })
        .await
    }

    async fn transaction_count(&self, address: Address) -> ChainResult<u64> {
        self.with_failover("get_transaction_count", |p| async move {
            p.get_transaction_count(address).pending().await
        })
        .await
    }

    async fn send_raw_transaction(&self, raw: &[u8]) -> ChainResult<TxHash> {
        let pending = timeout(self.timeout_duration, self.primary().send_raw_transaction(raw))
            .await
            .map_err(|_| ChainError::Timeout(self.config.rpc_timeout_secs))?
            .map_err(|e| ChainError::Rpc(format!("send_raw_transaction: {}", e)))?;
        Ok(*pending.tx_hash())
    }
}

impl std::fmt::Debug for RpcClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcClient")
            .field("rpc_url", &self.config.rpc_url)
            .field("failovers", &(self.providers.len() - 1))
            .field("chain_id", &self.config.chain_id)
            .field("timeout_secs", &self.config.rpc_timeout_secs)
            .finish()
    }
}
