//! Transfer transaction building, signing, and broadcast.
//!
//! # Send sequence
//! ```text
//! assert_owner → next_nonce → calldata → gas price → sign → broadcast
//! ```
//! Any failure aborts the send. A nonce taken for a send that never
//! reached the network is released back to the nonce source.

use alloy::consensus::{Signed, TxEnvelope, TxLegacy};
use alloy::eips::eip2718::Encodable2718;
use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, Bytes, TxHash, U256};
use alloy::rpc::types::TransactionRequest;
use serde::Serialize;
use std::sync::Arc;

use crate::chain::{ChainError, ChainRpc};
use crate::observability::metrics;
use crate::transfer::abi::{decode_uint, encode_balance_of_call, encode_transfer_call};
use crate::transfer::Asset;
use crate::wallet::nonce::NonceSource;
use crate::wallet::signer::{TransferSigner, UnsignedTransfer};
use crate::wallet::types::{WalletError, WalletResult};

const WEI_PER_GWEI: u128 = 1_000_000_000;

/// Intent to move value from a controlled address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    pub from: Address,
    pub to: Address,
    pub gas_limit: u64,
    pub value: U256,
    pub asset: Asset,
}

/// A broadcast transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SentTransfer {
    pub tx_hash: TxHash,
    pub nonce: u64,
}

/// Builds and sends native and ERC20 transfers.
pub struct TxBuilder {
    chain: Arc<dyn ChainRpc>,
    nonces: Arc<dyn NonceSource>,
    chain_id: u64,
    /// Fixed gas price in wei; `None` uses the node's suggestion.
    gas_price: Option<u128>,
    /// Cap on the suggested gas price, 0 disables.
    max_gas_price_gwei: u64,
}

impl TxBuilder {
    /// Create a builder bound to the chain ID the node reports.
    pub async fn connect(
        chain: Arc<dyn ChainRpc>,
        nonces: Arc<dyn NonceSource>,
    ) -> WalletResult<Self> {
        let chain_id = chain.chain_id().await?;
        Ok(Self::new(chain, nonces, chain_id))
    }

    pub fn new(chain: Arc<dyn ChainRpc>, nonces: Arc<dyn NonceSource>, chain_id: u64) -> Self {
        Self {
            chain,
            nonces,
            chain_id,
            gas_price: None,
            max_gas_price_gwei: 0,
        }
    }

    /// Override the suggested gas price. `None` restores the suggestion.
    pub fn with_gas_price(mut self, gas_price_wei: Option<u128>) -> Self {
        self.gas_price = gas_price_wei;
        self
    }

    /// Refuse to send when the suggested price exceeds this many gwei.
    pub fn with_max_gas_price_gwei(mut self, max_gwei: u64) -> Self {
        self.max_gas_price_gwei = max_gwei;
        self
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Send `request.value` of `request.asset`.
    pub async fn transfer(
        &self,
        request: &TransferRequest,
        signer: &dyn TransferSigner,
    ) -> WalletResult<SentTransfer> {
        match request.asset {
            Asset::Native => {
                self.transfer_native(request.from, request.to, request.gas_limit, request.value, signer)
                    .await
            }
            Asset::Token(token) => {
                self.transfer_token(
                    token,
                    request.from,
                    request.to,
                    request.gas_limit,
                    request.value,
                    signer,
                )
                .await
            }
        }
    }

    /// Send native currency directly to `to`.
    pub async fn transfer_native(
        &self,
        from: Address,
        to: Address,
        gas_limit: u64,
        value: U256,
        signer: &dyn TransferSigner,
    ) -> WalletResult<SentTransfer> {
        let sent = self
            .complete_and_send(from, to, gas_limit, value, Bytes::new(), signer)
            .await?;
        metrics::record_transaction_sent(Asset::Native.kind());
        Ok(sent)
    }

    /// Call `transfer(to, value)` on the `token` contract.
    pub async fn transfer_token(
        &self,
        token: Address,
        from: Address,
        to: Address,
        gas_limit: u64,
        value: U256,
        signer: &dyn TransferSigner,
    ) -> WalletResult<SentTransfer> {
        let input = encode_transfer_call(to, value);
        let sent = self
            .complete_and_send(from, token, gas_limit, U256::ZERO, input, signer)
            .await?;
        metrics::record_transaction_sent(Asset::Token(token).kind());
        Ok(sent)
    }

    async fn complete_and_send(
        &self,
        from: Address,
        to: Address,
        gas_limit: u64,
        value: U256,
        input: Bytes,
        signer: &dyn TransferSigner,
    ) -> WalletResult<SentTransfer> {
        signer.assert_owner(from)?;

        let nonce = self.nonces.next_nonce(from).await?;
        match self
            .sign_and_broadcast(from, to, nonce, gas_limit, value, input, signer)
            .await
        {
            Ok(tx_hash) => {
                tracing::info!(from = %from, to = %to, nonce, tx_hash = %tx_hash, "Transaction broadcast");
                Ok(SentTransfer { tx_hash, nonce })
            }
            Err(e) => {
                tracing::warn!(from = %from, nonce, error = %e, "Transaction not sent, releasing nonce");
                self.nonces.release(from, nonce).await;
                Err(e)
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn sign_and_broadcast(
        &self,
        from: Address,
        to: Address,
        nonce: u64,
        gas_limit: u64,
        value: U256,
        input: Bytes,
        signer: &dyn TransferSigner,
    ) -> WalletResult<TxHash> {
        let unsigned = UnsignedTransfer {
            from,
            to,
            nonce,
            gas_limit,
            gas_price: self.gas_price().await?,
            value,
            input,
        };

        let signed: Signed<TxLegacy> = signer.sign(&unsigned, self.chain_id).await?;
        let expected = *signed.hash();
        let raw = TxEnvelope::from(signed).encoded_2718();

        let tx_hash = self.chain.send_raw_transaction(&raw).await?;
        if tx_hash != expected {
            tracing::warn!(expected = %expected, reported = %tx_hash, "Node reported a different transaction hash");
        }
        Ok(tx_hash)
    }

    async fn gas_price(&self) -> WalletResult<u128> {
        if let Some(price) = self.gas_price {
            return Ok(price);
        }

        let suggested = self.chain.gas_price().await?;
        let suggested_gwei = suggested / WEI_PER_GWEI;
        if self.max_gas_price_gwei > 0 && suggested_gwei > self.max_gas_price_gwei as u128 {
            return Err(WalletError::GasPriceTooHigh {
                current_gwei: u64::try_from(suggested_gwei).unwrap_or(u64::MAX),
                max_gwei: self.max_gas_price_gwei,
            });
        }
        Ok(suggested)
    }

    /// Native balance of `address`, at `height` or latest.
    pub async fn native_balance(&self, address: Address, height: Option<u64>) -> WalletResult<U256> {
        Ok(self.chain.balance(address, height).await?)
    }

    /// ERC20 `balanceOf(owner)` on `token`, at `height` or latest.
    pub async fn token_balance(
        &self,
        token: Address,
        owner: Address,
        height: Option<u64>,
    ) -> WalletResult<U256> {
        let call = TransactionRequest::default()
            .with_to(token)
            .with_input(encode_balance_of_call(owner));

        let result = self.chain.call(call, height).await?;
        decode_uint(&result).ok_or_else(|| {
            ChainError::Rpc(format!("balanceOf returned {} bytes", result.len())).into()
        })
    }
}

impl std::fmt::Debug for TxBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TxBuilder")
            .field("chain_id", &self.chain_id)
            .field("gas_price", &self.gas_price)
            .field("max_gas_price_gwei", &self.max_gas_price_gwei)
            .finish()
    }
}
