//! Signer holding a raw private key in memory.
//!
//! # Security
//! - Keys are never logged or serialized
//! - The environment loader reads `TRANSFER_SYNC_PRIVATE_KEY`

use alloy::consensus::{Signed, TxLegacy};
use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;
use async_trait::async_trait;

use crate::wallet::signer::{sign_legacy, TransferSigner, UnsignedTransfer};
use crate::wallet::types::{WalletError, WalletResult};

/// Environment variable name for the private key.
pub const PRIVATE_KEY_ENV_VAR: &str = "TRANSFER_SYNC_PRIVATE_KEY";

/// Key-in-memory signer.
#[derive(Debug, Clone)]
pub struct KeySigner {
    signer: PrivateKeySigner,
}

impl KeySigner {
    /// Create a signer from a hex-encoded private key (with or without 0x).
    pub fn from_private_key(private_key_hex: &str) -> WalletResult<Self> {
        let key_hex = private_key_hex
            .trim()
            .strip_prefix("0x")
            .unwrap_or(private_key_hex.trim());

        let signer: PrivateKeySigner = key_hex
            .parse()
            .map_err(|e| WalletError::Key(format!("Invalid private key format: {}", e)))?;

        tracing::info!(address = %signer.address(), "Key signer initialized");
        Ok(Self { signer })
    }

    /// Load the key from `TRANSFER_SYNC_PRIVATE_KEY`.
    pub fn from_env() -> WalletResult<Self> {
        let private_key = std::env::var(PRIVATE_KEY_ENV_VAR).map_err(|_| {
            WalletError::Key(format!("Environment variable {} not set", PRIVATE_KEY_ENV_VAR))
        })?;

        Self::from_private_key(&private_key)
    }
}

#[async_trait]
impl TransferSigner for KeySigner {
    fn address(&self) -> Address {
        self.signer.address()
    }

    async fn sign(&self, tx: &UnsignedTransfer, chain_id: u64) -> WalletResult<Signed<TxLegacy>> {
        sign_legacy(&self.signer, tx, chain_id)
    }
}
