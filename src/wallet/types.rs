//! Wallet-side error definitions.

use alloy::primitives::Address;
use thiserror::Error;

use crate::chain::ChainError;

/// Errors from building, signing or broadcasting a transfer.
#[derive(Debug, Error)]
pub enum WalletError {
    /// The signer does not control the claimed sender.
    #[error("Signer controls {controlled}, not {claimed}")]
    Ownership { claimed: Address, controlled: Address },

    /// Signing failed.
    #[error("Signing failed: {0}")]
    Signing(String),

    /// Invalid private key, keystore or password.
    #[error("Key error: {0}")]
    Key(String),

    /// Nonce lookup failed.
    #[error("Nonce error: {0}")]
    Nonce(String),

    /// Suggested gas price exceeded the configured cap.
    #[error("Gas price {current_gwei} gwei exceeds maximum {max_gwei} gwei")]
    GasPriceTooHigh { current_gwei: u64, max_gwei: u64 },

    /// RPC failure while querying or broadcasting.
    #[error(transparent)]
    Chain(#[from] ChainError),
}

/// Result type for wallet operations.
pub type WalletResult<T> = Result<T, WalletError>;
