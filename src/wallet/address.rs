//! Address and key helpers.

use alloy::hex;
use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;

use crate::wallet::types::{WalletError, WalletResult};

/// Address controlled by a hex-encoded private key.
pub fn address_from_private_key(key_hex: &str) -> WalletResult<Address> {
    let key_hex = key_hex.strip_prefix("0x").unwrap_or(key_hex);
    key_hex
        .parse::<PrivateKeySigner>()
        .map(|signer| signer.address())
        .map_err(|e| WalletError::Key(format!("Invalid private key format: {}", e)))
}

/// Generate a random key. Returns the key as hex without `0x` and its address.
pub fn new_address() -> (String, Address) {
    let signer = PrivateKeySigner::random();
    (hex::encode(signer.to_bytes()), signer.address())
}
