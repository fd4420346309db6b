//! Signing contract shared by every key back-end.

use alloy::consensus::{SignableTransaction, Signed, TxLegacy};
use alloy::network::TxSignerSync;
use alloy::primitives::{Address, Bytes, TxKind, U256};
use alloy::signers::local::PrivateKeySigner;
use async_trait::async_trait;

use crate::wallet::types::{WalletError, WalletResult};

/// A transfer ready to be signed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsignedTransfer {
    pub from: Address,
    /// Recipient for native transfers, token contract for token transfers.
    pub to: Address,
    pub nonce: u64,
    pub gas_limit: u64,
    pub gas_price: u128,
    pub value: U256,
    /// Empty for native transfers.
    pub input: Bytes,
}

impl UnsignedTransfer {
    /// EIP-155 legacy transaction bound to `chain_id`.
    pub fn to_legacy(&self, chain_id: u64) -> TxLegacy {
        TxLegacy {
            chain_id: Some(chain_id),
            nonce: self.nonce,
            gas_price: self.gas_price,
            gas_limit: self.gas_limit,
            to: TxKind::Call(self.to),
            value: self.value,
            input: self.input.clone(),
        }
    }
}

/// Something that holds a key and can sign transfers with it.
///
/// Implementations differ only in where the key lives.
#[async_trait]
pub trait TransferSigner: Send + Sync {
    /// Address of the controlled key.
    fn address(&self) -> Address;

    /// Sign `tx` for `chain_id`.
    async fn sign(&self, tx: &UnsignedTransfer, chain_id: u64) -> WalletResult<Signed<TxLegacy>>;

    /// Fail unless `claimed` is the controlled address.
    fn assert_owner(&self, claimed: Address) -> WalletResult<()> {
        let controlled = self.address();
        if claimed != controlled {
            return Err(WalletError::Ownership {
                claimed,
                controlled,
            });
        }
        Ok(())
    }
}

/// Sign with a decrypted local key.
pub(crate) fn sign_legacy(
    key: &PrivateKeySigner,
    tx: &UnsignedTransfer,
    chain_id: u64,
) -> WalletResult<Signed<TxLegacy>> {
    let mut legacy = tx.to_legacy(chain_id);
    let signature = key
        .sign_transaction_sync(&mut legacy)
        .map_err(|e| WalletError::Signing(e.to_string()))?;
    Ok(legacy.into_signed(signature))
}
