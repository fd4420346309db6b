//! Signer backed by an encrypted Web3 v3 JSON keystore.

use alloy::consensus::{Signed, TxLegacy};
use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;
use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::wallet::signer::{sign_legacy, TransferSigner, UnsignedTransfer};
use crate::wallet::types::{WalletError, WalletResult};

/// Environment variable holding the keystore password for the CLI.
pub const KEYSTORE_PASSWORD_ENV_VAR: &str = "TRANSFER_SYNC_KEYSTORE_PASSWORD";

#[derive(Deserialize)]
struct KeystoreHeader {
    address: Option<String>,
}

/// Keystore-backed signer, unlocked once at construction.
pub struct KeystoreSigner {
    path: PathBuf,
    signer: PrivateKeySigner,
}

impl KeystoreSigner {
    /// Decrypt the keystore file at `path`.
    pub fn open(path: impl AsRef<Path>, password: impl AsRef<[u8]>) -> WalletResult<Self> {
        let path = path.as_ref();
        let signer = PrivateKeySigner::decrypt_keystore(path, password).map_err(|e| {
            WalletError::Key(format!("failed to unlock keystore {}: {}", path.display(), e))
        })?;

        tracing::info!(address = %signer.address(), path = %path.display(), "Keystore signer unlocked");
        Ok(Self {
            path: path.to_path_buf(),
            signer,
        })
    }

    /// Find the keystore for `address` in `dir` and decrypt it.
    pub fn open_in_dir(
        dir: impl AsRef<Path>,
        address: Address,
        password: impl AsRef<[u8]>,
    ) -> WalletResult<Self> {
        let dir = dir.as_ref();
        let path = find_keystore(dir, address)?.ok_or_else(|| {
            WalletError::Key(format!("no keystore for {} in {}", address, dir.display()))
        })?;

        let signer = Self::open(path, password)?;
        // The header address is unauthenticated; trust only the decrypted key
        signer.assert_owner(address)?;
        Ok(signer)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn find_keystore(dir: &Path, address: Address) -> WalletResult<Option<PathBuf>> {
    let entries = std::fs::read_dir(dir)
        .map_err(|e| WalletError::Key(format!("failed to read {}: {}", dir.display(), e)))?;

    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Ok(content) = std::fs::read_to_string(&path) else {
            continue;
        };
        let Ok(header) = serde_json::from_str::<KeystoreHeader>(&content) else {
            continue;
        };
        let listed = header
            .address
            .and_then(|a| a.parse::<Address>().ok().or_else(|| format!("0x{}", a).parse().ok()));
        if listed == Some(address) {
            return Ok(Some(path));
        }
    }
    Ok(None)
}

#[async_trait]
impl TransferSigner for KeystoreSigner {
    fn address(&self) -> Address {
        self.signer.address()
    }

    async fn sign(&self, tx: &UnsignedTransfer, chain_id: u64) -> WalletResult<Signed<TxLegacy>> {
        sign_legacy(&self.signer, tx, chain_id)
    }
}

impl std::fmt::Debug for KeystoreSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeystoreSigner")
            .field("path", &self.path)
            .field("address", &self.signer.address())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wallet::local::KeySigner;
    use alloy::primitives::{address, Bytes, U256};

    const PASSWORD: &str = "correct horse";
    const ANVIL_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const ANVIL_ADDRESS: Address = address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266");

    fn fixture_dir() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/keystore")
    }

    #[test]
    fn test_open_keystore() {
        let signer = KeystoreSigner::open(fixture_dir().join("anvil-0.json"), PASSWORD).unwrap();
        assert_eq!(signer.address(), ANVIL_ADDRESS);
    }

    #[test]
    fn test_wrong_password() {
        let err = KeystoreSigner::open(fixture_dir().join("anvil-0.json"), "wrong").unwrap_err();
        assert!(matches!(err, WalletError::Key(_)));
    }

    #[test]
    fn test_open_in_dir() {
        let signer = KeystoreSigner::open_in_dir(fixture_dir(), ANVIL_ADDRESS, PASSWORD).unwrap();
        assert!(signer.path().ends_with("anvil-0.json"));

        let missing = KeystoreSigner::open_in_dir(fixture_dir(), Address::repeat_byte(1), PASSWORD);
        assert!(missing.is_err());
    }

    #[tokio::test]
    async fn test_matches_key_signer() {
        let keystore = KeystoreSigner::open(fixture_dir().join("anvil-0.json"), PASSWORD).unwrap();
        let key = KeySigner::from_private_key(ANVIL_KEY).unwrap();

        let tx = UnsignedTransfer {
            from: ANVIL_ADDRESS,
            to: Address::repeat_byte(0x22),
            nonce: 1,
            gas_limit: 21_000,
            gas_price: 200,
            value: U256::from(100_000_000u64),
            input: Bytes::new(),
        };

        // Same key, same deterministic signature
        let a = keystore.sign(&tx, 1).await.unwrap();
        let b = key.sign(&tx, 1).await.unwrap();
        assert_eq!(a.hash(), b.hash());
    }
}
