//! Transfer sending subsystem.
//!
//! # Data Flow
//! ```text
//! TransferRequest
//!     → builder.rs (owner check, nonce, calldata, gas price)
//!     → signer.rs (TransferSigner: local.rs | keystore.rs)
//!     → chain::ChainRpc::send_raw_transaction
//! ```
//!
//! # Security Constraints
//! - Private keys come from the environment or an encrypted keystore
//! - Never log private keys or passwords
//! - Ownership is checked before any nonce is taken

pub mod address;
pub mod builder;
pub mod keystore;
pub mod local;
pub mod nonce;
pub mod signer;
pub mod types;

pub use builder::{SentTransfer, TransferRequest, TxBuilder};
pub use keystore::KeystoreSigner;
pub use local::KeySigner;
pub use nonce::{ChainNonceSource, NonceSource};
pub use signer::{TransferSigner, UnsignedTransfer};
pub use types::{WalletError, WalletResult};
