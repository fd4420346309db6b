//! Transfer classification subsystem.
//!
//! # Data Flow
//! ```text
//! BlockTx (block body)  → classifier.rs (native rule)  ┐
//!                                                      ├→ TransferRecord
//! Log (filtered logs)   → classifier.rs (token rule)   ┘
//!
//! abi.rs: selectors and calldata for the ERC20 methods we call
//! ```

pub mod abi;
pub mod classifier;
pub mod types;

pub use classifier::TransferClassifier;
pub use types::{Asset, TransferRecord, NATIVE_ASSET};
