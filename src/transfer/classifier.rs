//! Classification of raw chain data into transfer records.
//!
//! Anything that does not have the exact shape of a transfer is skipped,
//! never reported as an error.

use alloy::primitives::{Address, U256};
use alloy::rpc::types::Log;
use std::collections::HashSet;

use crate::chain::BlockTx;
use crate::transfer::abi::{decode_uint, TRANSFER_EVENT_SIGNATURE};
use crate::transfer::types::{Asset, TransferRecord};

/// Turns block transactions and logs into [`TransferRecord`]s.
#[derive(Debug, Clone, Default)]
pub struct TransferClassifier {
    /// Token contracts of interest. Empty means every contract.
    assets: HashSet<Address>,
}

impl TransferClassifier {
    pub fn new(assets: impl IntoIterator<Item = Address>) -> Self {
        Self {
            assets: assets.into_iter().collect(),
        }
    }

    /// The configured allow-list, in no particular order.
    pub fn assets(&self) -> Vec<Address> {
        self.assets.iter().copied().collect()
    }

    pub fn tracks(&self, contract: &Address) -> bool {
        self.assets.is_empty() || self.assets.contains(contract)
    }

    /// A plain value transfer: positive value, no calldata, and a recipient.
    pub fn classify_native(&self, tx: &BlockTx, block_number: u64) -> Option<TransferRecord> {
        if tx.value == U256::ZERO || !tx.input.is_empty() {
            return None;
        }
        let to = tx.to?;

        Some(TransferRecord {
            from: tx.from,
            to,
            value: tx.value,
            asset: Asset::Native,
            tx_hash: tx.hash,
            block_number,
        })
    }

    /// An ERC20 `Transfer(address indexed, address indexed, uint256)` log
    /// from a tracked contract.
    pub fn classify_token(&self, log: &Log) -> Option<TransferRecord> {
        if log.removed || !self.tracks(&log.address()) {
            return None;
        }

        let topics = log.topics();
        if topics.len() != 3 || topics[0] != TRANSFER_EVENT_SIGNATURE {
            return None;
        }

        let Some(value) = decode_uint(&log.data().data) else {
            tracing::trace!(
                tx_hash = ?log.transaction_hash,
                len = log.data().data.len(),
                "Skipping transfer log with oversized amount"
            );
            return None;
        };

        Some(TransferRecord {
            from: Address::from_word(topics[1]),
            to: Address::from_word(topics[2]),
            value,
            asset: Asset::Token(log.address()),
            tx_hash: log.transaction_hash?,
            block_number: log.block_number?,
        })
    }
}
