//! Normalized transfer records.

use alloy::primitives::{Address, TxHash, U256};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Tag used for the chain's base asset.
pub const NATIVE_ASSET: &str = "ETH";

/// Denomination of a transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Asset {
    /// The chain's base asset.
    Native,
    /// An ERC20 token, identified by its contract.
    Token(Address),
}

impl Asset {
    /// Label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Asset::Native => "native",
            Asset::Token(_) => "token",
        }
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Asset::Native => f.write_str(NATIVE_ASSET),
            Asset::Token(address) => write!(f, "{}", address),
        }
    }
}

impl FromStr for Asset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case(NATIVE_ASSET) {
            return Ok(Asset::Native);
        }
        s.parse::<Address>()
            .map(Asset::Token)
            .map_err(|e| format!("invalid asset '{}': {}", s, e))
    }
}

impl From<Asset> for String {
    fn from(asset: Asset) -> Self {
        asset.to_string()
    }
}

impl TryFrom<String> for Asset {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// A value movement discovered on chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRecord {
    pub from: Address,
    pub to: Address,
    pub value: U256,
    pub asset: Asset,
    pub tx_hash: TxHash,
    /// Height of the block that included the transfer.
    pub block_number: u64,
}
