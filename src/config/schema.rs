//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from TOML. Every
//! section has defaults so a minimal file only names the RPC endpoint.

use serde::{Deserialize, Serialize};

/// Root configuration for the transfer watcher.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct WatcherConfig {
    /// Chain endpoint settings.
    pub chain: ChainConfig,

    /// Synchronization settings.
    pub sync: SyncConfig,

    /// Transaction sending settings.
    pub transactions: TransactionConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Admin status endpoint.
    pub admin: AdminConfig,
}

/// Chain endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ChainConfig {
    /// JSON-RPC endpoint URL. Head subscriptions need ws:// or wss://.
    pub rpc_url: String,

    /// Failover JSON-RPC endpoint URLs, used for reads.
    pub failover_urls: Vec<String>,

    /// Expected chain ID; 0 accepts whatever the node reports.
    pub chain_id: u64,

    /// RPC request timeout in seconds.
    pub rpc_timeout_secs: u64,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            rpc_url: "ws://localhost:8546".to_string(),
            failover_urls: Vec::new(),
            chain_id: 0,
            rpc_timeout_secs: 10,
        }
    }
}

/// Synchronization configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Blocks per scan window.
    pub window_size: u64,

    /// ERC20 contracts to watch. Empty watches every contract.
    pub assets: Vec<String>,

    /// Checkpoint file. `None` keeps the checkpoint in memory.
    pub checkpoint_path: Option<String>,

    /// Checkpoint reported before the file exists.
    pub start_height: u64,

    /// Base delay before restarting a failed tracker, in milliseconds.
    pub restart_base_delay_ms: u64,

    /// Maximum restart delay, in milliseconds.
    pub restart_max_delay_ms: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            window_size: crate::sync::DEFAULT_WINDOW_SIZE,
            assets: Vec::new(),
            checkpoint_path: None,
            start_height: 0,
            restart_base_delay_ms: 500,
            restart_max_delay_ms: 30_000,
        }
    }
}

/// Transaction sending configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TransactionConfig {
    /// Fixed gas price in wei instead of the node's suggestion.
    pub gas_price_wei: Option<u64>,

    /// Maximum accepted suggested gas price in gwei, 0 disables the cap.
    pub max_gas_price_gwei: u64,
}

impl Default for TransactionConfig {
    fn default() -> Self {
        Self {
            gas_price_wei: None,
            max_gas_price_gwei: 500,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Placeholder key shipped in defaults; refused when admin is enabled.
pub const PLACEHOLDER_API_KEY: &str = "CHANGE_ME_IN_PRODUCTION";

/// Admin status endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Enable the admin endpoint.
    pub enabled: bool,

    /// API key for authentication (Bearer token).
    pub api_key: String,

    /// Admin endpoint bind address.
    pub bind_address: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: PLACEHOLDER_API_KEY.to_string(),
            bind_address: "127.0.0.1:8081".to_string(),
        }
    }
}
