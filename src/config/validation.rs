//! Configuration validation.
//!
//! Serde handles syntax; this pass checks values and reports every
//! problem at once.

use alloy::primitives::Address;
use std::fmt;
use std::net::SocketAddr;

use crate::config::schema::{WatcherConfig, PLACEHOLDER_API_KEY};

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Check every field and collect all problems.
pub fn validate_config(config: &WatcherConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_url("chain.rpc_url", &config.chain.rpc_url, &mut errors);
    for (i, url) in config.chain.failover_urls.iter().enumerate() {
        check_url(&format!("chain.failover_urls[{}]", i), url, &mut errors);
    }
    if config.chain.rpc_timeout_secs == 0 {
        errors.push(ValidationError::new("chain.rpc_timeout_secs", "must be greater than 0"));
    }

    if config.sync.window_size == 0 {
        errors.push(ValidationError::new("sync.window_size", "must be greater than 0"));
    }
    for (i, asset) in config.sync.assets.iter().enumerate() {
        if asset.parse::<Address>().is_err() {
            errors.push(ValidationError::new(
                format!("sync.assets[{}]", i),
                format!("'{}' is not a contract address", asset),
            ));
        }
    }
    if config.sync.restart_base_delay_ms > config.sync.restart_max_delay_ms {
        errors.push(ValidationError::new(
            "sync.restart_base_delay_ms",
            "must not exceed sync.restart_max_delay_ms",
        ));
    }

    if config.observability.metrics_enabled {
        check_socket("observability.metrics_address", &config.observability.metrics_address, &mut errors);
    }

    if config.admin.enabled {
        check_socket("admin.bind_address", &config.admin.bind_address, &mut errors);
        if config.admin.api_key.is_empty() || config.admin.api_key == PLACEHOLDER_API_KEY {
            errors.push(ValidationError::new("admin.api_key", "must be set when admin is enabled"));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// The daemon follows heads over a subscription, which needs a ws or wss
/// primary endpoint. Failovers only serve reads and may use http.
pub fn check_daemon_endpoint(config: &WatcherConfig) -> Result<(), ValidationError> {
    match config.chain.rpc_url.parse::<url::Url>() {
        Ok(url) if matches!(url.scheme(), "ws" | "wss") => Ok(()),
        Ok(url) => Err(ValidationError::new(
            "chain.rpc_url",
            format!("head subscriptions need ws or wss, got '{}'", url.scheme()),
        )),
        Err(e) => Err(ValidationError::new("chain.rpc_url", e.to_string())),
    }
}

/// Parse the validated asset allow-list.
pub fn parse_assets(assets: &[String]) -> Result<Vec<Address>, ValidationError> {
    assets
        .iter()
        .enumerate()
        .map(|(i, asset)| {
            asset.parse::<Address>().map_err(|e| {
                ValidationError::new(format!("sync.assets[{}]", i), format!("'{}': {}", asset, e))
            })
        })
        .collect()
}

fn check_url(field: &str, value: &str, errors: &mut Vec<ValidationError>) {
    match value.parse::<url::Url>() {
        Ok(url) if matches!(url.scheme(), "http" | "https" | "ws" | "wss") => {}
        Ok(url) => errors.push(ValidationError::new(
            field,
            format!("unsupported scheme '{}'", url.scheme()),
        )),
        Err(e) => errors.push(ValidationError::new(field, e.to_string())),
    }
}

fn check_socket(field: &str, value: &str, errors: &mut Vec<ValidationError>) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(field, format!("'{}' is not a socket address", value)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&WatcherConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = WatcherConfig::default();
        config.chain.rpc_url = "not a url".to_string();
        config.sync.window_size = 0;
        config.sync.assets = vec!["USDT".to_string()];
        config.admin.enabled = true;

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(
            fields,
            vec!["chain.rpc_url", "sync.window_size", "sync.assets[0]", "admin.api_key"]
        );
    }

    #[test]
    fn test_rejects_unsupported_scheme() {
        let mut config = WatcherConfig::default();
        config.chain.failover_urls = vec!["ftp://node".to_string()];
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors[0].field, "chain.failover_urls[0]");
    }

    #[test]
    fn test_daemon_needs_websocket_endpoint() {
        let mut config = WatcherConfig::default();
        assert!(check_daemon_endpoint(&config).is_ok());

        config.chain.rpc_url = "http://127.0.0.1:8545".to_string();
        assert!(validate_config(&config).is_ok());
        let err = check_daemon_endpoint(&config).unwrap_err();
        assert_eq!(err.field, "chain.rpc_url");
        assert!(err.message.contains("'http'"));

        config.chain.rpc_url = "wss://node.example:8546".to_string();
        config.chain.failover_urls = vec!["https://backup.example".to_string()];
        assert!(check_daemon_endpoint(&config).is_ok());
    }

    #[test]
    fn test_parse_assets() {
        let assets = parse_assets(&["0xdAC17F958D2ee523a2206206994597C13D831ec7".to_string()]).unwrap();
        assert_eq!(assets.len(), 1);
        assert!(parse_assets(&["0x12".to_string()]).is_err());
    }
}
