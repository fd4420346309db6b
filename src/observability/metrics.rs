//! Metrics collection and exposition.
//!
//! # Metrics
//! - `sync_transfers_total` (counter): delivered transfers by asset kind
//! - `sync_blocks_scanned_total` (counter): heights checkpointed
//! - `sync_checkpoint_height` (gauge): last fully processed height
//! - `sync_chain_head` (gauge): latest head notification
//! - `sync_subscription_faults_total` (counter)
//! - `wallet_transactions_sent_total` (counter): broadcasts by asset kind
//! - `rpc_backend_health` (gauge): 1=healthy, 0=unhealthy
//!
//! Recording without an installed exporter is a no-op.

use metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Start the Prometheus scrape endpoint on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_transfer(asset_kind: &'static str) {
    counter!("sync_transfers_total", "asset_kind" => asset_kind).increment(1);
}

pub fn record_block_scanned(height: u64) {
    counter!("sync_blocks_scanned_total").increment(1);
    gauge!("sync_checkpoint_height").set(height as f64);
}

pub fn set_checkpoint(height: u64) {
    gauge!("sync_checkpoint_height").set(height as f64);
}

pub fn set_chain_head(height: u64) {
    gauge!("sync_chain_head").set(height as f64);
}

pub fn record_subscription_fault() {
    counter!("sync_subscription_faults_total").increment(1);
}

pub fn record_transaction_sent(asset_kind: &'static str) {
    counter!("wallet_transactions_sent_total", "asset_kind" => asset_kind).increment(1);
}

pub fn record_backend_health(backend: &'static str, healthy: bool) {
    gauge!("rpc_backend_health", "backend" => backend).set(if healthy { 1.0 } else { 0.0 });
}
