//! Batch scanning of a window of block heights.
//!
//! # Algorithm
//! ```text
//! one log query for [low, high]  → group by height
//! for height in low..=high:
//!     block body → native transfers → sink
//!     logs@height → token transfers → sink
//!     checkpoint.increment()
//! ```
//!
//! The checkpoint only moves after every record of a height was accepted,
//! so a failure re-delivers at most the one height that was in progress.

use alloy::primitives::TxHash;
use alloy::rpc::types::{Filter, Log};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use crate::chain::{ChainError, ChainRpc};
use crate::observability::metrics;
use crate::sync::checkpoint::CheckpointStore;
use crate::sync::sink::TransferSink;
use crate::sync::status::SyncStatus;
use crate::sync::types::{SyncError, SyncResult};
use crate::transfer::abi::TRANSFER_EVENT_SIGNATURE;
use crate::transfer::{Asset, TransferClassifier, TransferRecord};

/// Outcome of one [`BatchScanner::scan`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanSummary {
    /// Heights completed and checkpointed.
    pub blocks: u64,
    /// Records accepted by the sink.
    pub transfers: u64,
}

/// Scans block windows and feeds the transfer sink.
pub struct BatchScanner {
    chain: Arc<dyn ChainRpc>,
    checkpoint: Arc<dyn CheckpointStore>,
    sink: Arc<dyn TransferSink>,
    classifier: TransferClassifier,
    status: Arc<SyncStatus>,
}

impl BatchScanner {
    pub fn new(
        chain: Arc<dyn ChainRpc>,
        checkpoint: Arc<dyn CheckpointStore>,
        sink: Arc<dyn TransferSink>,
        classifier: TransferClassifier,
    ) -> Self {
        Self {
            chain,
            checkpoint,
            sink,
            classifier,
            status: Arc::new(SyncStatus::new()),
        }
    }

    /// Report progress into a shared status cell.
    pub fn with_status(mut self, status: Arc<SyncStatus>) -> Self {
        self.status = status;
        self
    }

    pub fn status(&self) -> &Arc<SyncStatus> {
        &self.status
    }

    pub fn checkpoint_store(&self) -> &Arc<dyn CheckpointStore> {
        &self.checkpoint
    }

    /// Scan the inclusive height range `[low, high]`.
    ///
    /// Heights at or below the stored checkpoint are skipped, so re-issuing a
    /// window after a failure is safe. A window that starts past
    /// `checkpoint + 1` is rejected instead of leaving a gap.
    pub async fn scan(&self, low: u64, high: u64) -> SyncResult<ScanSummary> {
        if low > high {
            return Err(SyncError::InvalidWindow { low, high });
        }

        let synced = self.checkpoint.read().await?;
        self.status.set_checkpoint(synced);

        if high <= synced {
            tracing::debug!(low, high, checkpoint = synced, "Window already synced");
            return Ok(ScanSummary::default());
        }
        if low > synced + 1 {
            return Err(SyncError::WindowGap {
                checkpoint: synced,
                low,
            });
        }
        let low = synced + 1;

        tracing::debug!(low, high, "Scanning window");

        let mut logs_by_height = self.fetch_logs(low, high).await?;
        let mut delivered = HashSet::new();
        let mut summary = ScanSummary::default();

        for height in low..=high {
            let logs = logs_by_height.remove(&height).unwrap_or_default();
            let transfers = self.scan_height(height, &logs, &mut delivered).await?;

            let stored = self.checkpoint.increment().await?;
            if stored != height {
                return Err(SyncError::Storage(format!(
                    "checkpoint moved to {} while completing height {}",
                    stored, height
                )));
            }

            self.status.record_block(height, transfers);
            metrics::record_block_scanned(height);
            summary.blocks += 1;
            summary.transfers += transfers;

            tracing::debug!(height, transfers, "Height synced");
        }

        self.status.record_window();
        Ok(summary)
    }

    fn log_filter(&self, low: u64, high: u64) -> Filter {
        let filter = Filter::new()
            .from_block(low)
            .to_block(high)
            .event_signature(TRANSFER_EVENT_SIGNATURE);

        let assets = self.classifier.assets();
        if assets.is_empty() {
            filter
        } else {
            filter.address(assets)
        }
    }

    async fn fetch_logs(&self, low: u64, high: u64) -> SyncResult<BTreeMap<u64, Vec<Log>>> {
        let logs = self.chain.logs(&self.log_filter(low, high)).await?;

        let mut by_height: BTreeMap<u64, Vec<Log>> = BTreeMap::new();
        for log in logs {
            match log.block_number {
                Some(height) => by_height.entry(height).or_default().push(log),
                None => tracing::trace!(tx_hash = ?log.transaction_hash, "Skipping pending log"),
            }
        }
        Ok(by_height)
    }

    /// Deliver every transfer at `height`: native ones in block order, then
    /// token ones in log order.
    async fn scan_height(
        &self,
        height: u64,
        logs: &[Log],
        delivered: &mut HashSet<(TxHash, Asset)>,
    ) -> SyncResult<u64> {
        let block = self.chain.block_body(height).await?;
        if block.number != height {
            return Err(ChainError::Rpc(format!(
                "requested block {}, node returned {}",
                height, block.number
            ))
            .into());
        }

        let native = block
            .transactions
            .iter()
            .filter_map(|tx| self.classifier.classify_native(tx, height));
        let tokens = logs.iter().filter_map(|log| self.classifier.classify_token(log));

        let mut count = 0;
        for record in native.chain(tokens) {
            if !delivered.insert((record.tx_hash, record.asset)) {
                tracing::trace!(tx_hash = %record.tx_hash, asset = %record.asset, "Duplicate transfer skipped");
                continue;
            }
            self.deliver(record, height).await?;
            count += 1;
        }
        Ok(count)
    }

    async fn deliver(&self, record: TransferRecord, height: u64) -> SyncResult<()> {
        let kind = record.asset.kind();
        self.sink
            .on_transfer(record)
            .await
            .map_err(|e| SyncError::SinkRejected {
                height,
                reason: e.to_string(),
            })?;
        metrics::record_transfer(kind);
        Ok(())
    }
}

impl std::fmt::Debug for BatchScanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchScanner")
            .field("classifier", &self.classifier)
            .finish_non_exhaustive()
    }
}
