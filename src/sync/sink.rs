//! Consumers of classified transfers.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::sync::types::SinkError;
use crate::transfer::TransferRecord;

/// Receives transfer records one at a time.
///
/// Returning an error aborts the scan window in progress; the height being
/// processed is delivered again on the next attempt.
#[async_trait]
pub trait TransferSink: Send + Sync {
    async fn on_transfer(&self, record: TransferRecord) -> Result<(), SinkError>;
}

/// Emits each transfer as a structured log event.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

#[async_trait]
impl TransferSink for LogSink {
    async fn on_transfer(&self, record: TransferRecord) -> Result<(), SinkError> {
        tracing::info!(
            block_number = record.block_number,
            tx_hash = %record.tx_hash,
            asset = %record.asset,
            from = %record.from,
            to = %record.to,
            value = %record.value,
            "Transfer"
        );
        Ok(())
    }
}

/// Forwards transfers into a bounded channel. Backpressure from a slow
/// receiver stalls the scan; a dropped receiver rejects.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::Sender<TransferRecord>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::Sender<TransferRecord>) -> Self {
        Self { tx }
    }

    /// Create a sink together with its receiving end.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<TransferRecord>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }
}

#[async_trait]
impl TransferSink for ChannelSink {
    async fn on_transfer(&self, record: TransferRecord) -> Result<(), SinkError> {
        self.tx
            .send(record)
            .await
            .map_err(|_| SinkError::new("transfer receiver dropped"))
    }
}
