//! Head tracking loop.
//!
//! # Responsibilities
//! - Resume from the durable checkpoint on start
//! - Turn head notifications into consecutive scan windows
//! - Report subscription faults without stopping
//! - Exit promptly on shutdown, after the window in flight

use futures_util::StreamExt;
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::TryRecvError};

use crate::chain::{ChainError, ChainRpc, HeadEvent};
use crate::observability::metrics;
use crate::sync::scanner::BatchScanner;
use crate::sync::status::SyncStatus;
use crate::sync::types::SyncResult;
use crate::sync::window::{partition, DEFAULT_WINDOW_SIZE};

/// How a catch-up pass ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CatchUp {
    Done,
    Stopped,
}

/// Long-lived task feeding new heights to a [`BatchScanner`].
pub struct HeadTracker {
    chain: Arc<dyn ChainRpc>,
    scanner: BatchScanner,
    window_size: u64,
}

impl HeadTracker {
    pub fn new(chain: Arc<dyn ChainRpc>, scanner: BatchScanner) -> Self {
        Self {
            chain,
            scanner,
            window_size: DEFAULT_WINDOW_SIZE,
        }
    }

    /// Blocks per scan window. Zero falls back to the default.
    pub fn with_window_size(mut self, window_size: u64) -> Self {
        self.window_size = if window_size == 0 {
            DEFAULT_WINDOW_SIZE
        } else {
            window_size
        };
        self
    }

    pub fn status(&self) -> &Arc<SyncStatus> {
        self.scanner.status()
    }

    /// Run until `shutdown` fires or a window fails.
    ///
    /// Shutdown takes priority over a head notification that is already
    /// pending. A dropped shutdown sender also stops the loop.
    pub async fn run(&self, mut shutdown: broadcast::Receiver<()>) -> SyncResult<()> {
        let status = self.status().clone();
        let mut synced = self.scanner.checkpoint_store().read().await?;
        status.set_checkpoint(synced);
        metrics::set_checkpoint(synced);

        let mut heads = self.chain.subscribe_heads().await?;
        status.set_running(true);
        tracing::info!(
            checkpoint = synced,
            window_size = self.window_size,
            "Head tracker started"
        );

        let result = loop {
            tokio::select! {
                biased;

                _ = shutdown.recv() => {
                    tracing::info!("Head tracker received shutdown signal, exiting loop");
                    break Ok(());
                }
                event = heads.next() => match event {
                    Some(HeadEvent::NewHead(head)) => {
                        status.record_head(head);
                        metrics::set_chain_head(head);
                        match self.catch_up(&mut synced, head, &mut shutdown).await {
                            Ok(CatchUp::Done) => {}
                            Ok(CatchUp::Stopped) => {
                                tracing::info!(checkpoint = synced, "Head tracker stopped between windows");
                                break Ok(());
                            }
                            Err(e) => break Err(e),
                        }
                    }
                    Some(HeadEvent::Fault(reason)) => {
                        tracing::warn!(reason = %reason, "Head subscription fault");
                        status.record_fault();
                        metrics::record_subscription_fault();
                    }
                    None => break Err(ChainError::SubscriptionClosed.into()),
                },
            }
        };

        if let Err(e) = &result {
            tracing::error!(checkpoint = synced, error = %e, "Head tracker failed");
            status.record_error(&e.to_string());
        }
        status.set_running(false);
        result
    }

    async fn catch_up(
        &self,
        synced: &mut u64,
        head: u64,
        shutdown: &mut broadcast::Receiver<()>,
    ) -> SyncResult<CatchUp> {
        let from = *synced + 1;
        if from > head {
            tracing::debug!(head, checkpoint = *synced, "Stale head notification");
            return Ok(CatchUp::Done);
        }

        tracing::debug!(from, head, "New head");
        for window in partition(from, head, self.window_size) {
            let summary = self.scanner.scan(window.low, window.high).await?;
            *synced = window.high;
            metrics::set_checkpoint(*synced);
            tracing::debug!(
                low = window.low,
                high = window.high,
                transfers = summary.transfers,
                "Window synced"
            );

            if shutdown_requested(shutdown) {
                return Ok(CatchUp::Stopped);
            }
        }
        Ok(CatchUp::Done)
    }
}

fn shutdown_requested(shutdown: &mut broadcast::Receiver<()>) -> bool {
    !matches!(shutdown.try_recv(), Err(TryRecvError::Empty))
}
