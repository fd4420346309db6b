//! Sync progress counters with consistent snapshots.
//!
//! Writers publish a whole new snapshot; readers never block and never see
//! a half-applied update.

use arc_swap::ArcSwap;
use serde::Serialize;
use std::sync::Arc;

/// Point-in-time view of the sync engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatusSnapshot {
    /// Cached copy of the durable checkpoint.
    pub checkpoint: u64,
    /// Height of the most recent head notification.
    pub latest_head: Option<u64>,
    pub windows_scanned: u64,
    pub blocks_scanned: u64,
    pub transfers_delivered: u64,
    pub subscription_faults: u64,
    /// Whether a head tracker is currently running.
    pub running: bool,
    pub last_error: Option<String>,
}

impl StatusSnapshot {
    /// Heads not yet accounted for.
    pub fn lag(&self) -> u64 {
        self.latest_head
            .map(|head| head.saturating_sub(self.checkpoint))
            .unwrap_or(0)
    }
}

/// Shared status cell.
#[derive(Debug, Default)]
pub struct SyncStatus {
    inner: ArcSwap<StatusSnapshot>,
}

impl SyncStatus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> Arc<StatusSnapshot> {
        self.inner.load_full()
    }

    fn update<F>(&self, f: F)
    where
        F: Fn(&mut StatusSnapshot),
    {
        self.inner.rcu(|current| {
            let mut next = StatusSnapshot::clone(current);
            f(&mut next);
            next
        });
    }

    pub fn set_checkpoint(&self, height: u64) {
        self.update(|s| s.checkpoint = height);
    }

    pub fn record_head(&self, height: u64) {
        self.update(|s| s.latest_head = Some(s.latest_head.map_or(height, |h| h.max(height))));
    }

    /// A height was fully delivered and the checkpoint advanced to it.
    pub fn record_block(&self, height: u64, transfers: u64) {
        self.update(|s| {
            s.checkpoint = height;
            s.blocks_scanned += 1;
            s.transfers_delivered += transfers;
        });
    }

    pub fn record_window(&self) {
        self.update(|s| {
            s.windows_scanned += 1;
            s.last_error = None;
        });
    }

    pub fn record_fault(&self) {
        self.update(|s| s.subscription_faults += 1);
    }

    pub fn record_error(&self, error: &str) {
        self.update(|s| s.last_error = Some(error.to_string()));
    }

    pub fn set_running(&self, running: bool) {
        self.update(|s| s.running = running);
    }
}
