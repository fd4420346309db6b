//! Shutdown coordination.
//!
//! A broadcast receiver only sees messages sent after it subscribed, so the
//! coordinator also latches a flag. Callers that subscribe late check
//! [`Shutdown::is_triggered`] after subscribing and before blocking.

use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::broadcast;

/// One-shot stop signal shared by the tracker, the restart loop and the
/// admin server.
pub struct Shutdown {
    triggered: AtomicBool,
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self {
            triggered: AtomicBool::new(false),
            tx,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Latch the flag, then wake every current subscriber.
    pub fn trigger(&self) {
        if !self.triggered.swap(true, Ordering::SeqCst) {
            tracing::debug!(listeners = self.tx.receiver_count(), "Shutdown triggered");
        }
        let _ = self.tx.send(());
    }

    pub fn is_triggered(&self) -> bool {
        self.triggered.load(Ordering::SeqCst)
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
