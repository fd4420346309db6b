//! Restart loop around the head tracker.

use std::time::Duration;

use crate::lifecycle::shutdown::Shutdown;
use crate::resilience::RestartBackoff;
use crate::sync::HeadTracker;

/// Keep `tracker` running until shutdown, backing off between failures.
///
/// The backoff resets whenever a run advanced the checkpoint.
pub async fn run_with_restarts(tracker: &HeadTracker, mut backoff: RestartBackoff, shutdown: &Shutdown) {
    let mut shutdown_rx = shutdown.subscribe();

    loop {
        let run_rx = shutdown.subscribe();
        if shutdown.is_triggered() {
            return;
        }

        let before = tracker.status().snapshot().checkpoint;
        let result = tracker.run(run_rx).await;
        let after = tracker.status().snapshot().checkpoint;

        let error = match result {
            Ok(()) => return,
            Err(e) => e,
        };

        if after > before {
            backoff.reset();
        }
        let delay: Duration = backoff.next_delay();
        tracing::warn!(
            error = %error,
            failures = backoff.failures(),
            delay_ms = delay.as_millis() as u64,
            "Head tracker stopped, restarting"
        );

        tokio::select! {
            biased;

            _ = shutdown_rx.recv() => return,
            _ = tokio::time::sleep(delay) => {}
        }
    }
}
