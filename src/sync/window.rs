//! Partitioning of height ranges into scan windows.

use serde::Serialize;

/// Default number of blocks per window.
pub const DEFAULT_WINDOW_SIZE: u64 = 5;

/// Inclusive range of block heights scanned as one retry-safe unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScanWindow {
    pub low: u64,
    pub high: u64,
}

impl ScanWindow {
    pub fn new(low: u64, high: u64) -> Option<Self> {
        (low <= high).then_some(Self { low, high })
    }

    /// Number of heights covered.
    pub fn heights(&self) -> u64 {
        self.high - self.low + 1
    }
}

/// Split `[from, to]` into consecutive windows of at most `size` heights,
/// in ascending order. Yields nothing when `from > to` or `size == 0`.
pub fn partition(from: u64, to: u64, size: u64) -> impl Iterator<Item = ScanWindow> {
    let first = if size == 0 {
        None
    } else {
        ScanWindow::new(from, from.saturating_add(size - 1).min(to))
    };

    std::iter::successors(first, move |prev| {
        if prev.high >= to {
            return None;
        }
        let low = prev.high + 1;
        ScanWindow::new(low, low.saturating_add(size - 1).min(to))
    })
}
