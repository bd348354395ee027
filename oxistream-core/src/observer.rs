//! Byte-count hooks for stream adapters.
//!
//! Each adapter owns its own observer, so several adapters can run side by
//! side without sharing any global counter. The default [`NoopObserver`] does
//! nothing.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Running totals for one adapter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamTotals {
    /// Bytes handed to the engine (plain bytes when encoding, compressed when decoding).
    pub bytes_in: u64,
    /// Bytes the engine produced.
    pub bytes_out: u64,
}

impl StreamTotals {
    /// Output size relative to input size, or `None` before any input.
    pub fn ratio(&self) -> Option<f64> {
        if self.bytes_in == 0 {
            None
        } else {
            Some(self.bytes_out as f64 / self.bytes_in as f64)
        }
    }
}

/// Receives progress notifications from an adapter.
///
/// All methods default to no-ops.
pub trait StreamObserver {
    /// `count` bytes entered the adapter.
    fn on_consumed(&mut self, count: u64) {
        let _ = count;
    }

    /// `count` bytes left the adapter.
    fn on_produced(&mut self, count: u64) {
        let _ = count;
    }

    /// The stream reached its end.
    fn on_finished(&mut self, totals: StreamTotals) {
        let _ = totals;
    }
}

/// Observer that ignores every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl StreamObserver for NoopObserver {}

/// Thread-safe counters that can be shared with whoever wants to read them.
///
/// Clones share the same counters.
#[derive(Debug, Clone, Default)]
pub struct StreamCounters {
    inner: Arc<CounterCells>,
}

#[derive(Debug, Default)]
struct CounterCells {
    consumed: AtomicU64,
    produced: AtomicU64,
    finished: AtomicU64,
}

impl StreamCounters {
    /// Create zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes consumed so far.
    pub fn consumed(&self) -> u64 {
        self.inner.consumed.load(Ordering::Relaxed)
    }

    /// Bytes produced so far.
    pub fn produced(&self) -> u64 {
        self.inner.produced.load(Ordering::Relaxed)
    }

    /// Number of streams that reported completion.
    pub fn finished(&self) -> u64 {
        self.inner.finished.load(Ordering::Relaxed)
    }
}

impl StreamObserver for StreamCounters {
    fn on_consumed(&mut self, count: u64) {
        self.inner.consumed.fetch_add(count, Ordering::Relaxed);
    }

    fn on_produced(&mut self, count: u64) {
        self.inner.produced.fetch_add(count, Ordering::Relaxed);
    }

    fn on_finished(&mut self, _totals: StreamTotals) {
        self.inner.finished.fetch_add(1, Ordering::Relaxed);
    }
}
