//! Shared progress accounting (bytes transferred vs expected).
//!
//! Purely observational: nothing in the engine reads progress for control
//! decisions. Consumers poll `snapshot` and render however they like.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Concurrency-safe byte counter fed by every range worker and by the
/// single-stream fallback. Cloning is cheap; all clones share one counter.
#[derive(Clone, Debug)]
pub struct Progress {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    total_bytes: u64,
    bytes_done: AtomicU64,
    started: Instant,
}

impl Progress {
    /// `total_bytes` of 0 means the expected size is unknown (plain GET with
    /// no Content-Length); snapshots are then left unclamped.
    pub fn new(total_bytes: u64) -> Self {
        Progress {
            inner: Arc::new(Inner {
                total_bytes,
                bytes_done: AtomicU64::new(0),
                started: Instant::now(),
            }),
        }
    }

    /// Record `n` more transferred bytes. Safe from any thread.
    pub fn add(&self, n: u64) {
        self.inner.bytes_done.fetch_add(n, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        let done = self.inner.bytes_done.load(Ordering::Relaxed);
        let total = self.inner.total_bytes;
        let bytes_done = if total == 0 { done } else { done.min(total) };
        ProgressSnapshot {
            bytes_done,
            total_bytes: total,
            elapsed_secs: self.inner.started.elapsed().as_secs_f64(),
        }
    }
}

/// Point-in-time view of a transfer, for external rendering.
#[derive(Debug, Clone)]
pub struct ProgressSnapshot {
    /// Bytes transferred so far (monotonically non-decreasing).
    pub bytes_done: u64,
    /// Expected total size; 0 when unknown.
    pub total_bytes: u64,
    /// Seconds since the transfer started.
    pub elapsed_secs: f64,
}

impl ProgressSnapshot {
    /// Transfer rate in bytes per second (0 if no time has elapsed).
    pub fn bytes_per_sec(&self) -> f64 {
        if self.elapsed_secs <= 0.0 {
            return 0.0;
        }
        self.bytes_done as f64 / self.elapsed_secs
    }

    /// Estimated seconds remaining (None if the rate is 0 or size unknown).
    pub fn eta_secs(&self) -> Option<f64> {
        if self.total_bytes == 0 {
            return None;
        }
        let remaining = self.total_bytes.saturating_sub(self.bytes_done);
        if remaining == 0 {
            return Some(0.0);
        }
        let rate = self.bytes_per_sec();
        if rate <= 0.0 {
            return None;
        }
        Some(remaining as f64 / rate)
    }

    /// Fraction complete in `[0.0, 1.0]` (1.0 when the size is unknown).
    pub fn fraction(&self) -> f64 {
        if self.total_bytes == 0 {
            return 1.0;
        }
        (self.bytes_done as f64 / self.total_bytes as f64).min(1.0)
    }
}
