//! Cooperative cancellation and job lifecycle state.
//!
//! A `CancelToken` is cloned into every worker and checked once per chunk, so
//! a pause is observed at the next chunk boundary rather than preemptively.
//! Signal handling stays outside the engine: callers translate whatever they
//! like (Ctrl-C, an RPC, a test) into `Downloader::pause()`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared cancellation signal for one job.
#[derive(Clone, Default, Debug)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation; workers stop before their next chunk read.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    /// Clear the signal so a resumed run can start fresh.
    pub fn reset(&self) {
        self.flag.store(false, Ordering::Relaxed);
    }
}

/// Lifecycle of one download job.
///
/// `Idle -> Running -> {Completed, Paused, Failed}`; `Paused -> Running` via
/// resume. `Completed` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Idle,
    Running,
    Paused,
    Completed,
    Failed,
}
