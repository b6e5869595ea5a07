//! Error taxonomy for the download engine.
//!
//! Configuration and protocol-mismatch errors are raised before any network
//! or disk work; per-range transfer failures are aggregated into
//! `WorkersFailed` so a single bad range never takes the process down.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DownloadError {
    /// Invalid job configuration (e.g. empty URL). Rejected up front.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Probe or transfer-level network failure.
    #[error("network: {0}")]
    Network(String),

    /// Could not create, open, or stat the output or a checkpoint file.
    #[error("filesystem: {0}")]
    Filesystem(#[from] std::io::Error),

    /// Resume was requested but the server does not accept byte ranges.
    #[error("resume unsupported for this resource (no byte-range support); it must be downloaded again")]
    ResumeUnsupported,

    /// The checkpoint layout on disk does not match the configured job.
    #[error("cannot resume: {0}")]
    ResumeMismatch(String),

    /// A checkpoint file was missing, short, or oversized at merge time.
    #[error("merge failed for {}: {reason}", path.display())]
    Merge { path: PathBuf, reason: String },

    /// One or more range workers failed; checkpoints are left for a retry.
    #[error("{failed} of {total} range(s) failed; first error: {first}")]
    WorkersFailed {
        failed: usize,
        total: usize,
        first: String,
    },
}
