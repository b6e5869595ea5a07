//! Range transfer error type for retry classification.

use std::fmt;

/// Error from a single range (or single-stream) transfer. Kept as a concrete
/// enum so callers can classify it and decide retries before converting to
/// the job-level error.
#[derive(Debug)]
pub enum RangeError {
    /// Curl reported an error (timeout, connection, etc.).
    Curl(curl::Error),
    /// HTTP response had a non-2xx status.
    Http(u32),
    /// The stream ended before the requested span was fully received.
    /// Retrying re-reads the checkpoint length and requests only the rest.
    PartialTransfer { expected: u64, received: u64 },
    /// Checkpoint/output write failed (disk full, permissions). Not retried.
    Storage(std::io::Error),
}

impl fmt::Display for RangeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RangeError::Curl(e) => write!(f, "{}", e),
            RangeError::Http(code) => write!(f, "HTTP {}", code),
            RangeError::PartialTransfer { expected, received } => {
                write!(
                    f,
                    "partial transfer: expected {} bytes, got {}",
                    expected, received
                )
            }
            RangeError::Storage(e) => write!(f, "storage: {}", e),
        }
    }
}

impl std::error::Error for RangeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RangeError::Curl(e) => Some(e),
            RangeError::Storage(e) => Some(e),
            RangeError::Http(_) | RangeError::PartialTransfer { .. } => None,
        }
    }
}
