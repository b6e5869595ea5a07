//! Range worker: one ranged GET appended to one checkpoint file.
//!
//! The worker re-reads its checkpoint length on every call, so a retry or a
//! resumed run automatically requests only the bytes that are still missing.

use crate::checkpoint;
use crate::control::CancelToken;
use crate::plan::Range;
use crate::progress::Progress;
use crate::retry::RangeError;
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// libcurl caps CURLOPT_BUFFERSIZE at 512 KiB.
const CURL_MAX_BUFFER: usize = 512 * 1024;

/// Typed worker exit, so the controller can tell a pause from a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeOutcome {
    /// The range is now fully present in its checkpoint file.
    Completed,
    /// The checkpoint already covered the range; no request was made.
    AlreadySatisfied,
    /// The cancel token was observed; the checkpoint is intact for resume.
    Cancelled,
}

/// Remaining request span `[from, to]` after `downloaded` checkpoint bytes,
/// or `None` when the checkpoint already covers the whole range.
pub fn effective_span(range: &Range, downloaded: u64) -> Option<(u64, u64)> {
    if downloaded >= range.len() {
        return None;
    }
    Some((range.start + downloaded, range.end))
}

/// Downloads the missing part of `range` into its checkpoint file, bumping
/// `progress` once per received chunk and checking `cancel` before each write.
pub fn download_range(
    url: &str,
    range: &Range,
    checkpoint_path: &Path,
    cancel: &CancelToken,
    progress: &Progress,
    buffer_size: usize,
) -> Result<RangeOutcome, RangeError> {
    if cancel.is_cancelled() {
        return Ok(RangeOutcome::Cancelled);
    }

    let downloaded = checkpoint::len(checkpoint_path).map_err(RangeError::Storage)?;
    let (from, to) = match effective_span(range, downloaded) {
        Some(span) => span,
        None => {
            tracing::debug!(range = range.index, "checkpoint already complete, skipping");
            return Ok(RangeOutcome::AlreadySatisfied);
        }
    };
    if downloaded > 0 {
        tracing::debug!(range = range.index, downloaded, "resuming from checkpoint");
    }

    let mut file = checkpoint::open_append(checkpoint_path).map_err(RangeError::Storage)?;

    let cancelled = Arc::new(AtomicBool::new(false));
    let storage_error: Arc<Mutex<Option<std::io::Error>>> = Arc::new(Mutex::new(None));

    let mut easy = curl::easy::Easy::new();
    easy.url(url).map_err(RangeError::Curl)?;
    easy.follow_location(true).map_err(RangeError::Curl)?;
    easy.max_redirections(10).map_err(RangeError::Curl)?;
    easy.connect_timeout(Duration::from_secs(30))
        .map_err(RangeError::Curl)?;
    // Low-speed abort instead of a tight wall clock: a large range on a slow
    // link may legitimately take a long time.
    easy.low_speed_limit(1024).map_err(RangeError::Curl)?;
    easy.low_speed_time(Duration::from_secs(60))
        .map_err(RangeError::Curl)?;
    easy.timeout(Duration::from_secs(3600))
        .map_err(RangeError::Curl)?;
    easy.buffer_size(buffer_size.clamp(1024, CURL_MAX_BUFFER))
        .map_err(RangeError::Curl)?;
    easy.range(&format!("{}-{}", from, to))
        .map_err(RangeError::Curl)?;

    {
        let mut transfer = easy.transfer();
        let cancel = cancel.clone();
        let progress = progress.clone();
        let cancelled_cb = Arc::clone(&cancelled);
        let storage_error_cb = Arc::clone(&storage_error);
        transfer
            .write_function(move |data| {
                if cancel.is_cancelled() {
                    cancelled_cb.store(true, Ordering::Relaxed);
                    return Ok(0); // aborts the transfer mid-stream
                }
                match file.write_all(data) {
                    Ok(()) => {
                        progress.add(data.len() as u64);
                        Ok(data.len())
                    }
                    Err(e) => {
                        let _ = storage_error_cb.lock().unwrap().replace(e);
                        Ok(0)
                    }
                }
            })
            .map_err(RangeError::Curl)?;
        if let Err(e) = transfer.perform() {
            if cancelled.load(Ordering::Relaxed) {
                return Ok(RangeOutcome::Cancelled);
            }
            if e.is_write_error() {
                if let Some(io_err) = storage_error.lock().unwrap().take() {
                    return Err(RangeError::Storage(io_err));
                }
            }
            return Err(RangeError::Curl(e));
        }
    }

    let code = easy.response_code().map_err(RangeError::Curl)?;
    if !(200..300).contains(&code) {
        return Err(RangeError::Http(code));
    }

    let received = checkpoint::len(checkpoint_path).map_err(RangeError::Storage)?;
    let expected = range.len();
    if received < expected {
        return Err(RangeError::PartialTransfer { expected, received });
    }
    Ok(RangeOutcome::Completed)
}
