//! Single-stream HTTP GET fallback for servers without range support.
//!
//! Streams the body sequentially into the output file. Honors the cancel
//! token per chunk like a range worker, but leaves no checkpoint: this path
//! is not resumable.

use crate::control::CancelToken;
use crate::progress::Progress;
use crate::retry::RangeError;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const CURL_MAX_BUFFER: usize = 512 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SingleOutcome {
    /// Full body written; carries the byte count.
    Completed(u64),
    /// Cancel token observed; the partial output file cannot be resumed.
    Cancelled,
}

/// Downloads `url` with one plain GET into `output` (truncating it).
pub fn download_single(
    url: &str,
    output: &Path,
    cancel: &CancelToken,
    progress: &Progress,
    expected_len: Option<u64>,
    buffer_size: usize,
) -> Result<SingleOutcome, RangeError> {
    if cancel.is_cancelled() {
        return Ok(SingleOutcome::Cancelled);
    }

    let mut file = File::create(output).map_err(RangeError::Storage)?;

    let written = Arc::new(AtomicU64::new(0));
    let cancelled = Arc::new(AtomicBool::new(false));
    let storage_error: Arc<Mutex<Option<std::io::Error>>> = Arc::new(Mutex::new(None));

    let mut easy = curl::easy::Easy::new();
    easy.url(url).map_err(RangeError::Curl)?;
    easy.follow_location(true).map_err(RangeError::Curl)?;
    easy.max_redirections(10).map_err(RangeError::Curl)?;
    easy.connect_timeout(Duration::from_secs(30))
        .map_err(RangeError::Curl)?;
    easy.low_speed_limit(1024).map_err(RangeError::Curl)?;
    easy.low_speed_time(Duration::from_secs(60))
        .map_err(RangeError::Curl)?;
    easy.timeout(Duration::from_secs(3600))
        .map_err(RangeError::Curl)?;
    easy.buffer_size(buffer_size.clamp(1024, CURL_MAX_BUFFER))
        .map_err(RangeError::Curl)?;

    {
        let mut transfer = easy.transfer();
        let cancel = cancel.clone();
        let progress = progress.clone();
        let written_cb = Arc::clone(&written);
        let cancelled_cb = Arc::clone(&cancelled);
        let storage_error_cb = Arc::clone(&storage_error);
        transfer
            .write_function(move |data| {
                if cancel.is_cancelled() {
                    cancelled_cb.store(true, Ordering::Relaxed);
                    return Ok(0);
                }
                match file.write_all(data) {
                    Ok(()) => {
                        written_cb.fetch_add(data.len() as u64, Ordering::Relaxed);
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
                return Ok(SingleOutcome::Cancelled);
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

    let written = written.load(Ordering::Relaxed);
    if let Some(expected) = expected_len {
        if written != expected {
            return Err(RangeError::PartialTransfer {
                expected,
                received: written,
            });
        }
    }
    Ok(SingleOutcome::Completed(written))
}
