//! Classify HTTP status, curl, and storage errors into retry error kinds.

use super::error::RangeError;
use super::policy::ErrorKind;

/// Classify an HTTP status code for retry decisions.
pub fn classify_http_status(code: u32) -> ErrorKind {
    match code {
        429 | 503 => ErrorKind::Throttled,
        500..=599 => ErrorKind::Http5xx(code as u16),
        _ => ErrorKind::Other,
    }
}

/// Classify a curl error for retry decisions.
pub fn classify_curl_error(e: &curl::Error) -> ErrorKind {
    if e.is_operation_timedout() {
        return ErrorKind::Timeout;
    }
    if e.is_couldnt_connect()
        || e.is_couldnt_resolve_host()
        || e.is_couldnt_resolve_proxy()
        || e.is_read_error()
        || e.is_recv_error()
        || e.is_send_error()
        || e.is_got_nothing()
        || e.is_partial_file()
    {
        return ErrorKind::Connection;
    }
    ErrorKind::Other
}

/// Classify a range transfer error into an ErrorKind.
pub fn classify(e: &RangeError) -> ErrorKind {
    match e {
        RangeError::Curl(ce) => classify_curl_error(ce),
        RangeError::Http(code) => classify_http_status(*code),
        RangeError::PartialTransfer { .. } => ErrorKind::ShortBody,
        // Disk errors do not improve with backoff.
        RangeError::Storage(_) => ErrorKind::Other,
    }
}
