//! Capability probe: HTTP HEAD for size and range support.
//!
//! Uses the curl crate (libcurl) to fetch response headers and read
//! `Content-Length`, `Accept-Ranges: bytes`, and an optional
//! `Content-Disposition` filename hint.

mod parse;

use anyhow::{Context, Result};
use std::str;
use std::time::Duration;

/// Parsed metadata from the HEAD probe.
#[derive(Debug, Clone)]
pub struct ProbeResult {
    /// Total size in bytes, if `Content-Length` was present.
    pub content_length: Option<u64>,
    /// True if the server sent `Accept-Ranges: bytes`.
    pub accept_ranges: bool,
    /// `Content-Disposition` value if present (filename hint).
    pub content_disposition: Option<String>,
}

impl ProbeResult {
    /// A range plan needs both an explicit range indicator and a known size.
    pub fn supports_ranges(&self) -> bool {
        self.accept_ranges && self.content_length.is_some()
    }
}

/// Performs a HEAD request and returns parsed metadata. Follows redirects.
/// Blocking; runs on the caller's thread.
pub fn probe(url: &str) -> Result<ProbeResult> {
    let mut headers: Vec<String> = Vec::new();

    let mut easy = curl::easy::Easy::new();
    easy.url(url).context("invalid URL")?;
    easy.nobody(true)?; // HEAD request
    easy.follow_location(true)?;
    easy.max_redirections(10)?;
    easy.connect_timeout(Duration::from_secs(15))?;
    easy.timeout(Duration::from_secs(30))?;

    {
        let mut transfer = easy.transfer();
        transfer.header_function(|data| {
            if let Ok(s) = str::from_utf8(data) {
                headers.push(s.trim_end().to_string());
            }
            true
        })?;
        transfer.perform().context("HEAD request failed")?;
    }

    let code = easy.response_code().context("no response code")?;
    if !(200..300).contains(&code) {
        anyhow::bail!("HEAD {} returned HTTP {}", url, code);
    }

    Ok(parse::parse_headers(&headers))
}
