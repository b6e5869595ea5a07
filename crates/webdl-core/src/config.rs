use crate::retry::RetryPolicy;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Default copy buffer handed to libcurl, in KiB.
pub const DEFAULT_COPY_BUFFER_KIB: usize = 1024;

/// One download job, as handed over by the CLI layer.
/// Validated and normalized by `Downloader::new`; immutable afterwards.
#[derive(Debug, Clone)]
pub struct JobConfig {
    /// Source URL (required, non-empty).
    pub url: String,
    /// Number of concurrent range workers; values below 1 are coerced to 1.
    pub concurrency: usize,
    /// Output path; derived from the URL when absent.
    pub output: Option<PathBuf>,
    /// Copy buffer size in KiB.
    pub copy_buffer_kib: usize,
    /// Resume a previously paused job from its checkpoint files.
    pub resume: bool,
}

impl JobConfig {
    pub fn new(url: impl Into<String>) -> Self {
        JobConfig {
            url: url.into(),
            concurrency: 1,
            output: None,
            copy_buffer_kib: DEFAULT_COPY_BUFFER_KIB,
            resume: false,
        }
    }
}

/// Retry policy parameters (optional section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts per range (including the first).
    pub max_attempts: u32,
    /// Base delay in seconds for exponential backoff (e.g. 0.25 = 250ms).
    pub base_delay_secs: f64,
    /// Maximum backoff delay in seconds.
    pub max_delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay_secs: 0.25,
            max_delay_secs: 30,
        }
    }
}

impl RetryConfig {
    pub fn to_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts.max(1),
            base_delay: Duration::from_secs_f64(self.base_delay_secs.max(0.0)),
            max_delay: Duration::from_secs(self.max_delay_secs),
        }
    }
}

/// Persistent defaults loaded from `~/.config/webdl/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebdlConfig {
    /// Default concurrency when the CLI does not specify one.
    pub concurrency: usize,
    /// Default copy buffer size in KiB.
    pub copy_buffer_kib: usize,
    /// Optional retry policy; built-in defaults are used when missing.
    #[serde(default)]
    pub retry: Option<RetryConfig>,
}

impl Default for WebdlConfig {
    fn default() -> Self {
        Self {
            concurrency: 1,
            copy_buffer_kib: DEFAULT_COPY_BUFFER_KIB,
            retry: None,
        }
    }
}

impl WebdlConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
            .as_ref()
            .map(RetryConfig::to_policy)
            .unwrap_or_default()
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("webdl")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<WebdlConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = WebdlConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: WebdlConfig = toml::from_str(&data)?;
    Ok(cfg)
}
