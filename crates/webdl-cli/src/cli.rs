//! CLI for webdl: argument parsing, signal wiring, progress rendering.
//!
//! The engine knows nothing about signals or terminals. This layer translates
//! Ctrl-C into `Downloader::pause()` and renders the engine's progress
//! snapshots; everything else is the engine's job.

use anyhow::Result;
use clap::Parser;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use webdl_core::config::{self, JobConfig};
use webdl_core::control::JobState;
use webdl_core::engine::Downloader;

/// Concurrent HTTP downloader with checkpointed pause/resume.
#[derive(Debug, Parser)]
#[command(name = "webdl")]
#[command(about = "Concurrent HTTP downloader with checkpointed pause/resume", long_about = None)]
pub struct Cli {
    /// Direct HTTP/HTTPS URL to download.
    pub url: String,

    /// Concurrency level (number of range workers).
    #[arg(short = 'n', long, value_name = "N")]
    pub concurrency: Option<usize>,

    /// Output file name (defaults to the URL's basename).
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Copy buffer size in KiB.
    #[arg(long, value_name = "KIB")]
    pub buffer: Option<usize>,

    /// Resume a previously paused download.
    #[arg(long)]
    pub resume: bool,
}

impl Cli {
    /// Merge CLI flags with the config-file defaults into a job.
    fn to_job(&self, defaults: &config::WebdlConfig) -> JobConfig {
        let mut job = JobConfig::new(self.url.clone());
        job.concurrency = self.concurrency.unwrap_or(defaults.concurrency);
        job.copy_buffer_kib = self.buffer.unwrap_or(defaults.copy_buffer_kib);
        job.output = self.output.clone();
        job.resume = self.resume;
        job
    }
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();
    let defaults = config::load_or_init()?;
    tracing::debug!("loaded defaults: {:?}", defaults);

    let engine = Arc::new(Downloader::new(
        cli.to_job(&defaults),
        defaults.retry_policy(),
    )?);

    // Ctrl-C pauses the job; workers stop at their next chunk boundary.
    let pause_engine = Arc::clone(&engine);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\ninterrupt received, pausing ...");
            pause_engine.pause();
        }
    });

    let renderer = tokio::spawn(render_progress(Arc::clone(&engine)));

    let run_engine = Arc::clone(&engine);
    let outcome = tokio::task::spawn_blocking(move || run_engine.start()).await?;
    let _ = renderer.await;

    let state = outcome?;
    match state {
        JobState::Completed => match engine.output_path() {
            Some(path) => println!("Download completed: {}", path.display()),
            None => println!("Download completed."),
        },
        JobState::Paused => {
            println!("{}", pause_message(engine.used_single_stream()));
        }
        other => tracing::debug!(?other, "engine finished in unexpected state"),
    }
    Ok(())
}

/// A single-stream job leaves no checkpoint files behind, so suggesting
/// `--resume` would send the user into a `ResumeUnsupported` error.
fn pause_message(single_stream: bool) -> &'static str {
    if single_stream {
        "Download paused. The server does not support ranges; run again to restart from scratch."
    } else {
        "Download paused. Run again with --resume to continue."
    }
}

const RENDER_INTERVAL_MS: u64 = 500;

/// Polls the engine snapshot and redraws a single status line until the job
/// leaves the running state.
async fn render_progress(engine: Arc<Downloader>) {
    let mut ticker = tokio::time::interval(Duration::from_millis(RENDER_INTERVAL_MS));
    let mut drew_anything = false;
    loop {
        ticker.tick().await;
        match engine.state() {
            JobState::Idle | JobState::Running => {}
            _ => break,
        }
        if let Some(stats) = engine.progress() {
            let done_mib = stats.bytes_done as f64 / 1_048_576.0;
            let total_mib = stats.total_bytes as f64 / 1_048_576.0;
            let pct = stats.fraction() * 100.0;
            let rate_mib = stats.bytes_per_sec() / 1_048_576.0;
            let eta = stats
                .eta_secs()
                .map(|s| format!("{:.0}s", s))
                .unwrap_or_else(|| "?".to_string());
            print!(
                "\r  {:.1} / {:.1} MiB ({:.1}%)  {:.2} MiB/s  ETA {}  ",
                done_mib, total_mib, pct, rate_mib, eta
            );
            let _ = std::io::stdout().flush();
            drew_anything = true;
        }
    }
    if drew_anything {
        println!();
    }
}
