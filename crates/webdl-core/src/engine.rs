//! Engine controller: job lifecycle, worker fan-out, pause/resume.
//!
//! One `Downloader` manages exactly one logical download. The lifecycle is
//! `Idle -> Running -> {Completed, Paused, Failed}`, with `Paused -> Running`
//! via `resume`. Pause is cooperative: the shared cancel token is observed by
//! every worker at its next chunk boundary, checkpoints stay on disk, and the
//! merge is skipped.

use crate::checkpoint;
use crate::config::JobConfig;
use crate::control::{CancelToken, JobState};
use crate::error::DownloadError;
use crate::merge;
use crate::plan::{plan_ranges, Range};
use crate::probe;
use crate::progress::{Progress, ProgressSnapshot};
use crate::retry::{run_with_retry, RangeError, RetryPolicy};
use crate::single::{download_single, SingleOutcome};
use crate::url_model;
use crate::worker::{download_range, RangeOutcome};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Mutex};

/// Controller for one download job. Safe to share behind an `Arc`: `pause`
/// may be called from another thread while `start` is blocked on workers.
#[derive(Debug)]
pub struct Downloader {
    url: String,
    concurrency: usize,
    buffer_bytes: usize,
    configured_output: Option<PathBuf>,
    resume: AtomicBool,
    used_single_stream: AtomicBool,
    retry: RetryPolicy,
    cancel: CancelToken,
    state: Mutex<JobState>,
    resolved_output: Mutex<Option<PathBuf>>,
    progress: Mutex<Option<Progress>>,
}

impl Downloader {
    /// Validates and normalizes the job. Rejects an empty URL; coerces
    /// concurrency below 1 to 1 (reported, not silent).
    pub fn new(config: JobConfig, retry: RetryPolicy) -> Result<Self, DownloadError> {
        if config.url.trim().is_empty() {
            return Err(DownloadError::Config("url is empty".to_string()));
        }
        let concurrency = if config.concurrency < 1 {
            tracing::warn!("concurrency below 1 requested, using 1");
            1
        } else {
            config.concurrency
        };
        let buffer_kib = if config.copy_buffer_kib == 0 {
            crate::config::DEFAULT_COPY_BUFFER_KIB
        } else {
            config.copy_buffer_kib
        };

        Ok(Downloader {
            url: config.url,
            concurrency,
            buffer_bytes: buffer_kib * 1024,
            configured_output: config.output,
            resume: AtomicBool::new(config.resume),
            used_single_stream: AtomicBool::new(false),
            retry,
            cancel: CancelToken::new(),
            state: Mutex::new(JobState::Idle),
            resolved_output: Mutex::new(None),
            progress: Mutex::new(None),
        })
    }

    /// Runs the job to a terminal-or-paused state. Blocks until all workers
    /// have joined (and the merge finished, when it applies).
    pub fn start(&self) -> Result<JobState, DownloadError> {
        {
            let mut state = self.state.lock().unwrap();
            match *state {
                JobState::Running => {
                    return Err(DownloadError::Config("job is already running".to_string()))
                }
                JobState::Completed => {
                    return Err(DownloadError::Config("job already completed".to_string()))
                }
                // Failed is terminal in-process; a new invocation with
                // --resume picks the checkpoints back up.
                JobState::Failed => {
                    return Err(DownloadError::Config("job already failed".to_string()))
                }
                _ => *state = JobState::Running,
            }
        }
        self.cancel.reset();

        match self.run() {
            Ok(state) => {
                *self.state.lock().unwrap() = state;
                Ok(state)
            }
            Err(e) => {
                *self.state.lock().unwrap() = JobState::Failed;
                Err(e)
            }
        }
    }

    /// Requests a pause. Workers observe the token before their next chunk
    /// read and exit normally, leaving their checkpoint files for resume.
    pub fn pause(&self) {
        tracing::info!("pause requested");
        self.cancel.cancel();
        let mut state = self.state.lock().unwrap();
        if *state == JobState::Running {
            *state = JobState::Paused;
        }
    }

    /// Clears the paused state and re-runs the planning path; workers pick up
    /// from their checkpoint files' current lengths.
    pub fn resume(&self) -> Result<JobState, DownloadError> {
        self.resume.store(true, Ordering::Relaxed);
        self.start()
    }

    pub fn state(&self) -> JobState {
        *self.state.lock().unwrap()
    }

    /// Progress snapshot, once the probe has established the expected size.
    pub fn progress(&self) -> Option<ProgressSnapshot> {
        self.progress.lock().unwrap().as_ref().map(Progress::snapshot)
    }

    /// Output path, once resolved (after `start` has probed).
    pub fn output_path(&self) -> Option<PathBuf> {
        self.resolved_output.lock().unwrap().clone()
    }

    /// True once the job has gone through the single-stream fallback, which
    /// leaves no checkpoint files: a pause on that path cannot be resumed.
    pub fn used_single_stream(&self) -> bool {
        self.used_single_stream.load(Ordering::Relaxed)
    }

    fn is_resume(&self) -> bool {
        self.resume.load(Ordering::Relaxed)
    }

    fn run(&self) -> Result<JobState, DownloadError> {
        let head = probe::probe(&self.url).map_err(|e| DownloadError::Network(format!("{e:#}")))?;

        // Contract check before any disk work: resuming needs range support.
        if self.is_resume() && !head.supports_ranges() {
            return Err(DownloadError::ResumeUnsupported);
        }

        let output = self.resolve_output(head.content_disposition.as_deref())?;
        tracing::info!(
            url = %self.url,
            output = %output.display(),
            rangeable = head.supports_ranges(),
            size = head.content_length,
            "starting download"
        );

        if head.supports_ranges() {
            let total = head.content_length.unwrap_or(0);
            self.run_ranged(&output, total)
        } else {
            self.run_single(&output, head.content_length)
        }
    }

    /// Resolves the output path once per downloader. A non-resume job whose
    /// target exists gets a `name(k).ext` sibling; the rename is reported.
    fn resolve_output(&self, content_disposition: Option<&str>) -> Result<PathBuf, DownloadError> {
        let mut resolved = self.resolved_output.lock().unwrap();
        if let Some(path) = resolved.as_ref() {
            return Ok(path.clone());
        }

        let configured = match &self.configured_output {
            Some(path) => path.clone(),
            None => PathBuf::from(url_model::derive_filename(&self.url, content_disposition)),
        };

        let path = if self.is_resume() {
            configured
        } else {
            let chosen = url_model::next_available_path(&configured);
            if chosen != configured {
                tracing::info!(
                    requested = %configured.display(),
                    chosen = %chosen.display(),
                    "output file already exists, renamed"
                );
                println!("File {} already exists, saving as {}", configured.display(), chosen.display());
            }
            chosen
        };

        *resolved = Some(path.clone());
        Ok(path)
    }

    fn run_ranged(&self, output: &Path, total: u64) -> Result<JobState, DownloadError> {
        let ranges = plan_ranges(total, self.concurrency);
        if ranges.is_empty() {
            // Zero-length resource: nothing to partition, just produce the
            // (empty) output file.
            return self.run_single(output, Some(0));
        }

        prepare_checkpoints(output, &ranges, self.is_resume())?;

        // Seed the counter with bytes carried over from previous runs so the
        // snapshot reflects overall completion, as a resumed job should.
        let carried: u64 = {
            let mut sum = 0u64;
            for range in &ranges {
                let len = checkpoint::len(&checkpoint::path_for(output, range.index))?;
                sum += len.min(range.len());
            }
            sum
        };
        let progress = Progress::new(total);
        progress.add(carried);
        *self.progress.lock().unwrap() = Some(progress.clone());

        let (tx, rx) = mpsc::channel();
        let mut handles = Vec::with_capacity(ranges.len());
        for range in &ranges {
            let tx = tx.clone();
            let url = self.url.clone();
            let range = *range;
            let path = checkpoint::path_for(output, range.index);
            let cancel = self.cancel.clone();
            let progress = progress.clone();
            let policy = self.retry;
            let buffer = self.buffer_bytes;
            handles.push(std::thread::spawn(move || {
                let res = run_with_retry(&policy, || {
                    download_range(&url, &range, &path, &cancel, &progress, buffer)
                });
                let _ = tx.send((range.index, res));
            }));
        }
        drop(tx);

        let total_ranges = ranges.len();
        let mut failed = 0usize;
        let mut first_error: Option<String> = None;
        for (index, res) in rx.iter() {
            match res {
                Ok(RangeOutcome::Completed) => {
                    tracing::debug!(range = index, "range complete");
                }
                Ok(RangeOutcome::AlreadySatisfied) => {
                    tracing::debug!(range = index, "range already satisfied");
                }
                Ok(RangeOutcome::Cancelled) => {
                    tracing::debug!(range = index, "range cancelled");
                }
                Err(e) => {
                    tracing::warn!(range = index, error = %e, "range failed");
                    failed += 1;
                    if first_error.is_none() {
                        first_error = Some(format!("range {}: {}", index, e));
                    }
                }
            }
        }
        for handle in handles {
            let _ = handle.join();
        }

        if self.cancel.is_cancelled() {
            tracing::info!("download paused; checkpoint files kept for resume");
            return Ok(JobState::Paused);
        }
        if failed > 0 {
            // Checkpoints stay on disk; the job can be retried with --resume.
            return Err(DownloadError::WorkersFailed {
                failed,
                total: total_ranges,
                first: first_error.unwrap_or_default(),
            });
        }

        merge::merge_checkpoints(output, &ranges)?;
        Ok(JobState::Completed)
    }

    fn run_single(&self, output: &Path, expected: Option<u64>) -> Result<JobState, DownloadError> {
        self.used_single_stream.store(true, Ordering::Relaxed);
        let progress = Progress::new(expected.unwrap_or(0));
        *self.progress.lock().unwrap() = Some(progress.clone());

        match download_single(
            &self.url,
            output,
            &self.cancel,
            &progress,
            expected,
            self.buffer_bytes,
        ) {
            Ok(SingleOutcome::Completed(written)) => {
                tracing::info!(bytes = written, "single-stream download complete");
                Ok(JobState::Completed)
            }
            Ok(SingleOutcome::Cancelled) => {
                // No checkpoint exists for this path; a later resume attempt
                // fails the range-support contract check instead.
                tracing::info!("single-stream download paused; not resumable");
                Ok(JobState::Paused)
            }
            Err(RangeError::Storage(e)) => Err(DownloadError::Filesystem(e)),
            Err(e) => Err(DownloadError::Network(e.to_string())),
        }
    }
}

/// Pre-flight for the checkpoint set.
///
/// Fresh (non-resume) runs remove any stale `.part` files so appends start
/// from zero. Resume runs instead validate that the on-disk layout matches
/// the plan: a checkpoint beyond the plan means the original run used a
/// different concurrency, and an oversized checkpoint cannot belong to its
/// range; both are rejected before any worker starts.
fn prepare_checkpoints(
    output: &Path,
    ranges: &[Range],
    resume: bool,
) -> Result<(), DownloadError> {
    if !resume {
        // Scan the directory rather than probing indices: leftovers from an
        // abandoned higher-concurrency run need not be contiguous (.part6
        // can exist without .part5) and every one of them must go.
        let dir = match output.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let file_name = match output.file_name() {
            Some(name) => name.to_string_lossy().into_owned(),
            None => return Ok(()),
        };
        let prefix = format!("{}.part", file_name);
        for entry in std::fs::read_dir(&dir)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if let Some(suffix) = name.strip_prefix(&prefix) {
                if suffix.parse::<u32>().is_ok() {
                    tracing::debug!(path = %entry.path().display(), "removing stale checkpoint");
                    std::fs::remove_file(entry.path())?;
                }
            }
        }
        return Ok(());
    }

    let stray = checkpoint::path_for(output, ranges.len());
    if stray.exists() {
        return Err(DownloadError::ResumeMismatch(format!(
            "{} does not belong to a {}-range plan; resume with the original concurrency",
            stray.display(),
            ranges.len()
        )));
    }
    for range in ranges {
        let path = checkpoint::path_for(output, range.index);
        let len = checkpoint::len(&path)?;
        if len > range.len() {
            return Err(DownloadError::ResumeMismatch(format!(
                "{} holds {} bytes but its range is only {}; was the job started with a different concurrency?",
                path.display(),
                len,
                range.len()
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn job(url: &str) -> JobConfig {
        JobConfig::new(url)
    }

    #[test]
    fn empty_url_rejected() {
        let err = Downloader::new(job(""), RetryPolicy::default()).unwrap_err();
        assert!(matches!(err, DownloadError::Config(_)));
        let err = Downloader::new(job("   "), RetryPolicy::default()).unwrap_err();
        assert!(matches!(err, DownloadError::Config(_)));
    }

    #[test]
    fn concurrency_coerced_to_one() {
        let mut cfg = job("https://example.com/f.bin");
        cfg.concurrency = 0;
        let dl = Downloader::new(cfg, RetryPolicy::default()).unwrap();
        assert_eq!(dl.concurrency, 1);
    }

    #[test]
    fn initial_state_is_idle() {
        let dl = Downloader::new(job("https://example.com/f.bin"), RetryPolicy::default()).unwrap();
        assert_eq!(dl.state(), JobState::Idle);
        assert!(dl.progress().is_none());
        assert!(dl.output_path().is_none());
    }

    #[test]
    fn pause_only_marks_running_jobs() {
        let dl = Downloader::new(job("https://example.com/f.bin"), RetryPolicy::default()).unwrap();
        dl.pause();
        assert_eq!(dl.state(), JobState::Idle);
        assert!(dl.cancel.is_cancelled());
    }

    #[test]
    fn fresh_run_removes_stale_checkpoints() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.bin");
        let ranges = plan_ranges(1000, 2);
        // Leftovers from an earlier 4-way run.
        for i in 0..4 {
            fs::write(checkpoint::path_for(&output, i), b"stale").unwrap();
        }

        prepare_checkpoints(&output, &ranges, false).unwrap();
        for i in 0..4 {
            assert!(!checkpoint::path_for(&output, i).exists());
        }
    }

    #[test]
    fn fresh_run_removes_non_contiguous_leftovers() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.bin");
        let ranges = plan_ranges(1000, 2);
        // .part6 without .part5: an 8-way run that only some workers reached.
        fs::write(checkpoint::path_for(&output, 1), b"stale").unwrap();
        fs::write(checkpoint::path_for(&output, 5), b"stale").unwrap();
        // Unrelated siblings must survive the sweep.
        let unrelated = dir.path().join("other.bin.part1");
        fs::write(&unrelated, b"keep").unwrap();
        let no_index = dir.path().join("out.bin.partial");
        fs::write(&no_index, b"keep").unwrap();

        prepare_checkpoints(&output, &ranges, false).unwrap();
        assert!(!checkpoint::path_for(&output, 1).exists());
        assert!(!checkpoint::path_for(&output, 5).exists());
        assert!(unrelated.exists());
        assert!(no_index.exists());
    }

    #[test]
    fn resume_rejects_extra_checkpoint() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.bin");
        let ranges = plan_ranges(1000, 2);
        fs::write(checkpoint::path_for(&output, 0), vec![0u8; 100]).unwrap();
        fs::write(checkpoint::path_for(&output, 2), vec![0u8; 100]).unwrap(); // .part3

        let err = prepare_checkpoints(&output, &ranges, true).unwrap_err();
        assert!(matches!(err, DownloadError::ResumeMismatch(_)));
    }

    #[test]
    fn resume_rejects_oversized_checkpoint() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.bin");
        let ranges = plan_ranges(1000, 4); // 250 bytes each
        fs::write(checkpoint::path_for(&output, 1), vec![0u8; 400]).unwrap();

        let err = prepare_checkpoints(&output, &ranges, true).unwrap_err();
        assert!(matches!(err, DownloadError::ResumeMismatch(_)));
    }

    #[test]
    fn resume_accepts_partial_layout() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.bin");
        let ranges = plan_ranges(1000, 4);
        // The paused shape from the planning scenario: 250, 250, 100, absent.
        fs::write(checkpoint::path_for(&output, 0), vec![0u8; 250]).unwrap();
        fs::write(checkpoint::path_for(&output, 1), vec![0u8; 250]).unwrap();
        fs::write(checkpoint::path_for(&output, 2), vec![0u8; 100]).unwrap();

        prepare_checkpoints(&output, &ranges, true).unwrap();
    }
}
