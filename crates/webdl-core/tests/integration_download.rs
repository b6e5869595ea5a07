//! Integration tests: local HTTP server with Range support, multi-range
//! download, resume from checkpoint files, and the single-stream fallback.

mod common;

use tempfile::tempdir;
use webdl_core::checkpoint;
use webdl_core::config::JobConfig;
use webdl_core::control::JobState;
use webdl_core::engine::Downloader;
use webdl_core::error::DownloadError;
use webdl_core::retry::RetryPolicy;

fn sample_body(len: usize) -> Vec<u8> {
    (0u8..251).cycle().take(len).collect()
}

#[test]
fn multi_range_download_completes_and_file_matches() {
    let body = sample_body(64 * 1024);
    let url = common::range_server::start(body.clone());

    let dir = tempdir().unwrap();
    let output = dir.path().join("data.bin");

    let mut job = JobConfig::new(url);
    job.concurrency = 4;
    job.output = Some(output.clone());
    let engine = Downloader::new(job, RetryPolicy::default()).unwrap();

    let state = engine.start().expect("download should succeed");
    assert_eq!(state, JobState::Completed);
    assert_eq!(std::fs::read(&output).unwrap(), body);
    for index in 0..4 {
        assert!(
            !checkpoint::path_for(&output, index).exists(),
            "checkpoint {} should be gone after the merge",
            index
        );
    }
}

#[test]
fn resume_from_checkpoints_produces_identical_file() {
    let body = sample_body(1000);
    let url = common::range_server::start(body.clone());

    let dir = tempdir().unwrap();
    let output = dir.path().join("data.bin");

    // A paused 4-way job at 1000 bytes leaves 250-byte ranges behind: two
    // complete checkpoints, one cut off mid-range, one never started.
    std::fs::write(checkpoint::path_for(&output, 0), &body[0..250]).unwrap();
    std::fs::write(checkpoint::path_for(&output, 1), &body[250..500]).unwrap();
    std::fs::write(checkpoint::path_for(&output, 2), &body[500..600]).unwrap();

    let mut job = JobConfig::new(url);
    job.concurrency = 4;
    job.output = Some(output.clone());
    job.resume = true;
    let engine = Downloader::new(job, RetryPolicy::default()).unwrap();

    let state = engine.start().expect("resume should succeed");
    assert_eq!(state, JobState::Completed);
    assert_eq!(std::fs::read(&output).unwrap(), body);
    for index in 0..4 {
        assert!(!checkpoint::path_for(&output, index).exists());
    }
}

#[test]
fn no_range_server_falls_back_to_single_stream() {
    let body = sample_body(32 * 1024);
    let url = common::range_server::start_with_options(
        body.clone(),
        common::range_server::RangeServerOptions {
            support_ranges: false,
            advertise_ranges: false,
        },
    );

    let dir = tempdir().unwrap();
    let output = dir.path().join("data.bin");

    let mut job = JobConfig::new(url);
    job.concurrency = 4;
    job.output = Some(output.clone());
    let engine = Downloader::new(job, RetryPolicy::default()).unwrap();

    let state = engine.start().expect("fallback download should succeed");
    assert_eq!(state, JobState::Completed);
    assert!(engine.used_single_stream());
    assert_eq!(std::fs::read(&output).unwrap(), body);
    for index in 0..4 {
        assert!(
            !checkpoint::path_for(&output, index).exists(),
            "single-stream fallback must not create checkpoint files"
        );
    }
}

#[test]
fn resume_against_non_rangeable_server_is_rejected() {
    let body = sample_body(4096);
    let url = common::range_server::start_with_options(
        body,
        common::range_server::RangeServerOptions {
            support_ranges: false,
            advertise_ranges: false,
        },
    );

    let dir = tempdir().unwrap();
    let output = dir.path().join("data.bin");

    let mut job = JobConfig::new(url);
    job.concurrency = 4;
    job.output = Some(output.clone());
    job.resume = true;
    let engine = Downloader::new(job, RetryPolicy::default()).unwrap();

    let err = engine.start().expect_err("resume must be refused");
    assert!(matches!(err, DownloadError::ResumeUnsupported));
    // Rejected before any disk work: no output, no checkpoints.
    assert!(!output.exists());
    assert!(!checkpoint::path_for(&output, 0).exists());
}
