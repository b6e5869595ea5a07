//! Checkpoint files: one append-only `.part<N>` file per range.
//!
//! Each checkpoint is exclusively owned and written by a single worker, so no
//! locking is needed around it. Checkpoints survive a pause and are removed
//! only by the merger once their bytes are in the final output.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

/// Checkpoint path for a range: `<output>.part<N>` with `N = index + 1`.
pub fn path_for(output: &Path, index: usize) -> PathBuf {
    let mut os = output.as_os_str().to_owned();
    os.push(format!(".part{}", index + 1));
    PathBuf::from(os)
}

/// Bytes already present in a checkpoint file; 0 when it does not exist.
pub fn len(path: &Path) -> io::Result<u64> {
    match std::fs::metadata(path) {
        Ok(meta) => Ok(meta.len()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(0),
        Err(e) => Err(e),
    }
}

/// Opens a checkpoint for appending, creating it if needed.
pub fn open_append(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}
