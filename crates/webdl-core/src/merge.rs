//! Ordered merge of checkpoint files into the final output.

use crate::checkpoint;
use crate::error::DownloadError;
use crate::plan::Range;
use std::fs::{self, File};
use std::io;
use std::path::Path;

/// Concatenates all checkpoint files into `output` in strictly ascending
/// range order, deleting each one after its bytes are copied.
///
/// Every checkpoint length is verified against its range before any byte is
/// written, so a missing, short, or oversized checkpoint fails the merge with
/// the full checkpoint set still on disk for diagnosis.
pub fn merge_checkpoints(output: &Path, ranges: &[Range]) -> Result<(), DownloadError> {
    for range in ranges {
        let path = checkpoint::path_for(output, range.index);
        let found = checkpoint::len(&path)?;
        if found != range.len() {
            return Err(DownloadError::Merge {
                path,
                reason: format!("expected {} bytes, found {}", range.len(), found),
            });
        }
    }

    let mut dest = File::create(output)?;
    for range in ranges {
        let path = checkpoint::path_for(output, range.index);
        let mut source = File::open(&path)?;
        let copied = io::copy(&mut source, &mut dest)?;
        drop(source);
        if copied != range.len() {
            return Err(DownloadError::Merge {
                path,
                reason: format!("copied {} bytes, expected {}", copied, range.len()),
            });
        }
        fs::remove_file(&path)?;
    }
    dest.sync_all()?;

    tracing::debug!(
        output = %output.display(),
        ranges = ranges.len(),
        "merged checkpoints into final output"
    );
    Ok(())
}
