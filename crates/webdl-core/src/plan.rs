//! Range type and partition planning.

/// A contiguous byte range `[start, end]` (inclusive) assigned to one worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    /// Position of this range in the plan (0-based).
    pub index: usize,
    /// First byte offset (inclusive).
    pub start: u64,
    /// Last byte offset (inclusive).
    pub end: u64,
}

impl Range {
    /// Length of this range in bytes.
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    pub fn is_empty(&self) -> bool {
        self.end < self.start
    }
}

/// Partitions `[0, total_size)` into contiguous ranges, one per worker.
///
/// All ranges get `total_size / count` bytes except the last, which extends to
/// `total_size - 1` and absorbs the remainder. Adjacent ranges always satisfy
/// `ranges[i].end + 1 == ranges[i + 1].start`: no byte is skipped or fetched
/// twice. When `concurrency` exceeds `total_size` the plan is clamped to one
/// byte per range; an empty vec is returned for a zero-size resource.
pub fn plan_ranges(total_size: u64, concurrency: usize) -> Vec<Range> {
    if total_size == 0 || concurrency == 0 {
        return Vec::new();
    }

    let count = (concurrency as u64).min(total_size);
    let base = total_size / count;

    let mut out = Vec::with_capacity(count as usize);
    for i in 0..count {
        let start = i * base;
        let end = if i == count - 1 {
            total_size - 1
        } else {
            (i + 1) * base - 1
        };
        out.push(Range {
            index: i as usize,
            start,
            end,
        });
    }
    out
}
