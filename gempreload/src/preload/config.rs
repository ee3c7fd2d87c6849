//! Run configuration and selection arithmetic.

use std::ops::Range;

/// Default number of concurrent probe workers.
pub const DEFAULT_WORKERS: usize = 20;

/// Settings for a single preload run.
///
/// Nothing is validated when values are set; out-of-range values simply
/// produce an empty selection when the run starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunConfig {
    /// Size of the probe worker pool. `1` probes sequentially in index
    /// order; `0` is treated as `1`.
    pub workers: usize,

    /// Number of leading index entries to pass over.
    pub skip: i64,

    /// Maximum number of entries to probe; `None` means no cap.
    pub limit: Option<i64>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            skip: 0,
            limit: None,
        }
    }
}

impl RunConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the worker pool size.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Set the number of entries to skip.
    pub fn with_skip(mut self, skip: i64) -> Self {
        self.skip = skip;
        self
    }

    /// Cap the number of entries to probe.
    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Remove any cap on the number of entries.
    pub fn without_limit(mut self) -> Self {
        self.limit = None;
        self
    }

    /// A non-positive limit disables the run before anything is fetched.
    pub fn is_disabled(&self) -> bool {
        matches!(self.limit, Some(limit) if limit <= 0)
    }

    /// Worker count actually used for the pool.
    pub fn effective_workers(&self) -> usize {
        self.workers.max(1)
    }

    /// Index positions to probe out of `total` entries.
    ///
    /// Returns `None` for an empty selection: a disabled run, a negative
    /// skip, or a skip at or past the end of the index. The end is clamped
    /// to `total`.
    pub fn selection(&self, total: usize) -> Option<Range<usize>> {
        if self.is_disabled() {
            return None;
        }

        let start = usize::try_from(self.skip).ok()?;
        if start >= total {
            return None;
        }

        let end = match self.limit {
            Some(limit) => start
                .saturating_add(usize::try_from(limit).ok()?)
                .min(total),
            None => total,
        };

        (start < end).then_some(start..end)
    }
}
