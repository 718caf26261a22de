//! Per-job result, used for statistics and progress messages.

use std::path::{Path, PathBuf};

use crate::file_manager::percent_saved;
use crate::format::FormatKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeKind {
    Optimized,
    SkippedNotSmaller,
    SkippedTooSmall,
    SkippedUnreadable,
    Failed,
    WouldOptimize,
}

/// Result of processing one job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptimizationOutcome {
    pub path: PathBuf,
    pub format: FormatKind,
    pub kind: OutcomeKind,
    pub original_size: u64,
    pub new_size: Option<u64>,
    pub saved_percent: Option<u64>,
}

impl OptimizationOutcome {
    pub fn new(path: &Path, format: FormatKind, kind: OutcomeKind, original_size: u64) -> Self {
        Self {
            path: path.to_path_buf(),
            format,
            kind,
            original_size,
            new_size: None,
            saved_percent: None,
        }
    }

    pub fn optimized(path: &Path, format: FormatKind, original_size: u64, new_size: u64) -> Self {
        Self {
            new_size: Some(new_size),
            saved_percent: Some(percent_saved(original_size, new_size)),
            ..Self::new(path, format, OutcomeKind::Optimized, original_size)
        }
    }

    /// Account for later passes that shrank the file further
    pub fn with_final_size(mut self, final_size: u64) -> Self {
        if final_size < self.original_size {
            self.kind = OutcomeKind::Optimized;
            self.new_size = Some(final_size);
            self.saved_percent = Some(percent_saved(self.original_size, final_size));
        }
        self
    }

    pub fn bytes_saved(&self) -> u64 {
        self.new_size
            .map(|new| self.original_size.saturating_sub(new))
            .unwrap_or(0)
    }
}
