//! # Progress Tracking and Statistics Module
//!
//! Progress bar e statistiche aggregate di una run.
//!
//! ## Responsabilità:
//! - Progress bar con `indicatif`; il totale cresce man mano che la discovery
//!   produce job, dato che la discovery è lazy
//! - Conteggio per esito (ottimizzati, non più piccoli, troppo piccoli,
//!   illeggibili, falliti, dry-run)
//! - Byte risparmiati e percentuale di riduzione complessiva
//! - Riepilogo finale su una riga
//!
//! ## Visual feedback:
//! ```text
//! ⠋ [00:02:15] [========================================] 150/150 (100%) [OK] photo.jpg: 45% saved
//! ```

use indicatif::{ProgressBar, ProgressStyle};
use std::collections::BTreeMap;
use std::time::Duration;

use crate::file_manager::format_size;
use crate::format::FormatKind;
use crate::outcome::{OptimizationOutcome, OutcomeKind};

/// Manages the progress bar for one run
#[derive(Clone)]
pub struct ProgressManager {
    bar: ProgressBar,
}

impl ProgressManager {
    /// Create a progress bar with an initial length
    pub fn new(total_files: u64) -> Self {
        let bar = ProgressBar::new(total_files);

        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-");
        bar.set_style(style);
        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar }
    }

    /// A manager that never draws
    pub fn hidden() -> Self {
        Self { bar: ProgressBar::hidden() }
    }

    /// One more job discovered
    pub fn add_pending(&self) {
        self.bar.inc_length(1);
    }

    /// Update progress with a message
    pub fn update(&self, message: &str) {
        self.bar.inc(1);
        self.bar.set_message(message.to_string());
    }

    /// Finish with a final message
    pub fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }
}

/// Statistics for one run
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct OptimizationStats {
    pub files_processed: usize,
    pub files_optimized: usize,
    pub files_not_smaller: usize,
    pub files_too_small: usize,
    pub files_unreadable: usize,
    pub files_would_optimize: usize,
    pub errors: usize,
    pub total_bytes_saved: u64,
    pub total_original_size: u64,
    /// Bytes saved per format label
    pub saved_by_format: BTreeMap<&'static str, u64>,
}

impl OptimizationStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, outcome: &OptimizationOutcome) {
        self.files_processed += 1;
        self.total_original_size += outcome.original_size;

        match outcome.kind {
            OutcomeKind::Optimized => {
                self.files_optimized += 1;
                let saved = outcome.bytes_saved();
                self.total_bytes_saved += saved;
                *self.saved_by_format.entry(outcome.format.label()).or_default() += saved;
            }
            OutcomeKind::SkippedNotSmaller => self.files_not_smaller += 1,
            OutcomeKind::SkippedTooSmall => self.files_too_small += 1,
            OutcomeKind::SkippedUnreadable => self.files_unreadable += 1,
            OutcomeKind::WouldOptimize => self.files_would_optimize += 1,
            OutcomeKind::Failed => self.errors += 1,
        }
    }

    pub fn files_skipped(&self) -> usize {
        self.files_not_smaller + self.files_too_small + self.files_unreadable
    }

    pub fn saved_for(&self, format: FormatKind) -> u64 {
        self.saved_by_format.get(format.label()).copied().unwrap_or(0)
    }

    pub fn overall_reduction_percent(&self) -> f64 {
        if self.total_original_size > 0 {
            (self.total_bytes_saved as f64 / self.total_original_size as f64) * 100.0
        } else {
            0.0
        }
    }

    pub fn format_summary(&self) -> String {
        let mut summary = format!(
            "Processed: {} files | Optimized: {} | Skipped: {} | Errors: {} | Total saved: {} ({:.2}%)",
            self.files_processed,
            self.files_optimized,
            self.files_skipped(),
            self.errors,
            format_size(self.total_bytes_saved),
            self.overall_reduction_percent()
        );
        if self.files_would_optimize > 0 {
            summary.push_str(&format!(" | Dry run candidates: {}", self.files_would_optimize));
        }
        summary
    }
}
