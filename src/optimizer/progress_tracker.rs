//! # Progress Tracking Module
//!
//! Tracker thread-safe condiviso dai worker: aggrega le statistiche e
//! aggiorna la progress bar a ogni job completato.

use crate::{
    outcome::{OptimizationOutcome, OutcomeKind},
    progress::{OptimizationStats, ProgressManager},
};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Progress e statistiche della run corrente
#[derive(Clone)]
pub struct ProgressTracker {
    stats: Arc<Mutex<OptimizationStats>>,
    progress_manager: ProgressManager,
}

impl ProgressTracker {
    /// Crea un nuovo tracker con progress bar visibile
    pub fn new() -> Self {
        Self::with_manager(ProgressManager::new(0))
    }

    /// Tracker senza output a terminale
    pub fn hidden() -> Self {
        Self::with_manager(ProgressManager::hidden())
    }

    fn with_manager(progress_manager: ProgressManager) -> Self {
        Self {
            stats: Arc::new(Mutex::new(OptimizationStats::new())),
            progress_manager,
        }
    }

    /// Nuovo job trovato dalla discovery
    pub fn discovered(&self) {
        self.progress_manager.add_pending();
    }

    /// Registra l'esito di un job
    pub async fn record(&self, outcome: &OptimizationOutcome) {
        self.stats.lock().await.record(outcome);

        let name = outcome
            .path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy();
        let message = match outcome.kind {
            OutcomeKind::Optimized => {
                format!("[OK] {}: {}% saved", name, outcome.saved_percent.unwrap_or(0))
            }
            OutcomeKind::SkippedNotSmaller => format!("[SKIP] {}: not smaller", name),
            OutcomeKind::SkippedTooSmall => format!("[SKIP] {}: too small", name),
            OutcomeKind::SkippedUnreadable => format!("[SKIP] {}: unreadable", name),
            OutcomeKind::WouldOptimize => format!("[DRY] {}", name),
            OutcomeKind::Failed => format!("[ERROR] {}: failed", name),
        };
        self.progress_manager.update(&message);
    }

    /// Finalizza progress bar
    pub fn finish(&self, summary: &str) {
        self.progress_manager.finish(summary);
    }

    /// Statistiche per il report finale
    pub async fn get_stats(&self) -> OptimizationStats {
        self.stats.lock().await.clone()
    }
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}
