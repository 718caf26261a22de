//! # Media Optimizer Main Orchestrator
//!
//! Controller della pipeline: pre-flight, poi Discovery → WorkerPool, poi
//! riepilogo finale.
//!
//! ## Pre-flight (errori fatali, nessun job parte):
//! 1. Configurazione valida
//! 2. Directory sorgente esistente
//! 3. Tutti i tool esterni risolvibili
//! 4. Directory di backup creabile (se i backup sono attivi)
//! 5. Log di audit ruotato e aperto

use crate::{
    audit_log::{AuditLog, LogEvent},
    backup::BackupManager,
    config::Config,
    error::OptimizeError,
    file_manager::{format_size, Discovery},
    optimizer::{progress_tracker::ProgressTracker, task_optimizer::TaskOptimizer, worker_pool::WorkerPool},
    progress::OptimizationStats,
    strategies::JobContext,
    tool_resolver::ToolPathResolver,
    toolchain::Toolchain,
};
use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Orchestratore principale
pub struct MediaOptimizer {
    ctx: Arc<JobContext>,
    show_progress: bool,
}

impl MediaOptimizer {
    /// Crea l'ottimizzatore risolvendo i tool da `TOOLS_DIR` e `PATH`
    pub async fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let source = Self::check_source(&config.source_dir)?;
        let tools = Toolchain::resolve(&ToolPathResolver::new())?;
        Self::build(config, source, tools).await
    }

    /// Crea l'ottimizzatore con un toolchain già risolto
    pub async fn with_toolchain(config: Config, tools: Toolchain) -> Result<Self> {
        config.validate()?;
        let source = Self::check_source(&config.source_dir)?;
        Self::build(config, source, tools).await
    }

    /// Disattiva la progress bar (test, output non interattivo)
    pub fn without_progress(mut self) -> Self {
        self.show_progress = false;
        self
    }

    pub fn audit_log_path(&self) -> &Path {
        self.ctx.log.path()
    }

    fn check_source(source: &Path) -> Result<PathBuf, OptimizeError> {
        if !source.is_dir() {
            return Err(OptimizeError::MissingSource(source.to_path_buf()));
        }
        source
            .canonicalize()
            .map_err(|_| OptimizeError::MissingSource(source.to_path_buf()))
    }

    async fn build(mut config: Config, source: PathBuf, tools: Toolchain) -> Result<Self> {
        config.source_dir = source;
        let backups = BackupManager::prepare(&config).await?;
        let log = AuditLog::open(&config.log_file).await?;

        Ok(Self {
            ctx: Arc::new(JobContext { config, tools, log, backups }),
            show_progress: true,
        })
    }

    /// Esegue il processo di ottimizzazione
    pub async fn run(&self) -> Result<OptimizationStats> {
        let start_time = Instant::now();
        let config = &self.ctx.config;

        self.log_configuration();
        self.ctx
            .log
            .record(LogEvent::RunStarted {
                source: &config.source_dir,
                dry_run: config.dry_run,
                workers: config.workers,
            })
            .await;

        // Excluded in dry runs too, where the manager never creates the root
        let mut discovery = Discovery::new(&config.source_dir, config.recursive);
        if let Some(backup_root) = config.backup_root() {
            let backup_root = backup_root.canonicalize().unwrap_or_else(|_| backup_root.to_path_buf());
            discovery = discovery.exclude(&backup_root);
        }

        let tracker = if self.show_progress {
            ProgressTracker::new()
        } else {
            ProgressTracker::hidden()
        };

        let discovered = tracker.clone();
        let jobs = discovery.jobs()?.inspect(move |_| discovered.discovered());

        let task_optimizer = TaskOptimizer::new(Arc::clone(&self.ctx));
        let handler_tracker = tracker.clone();
        let outcomes = WorkerPool::new(config.workers)
            .run(jobs, move |job| {
                let task_optimizer = task_optimizer.clone();
                let tracker = handler_tracker.clone();
                async move {
                    let outcome = task_optimizer.process(job).await;
                    tracker.record(&outcome).await;
                    outcome
                }
            })
            .await?;
        debug!("{} outcomes collected", outcomes.len());

        let stats = tracker.get_stats().await;
        let summary = stats.format_summary();
        tracker.finish(&summary);
        self.print_final_stats(&stats, start_time.elapsed());
        self.ctx.log.record(LogEvent::RunSummary(&summary)).await;

        Ok(stats)
    }

    fn log_configuration(&self) {
        let config = &self.ctx.config;
        info!("🚀 Starting optimization in: {}", config.source_dir.display());
        info!("Workers: {}", config.workers);
        if !config.recursive {
            info!("Mode: top-level directory only");
        }
        match self.ctx.backups.backup_root() {
            Some(root) => info!("Backups: {}", root.display()),
            None => info!("Backups: disabled"),
        }
        if config.aggressive {
            info!(
                "Aggressive passes: max {}px, {} bit, {} DPI",
                config.max_dimension, config.max_bit_depth, config.max_dpi
            );
        }
        if config.dry_run {
            info!("Dry run mode: No files will be modified");
        }
        info!("Audit log: {}", self.ctx.log.path().display());
    }

    /// Stampa statistiche finali
    fn print_final_stats(&self, stats: &OptimizationStats, duration: Duration) {
        info!("=== Optimization Complete ===");
        info!("Files processed: {}", stats.files_processed);
        info!("Files optimized: {}", stats.files_optimized);
        info!(
            "Files skipped: {} (not smaller: {}, too small: {}, unreadable: {})",
            stats.files_skipped(),
            stats.files_not_smaller,
            stats.files_too_small,
            stats.files_unreadable
        );
        if self.ctx.config.dry_run {
            info!("Files that would be optimized: {}", stats.files_would_optimize);
        }
        info!("Errors: {}", stats.errors);
        info!("Bytes saved: {}", format_size(stats.total_bytes_saved));
        for (label, saved) in &stats.saved_by_format {
            info!("  • {}: {}", label, format_size(*saved));
        }
        info!("Average reduction: {:.2}%", stats.overall_reduction_percent());
        info!("Duration: {:.2}s", duration.as_secs_f64());
    }
}
