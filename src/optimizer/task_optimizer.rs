//! # Task Optimizer Module
//!
//! Worker per l'ottimizzazione di singoli file: gate per-job, poi la
//! strategia del formato. Nessun errore di un job risale al chiamante,
//! ogni problema diventa un esito `Failed` già registrato nel log.

use crate::{
    audit_log::LogEvent,
    config::MIN_FILE_SIZE,
    format::Job,
    outcome::{OptimizationOutcome, OutcomeKind},
    strategies::{apply, record_failure, JobContext, StrategyRegistry},
};
use std::sync::Arc;
use tokio::fs;
use tracing::{debug, warn};

/// Worker per elaborazione singoli file
#[derive(Clone)]
pub struct TaskOptimizer {
    ctx: Arc<JobContext>,
    registry: Arc<StrategyRegistry>,
}

impl TaskOptimizer {
    pub fn new(ctx: Arc<JobContext>) -> Self {
        let registry = Arc::new(StrategyRegistry::standard(&ctx.config));
        Self { ctx, registry }
    }

    /// Processa un singolo job
    pub async fn process(&self, job: Job) -> OptimizationOutcome {
        let Job { path, kind } = job;
        let log = &self.ctx.log;

        // Gate: regular file, readable, above the size threshold
        let metadata = fs::metadata(&path).await.ok().filter(|meta| meta.is_file());
        let readable = metadata.is_some() && fs::File::open(&path).await.is_ok();
        let size = match metadata {
            Some(meta) if readable => meta.len(),
            _ => {
                log.record(LogEvent::SkippingUnreadable { path: &path }).await;
                return OptimizationOutcome::new(&path, kind, OutcomeKind::SkippedUnreadable, 0);
            }
        };

        if size < MIN_FILE_SIZE {
            log.record(LogEvent::SkippingSmall { path: &path }).await;
            return OptimizationOutcome::new(&path, kind, OutcomeKind::SkippedTooSmall, size);
        }

        let Some(strategy) = self.registry.get(kind) else {
            warn!("No strategy registered for {}", kind);
            record_failure(log, kind.label(), &path).await;
            return OptimizationOutcome::new(&path, kind, OutcomeKind::Failed, size);
        };

        debug!("Processing {} as {}", path.display(), kind);
        match apply(strategy, &self.ctx, &path).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("Failed to optimize {}: {:#}", path.display(), e);
                record_failure(log, kind.label(), &path).await;
                OptimizationOutcome::new(&path, kind, OutcomeKind::Failed, size)
            }
        }
    }
}
