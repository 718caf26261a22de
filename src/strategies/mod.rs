//! # Format Strategies Module
//!
//! Una strategia per ogni formato supportato. Ogni strategia conosce solo la
//! propria trasformazione (tool esterno + argomenti); il contratto comune
//! (`apply`) gestisce dry-run, backup, SafeReplace e i pass aggressivi.
//!
//! ## Formati Supportati
//!
//! | Formato | Tool        | Trasformazione                                  |
//! |---------|-------------|-------------------------------------------------|
//! | JPEG    | jpegoptim   | lossy, quality ceiling, strip metadata          |
//! | PNG     | pngquant    | palette quantization, skip-if-larger            |
//! | TIFF    | convert     | split pagine → LZW grayscale 8 bit → merge      |
//! | PDF     | gs          | pdfwrite con preset `/ebook` o `/screen`        |
//! | GIF     | gifsicle    | ottimizzazione frame/palette `-O<level>`        |
//!
//! ## Contratto `apply`
//! 1. Misura la dimensione originale
//! 2. Dry-run → log "Would optimize" e nessuna modifica
//! 3. Backup (se abilitato), poi SafeReplace con la trasformazione del formato
//! 4. Formati raster con `aggressive` → resize, bit depth, DPI (vedi `aggressive`)

pub mod aggressive;
pub mod gif;
pub mod jpeg;
pub mod pdf;
pub mod png;
pub mod tiff;

use anyhow::Result;
use futures::future::BoxFuture;
use std::path::Path;
use tokio::fs;
use tracing::warn;

use crate::audit_log::{AuditLog, LogEvent};
use crate::backup::BackupManager;
use crate::config::{BackupFailurePolicy, Config};
use crate::format::FormatKind;
use crate::outcome::{OptimizationOutcome, OutcomeKind};
use crate::safe_replace::{safe_replace, ReplaceOutcome, TransformStatus};
use crate::toolchain::Toolchain;

pub use gif::GifStrategy;
pub use jpeg::JpegStrategy;
pub use pdf::PdfStrategy;
pub use png::PngStrategy;
pub use tiff::TiffStrategy;

/// Everything a worker needs to run a job
pub struct JobContext {
    pub config: Config,
    pub tools: Toolchain,
    pub log: AuditLog,
    pub backups: BackupManager,
}

/// Format-specific transformation: read `input`, write the result to `output`
pub trait FormatStrategy: Send + Sync {
    fn kind(&self) -> FormatKind;

    fn transform<'a>(
        &'a self,
        tools: &'a Toolchain,
        input: &'a Path,
        output: &'a Path,
    ) -> BoxFuture<'a, Result<TransformStatus>>;
}

/// One strategy per format kind
pub struct StrategyRegistry {
    strategies: Vec<Box<dyn FormatStrategy>>,
}

impl StrategyRegistry {
    pub fn standard(config: &Config) -> Self {
        Self {
            strategies: vec![
                Box::new(JpegStrategy::new(config.jpeg_quality)),
                Box::new(PngStrategy::new(config.png_quality_min, config.png_quality_max)),
                Box::new(TiffStrategy),
                Box::new(PdfStrategy::new(config.pdf_preset)),
                Box::new(GifStrategy::new(config.gif_level)),
            ],
        }
    }

    pub fn get(&self, kind: FormatKind) -> Option<&dyn FormatStrategy> {
        self.strategies
            .iter()
            .find(|strategy| strategy.kind() == kind)
            .map(|strategy| strategy.as_ref())
    }
}

/// Run the common strategy contract on one file
pub async fn apply(
    strategy: &dyn FormatStrategy,
    ctx: &JobContext,
    path: &Path,
) -> Result<OptimizationOutcome> {
    let kind = strategy.kind();
    let label = kind.label();
    let before = fs::metadata(path).await?.len();

    if ctx.config.dry_run {
        ctx.log.record(LogEvent::WouldOptimize { label, path }).await;
        return Ok(OptimizationOutcome::new(path, kind, OutcomeKind::WouldOptimize, before));
    }

    if let Err(e) = ctx.backups.backup(path, &ctx.log).await {
        match ctx.config.backup_failure {
            BackupFailurePolicy::AbortJob => {
                record_failure(&ctx.log, label, path).await;
                return Ok(OptimizationOutcome::new(path, kind, OutcomeKind::Failed, before));
            }
            BackupFailurePolicy::Continue => {
                warn!("Continuing without backup for {}: {:#}", path.display(), e);
            }
        }
    }

    let tools = &ctx.tools;
    let primary = safe_replace(path, label, &ctx.log, |scratch| async move {
        strategy.transform(tools, path, &scratch).await
    })
    .await?;

    let mut outcome = match primary {
        ReplaceOutcome::Replaced { before, after, .. } => {
            OptimizationOutcome::optimized(path, kind, before, after)
        }
        ReplaceOutcome::NotSmaller { before } => {
            OptimizationOutcome::new(path, kind, OutcomeKind::SkippedNotSmaller, before)
        }
        ReplaceOutcome::Failed { before } => {
            OptimizationOutcome::new(path, kind, OutcomeKind::Failed, before)
        }
    };

    if ctx.config.aggressive && kind.is_raster() && aggressive::run(ctx, kind, path).await {
        match fs::metadata(path).await {
            Ok(meta) => outcome = outcome.with_final_size(meta.len()),
            Err(e) => warn!("Cannot read final size of {}: {}", path.display(), e),
        }
    }

    Ok(outcome)
}

/// Log a per-job failure that happened outside SafeReplace
pub async fn record_failure(log: &AuditLog, label: &str, path: &Path) {
    log.record(LogEvent::Failed { label, path }).await;
}
