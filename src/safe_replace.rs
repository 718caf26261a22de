//! # Safe Replace Module
//!
//! Primitiva compare-and-swap comune a tutte le strategie.
//!
//! ## Flusso:
//! 1. Crea un file scratch accanto all'originale (`.optimg-XXXX.<ext>`)
//! 2. Esegue la trasformazione scrivendo solo nello scratch
//! 3. Trasformazione fallita o output vuoto → log di fallimento, originale intatto
//! 4. Output più piccolo → rename atomico sopra l'originale
//! 5. Altrimenti → scratch scartato, log "not smaller"
//!
//! Lo scratch sta nella stessa directory dell'originale, quindi il rename è
//! atomico: sul path originale non è mai visibile uno stato parziale.

use anyhow::Result;
use std::future::Future;
use std::path::{Path, PathBuf};
use tempfile::TempPath;
use tokio::fs;
use tracing::{debug, warn};

use crate::audit_log::{AuditLog, LogEvent};
use crate::error::OptimizeError;
use crate::file_manager::percent_saved;

/// Name prefix of every scratch artifact created next to an original
pub const SCRATCH_PREFIX: &str = ".optimg-";

/// What a transformation reports back
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformStatus {
    /// Output written to the scratch path
    Produced,
    /// Tool refused to emit output because it could not shrink the file
    Declined,
}

/// Result of one SafeReplace step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplaceOutcome {
    Replaced { before: u64, after: u64, saved_percent: u64 },
    NotSmaller { before: u64 },
    Failed { before: u64 },
}

impl ReplaceOutcome {
    pub fn is_replaced(&self) -> bool {
        matches!(self, ReplaceOutcome::Replaced { .. })
    }
}

/// Allocate a scratch path in the same directory as `original`, keeping its extension
pub fn scratch_path_for(original: &Path) -> Result<TempPath> {
    let dir = original
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let suffix = original
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default();

    let file = tempfile::Builder::new()
        .prefix(SCRATCH_PREFIX)
        .suffix(&suffix)
        .tempfile_in(dir)?;
    Ok(file.into_temp_path())
}

/// Run `transform` into a scratch file and swap it in only if strictly smaller.
///
/// `label` is the format name used in log lines (`JPEG`, `PNG resize`, ...).
pub async fn safe_replace<F, Fut>(
    original: &Path,
    label: &str,
    log: &AuditLog,
    transform: F,
) -> Result<ReplaceOutcome>
where
    F: FnOnce(PathBuf) -> Fut,
    Fut: Future<Output = Result<TransformStatus>>,
{
    let metadata = fs::metadata(original).await?;
    let before = metadata.len();

    // Dropping the TempPath removes the scratch file on every non-accepting path
    let scratch = scratch_path_for(original)?;
    let status = transform(scratch.to_path_buf()).await;

    let after = match status {
        Err(e) => {
            warn!("{} transformation failed for {}: {:#}", label, original.display(), e);
            log.record(LogEvent::Failed { label, path: original }).await;
            return Ok(ReplaceOutcome::Failed { before });
        }
        Ok(TransformStatus::Declined) => {
            debug!("{} tool declined to write output for {}", label, original.display());
            log.record(LogEvent::NotSmaller { label, path: original }).await;
            return Ok(ReplaceOutcome::NotSmaller { before });
        }
        Ok(TransformStatus::Produced) => match fs::metadata(&*scratch).await {
            Ok(meta) if meta.len() > 0 => meta.len(),
            _ => {
                warn!("{} produced an empty or missing artifact for {}", label, original.display());
                log.record(LogEvent::Failed { label, path: original }).await;
                return Ok(ReplaceOutcome::Failed { before });
            }
        },
    };

    if after >= before {
        debug!("{}: {} -> {} bytes, keeping original {}", label, before, after, original.display());
        log.record(LogEvent::NotSmaller { label, path: original }).await;
        return Ok(ReplaceOutcome::NotSmaller { before });
    }

    fs::set_permissions(&*scratch, metadata.permissions()).await?;
    let scratch_display = scratch.to_path_buf();
    if let Err(e) = scratch.persist(original) {
        warn!(
            "Failed to move {} over {}: {}",
            scratch_display.display(),
            original.display(),
            e.error
        );
        log.record(LogEvent::Failed { label, path: original }).await;
        return Ok(ReplaceOutcome::Failed { before });
    }

    let saved_percent = percent_saved(before, after);
    log.record(LogEvent::Optimized { label, path: original, saved_percent }).await;
    Ok(ReplaceOutcome::Replaced { before, after, saved_percent })
}

/// Fail with `EmptyArtifact` if a tool "succeeded" without writing anything
pub async fn ensure_artifact(path: &Path, tool: &str) -> Result<()> {
    match fs::metadata(path).await {
        Ok(meta) if meta.len() > 0 => Ok(()),
        _ => Err(OptimizeError::EmptyArtifact { tool: tool.to_string() }.into()),
    }
}
