//! # Audit Log Module
//!
//! Questo modulo gestisce il log auditabile del run, consumato poi dal
//! generatore di report HTML.
//!
//! ## Responsabilità:
//! - Rotazione una-tantum di un log preesistente all'avvio
//! - Scrittura append-only di righe `[YYYY-MM-DD HH:MM:SS] <messaggio>`
//! - Serializzazione delle scritture tra worker concorrenti (mai righe interleaved)
//! - Mirror di ogni riga su `tracing` per l'output a console
//!
//! ## Formato messaggi:
//! I messaggi sono un contratto durevole: il report li analizza via regex.
//! ```text
//! Optimized JPEG: /srv/a.jpg (saved 23%)
//! Skipped PNG: /srv/b.png (optimized version not smaller)
//! Failed to optimize PDF: /srv/c.pdf
//! Would optimize GIF: /srv/d.gif
//! Backed up: /srv/a.jpg -> /backup/a.jpg
//! Skipping small file: /srv/tiny.png
//! ```

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use std::fmt;
use std::path::{Path, PathBuf};
use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{info, warn};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const ROTATION_SUFFIX_FORMAT: &str = "%Y%m%d-%H%M%S";

/// One audit log message
#[derive(Debug, Clone)]
pub enum LogEvent<'a> {
    Optimized { label: &'a str, path: &'a Path, saved_percent: u64 },
    NotSmaller { label: &'a str, path: &'a Path },
    Failed { label: &'a str, path: &'a Path },
    WouldOptimize { label: &'a str, path: &'a Path },
    BackedUp { from: &'a Path, to: &'a Path },
    BackupFailed { path: &'a Path },
    SkippingSmall { path: &'a Path },
    SkippingUnreadable { path: &'a Path },
    RunStarted { source: &'a Path, dry_run: bool, workers: usize },
    RunSummary(&'a str),
}

impl fmt::Display for LogEvent<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogEvent::Optimized { label, path, saved_percent } => {
                write!(f, "Optimized {}: {} (saved {}%)", label, path.display(), saved_percent)
            }
            LogEvent::NotSmaller { label, path } => {
                write!(f, "Skipped {}: {} (optimized version not smaller)", label, path.display())
            }
            LogEvent::Failed { label, path } => {
                write!(f, "Failed to optimize {}: {}", label, path.display())
            }
            LogEvent::WouldOptimize { label, path } => {
                write!(f, "Would optimize {}: {}", label, path.display())
            }
            LogEvent::BackedUp { from, to } => {
                write!(f, "Backed up: {} -> {}", from.display(), to.display())
            }
            LogEvent::BackupFailed { path } => write!(f, "Failed to back up: {}", path.display()),
            LogEvent::SkippingSmall { path } => write!(f, "Skipping small file: {}", path.display()),
            LogEvent::SkippingUnreadable { path } => {
                write!(f, "Skipping unreadable file: {}", path.display())
            }
            LogEvent::RunStarted { source, dry_run, workers } => write!(
                f,
                "Starting optimization of {} ({} workers{})",
                source.display(),
                workers,
                if *dry_run { ", dry run" } else { "" }
            ),
            LogEvent::RunSummary(summary) => write!(f, "Optimization complete: {}", summary),
        }
    }
}

/// Render one log line, newline included
pub fn format_line(timestamp: DateTime<Local>, message: &str) -> String {
    format!("[{}] {}\n", timestamp.format(TIMESTAMP_FORMAT), message)
}

/// Append-only, timestamped, concurrency-safe event sink
pub struct AuditLog {
    path: PathBuf,
    file: Mutex<File>,
}

impl AuditLog {
    /// Rotate any pre-existing log at `path`, then create a fresh one
    pub async fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create log directory {}", parent.display()))?;
        }

        if let Some(rotated) = rotate_existing(path).await? {
            info!("Previous log rotated to {}", rotated.display());
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await
            .with_context(|| format!("Failed to open log file {}", path.display()))?;

        Ok(Self {
            path: path.to_path_buf(),
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write one entry. Failures are reported on stderr and never abort a job.
    pub async fn record(&self, event: LogEvent<'_>) {
        let message = event.to_string();
        info!("{}", message);

        let line = format_line(Local::now(), &message);
        let mut file = self.file.lock().await;
        let written = async {
            file.write_all(line.as_bytes()).await?;
            file.flush().await
        }
        .await;

        if let Err(e) = written {
            warn!("Failed to write audit log {}: {}", self.path.display(), e);
        }
    }
}

/// Move an existing log to a timestamp-suffixed sibling. Returns the new path.
pub async fn rotate_existing(path: &Path) -> Result<Option<PathBuf>> {
    if fs::metadata(path).await.is_err() {
        return Ok(None);
    }

    let stamp = Local::now().format(ROTATION_SUFFIX_FORMAT).to_string();
    let file_name = path
        .file_name()
        .ok_or_else(|| anyhow::anyhow!("Invalid log path: {}", path.display()))?
        .to_string_lossy()
        .to_string();

    let mut target = path.with_file_name(format!("{}.{}", file_name, stamp));
    let mut counter = 1;
    while fs::metadata(&target).await.is_ok() {
        target = path.with_file_name(format!("{}.{}.{}", file_name, stamp, counter));
        counter += 1;
    }

    fs::rename(path, &target)
        .await
        .with_context(|| format!("Failed to rotate log {}", path.display()))?;
    Ok(Some(target))
}
