//! # Backup Module
//!
//! Copia l'originale in un path speculare sotto la root di backup prima di
//! qualunque modifica.
//!
//! ## Responsabilità:
//! - Creazione della root di backup all'avvio (fallimento = errore fatale)
//! - Calcolo del path relativo alla source root e mirroring sotto la backup root
//! - Copia byte-exact verificata con SHA-256
//! - Rename atomico nella destinazione: con due job sullo stesso path vince
//!   l'ultimo writer, mai copie parziali interleaved
//!
//! ## Struttura:
//! ```text
//! Source: /srv/www/uploads/2023/photo.jpg
//! Root:   /srv/www/uploads
//! Backup: /backup/2023/photo.jpg
//! ```

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::io::Read;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::audit_log::{AuditLog, LogEvent};
use crate::config::Config;
use crate::error::OptimizeError;
use crate::safe_replace::SCRATCH_PREFIX;

/// Copies originals to a mirrored tree before mutation
pub struct BackupManager {
    source_root: PathBuf,
    backup_root: Option<PathBuf>,
    /// Destinations written during this run, to flag collisions
    taken: Mutex<HashSet<PathBuf>>,
}

impl BackupManager {
    /// Create the manager, creating the backup root when backups are active
    pub async fn prepare(config: &Config) -> Result<Self> {
        let backup_root = match config.backup_root() {
            Some(root) if !config.dry_run => {
                fs::create_dir_all(root).await.map_err(|e| OptimizeError::Backup {
                    path: root.to_path_buf(),
                    reason: format!("cannot create backup directory: {}", e),
                })?;
                info!("Backups enabled under {}", root.display());
                Some(root.canonicalize().unwrap_or_else(|_| root.to_path_buf()))
            }
            _ => None,
        };

        Ok(Self {
            source_root: config.source_dir.clone(),
            backup_root,
            taken: Mutex::new(HashSet::new()),
        })
    }

    /// A manager that never copies anything
    pub fn disabled(source_root: &Path) -> Self {
        Self {
            source_root: source_root.to_path_buf(),
            backup_root: None,
            taken: Mutex::new(HashSet::new()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.backup_root.is_some()
    }

    pub fn backup_root(&self) -> Option<&Path> {
        self.backup_root.as_deref()
    }

    /// Path of `path` relative to the source root, joined under the backup root
    pub fn mirror_path(&self, path: &Path) -> Option<PathBuf> {
        let root = self.backup_root.as_ref()?;
        let relative = match path.strip_prefix(&self.source_root) {
            Ok(rel) => rel.to_path_buf(),
            Err(_) => {
                debug!("{} is outside the source root, mirroring by file name", path.display());
                PathBuf::from(path.file_name()?)
            }
        };
        Some(root.join(relative))
    }

    /// Back up `path`. Returns the destination, or `None` when backups are off.
    pub async fn backup(&self, path: &Path, log: &AuditLog) -> Result<Option<PathBuf>> {
        let Some(destination) = self.mirror_path(path) else {
            return Ok(None);
        };

        if !self.taken.lock().await.insert(destination.clone()) {
            warn!(
                "Backup path collision: {} already written this run, overwriting",
                destination.display()
            );
        }

        match copy_verified(path, &destination).await {
            Ok(()) => {
                log.record(LogEvent::BackedUp { from: path, to: &destination }).await;
                Ok(Some(destination))
            }
            Err(e) => {
                warn!("Backup of {} failed: {:#}", path.display(), e);
                log.record(LogEvent::BackupFailed { path }).await;
                Err(OptimizeError::Backup {
                    path: path.to_path_buf(),
                    reason: format!("{:#}", e),
                }
                .into())
            }
        }
    }
}

/// Copy into a scratch file beside `destination`, verify, then rename into place
async fn copy_verified(source: &Path, destination: &Path) -> Result<()> {
    let parent = destination
        .parent()
        .ok_or_else(|| anyhow::anyhow!("Invalid backup path: {}", destination.display()))?;
    fs::create_dir_all(parent)
        .await
        .with_context(|| format!("Failed to create {}", parent.display()))?;

    let scratch = tempfile::Builder::new()
        .prefix(SCRATCH_PREFIX)
        .tempfile_in(parent)?
        .into_temp_path();

    fs::copy(source, &*scratch)
        .await
        .with_context(|| format!("Failed to copy {}", source.display()))?;

    let (source_hash, copy_hash) = tokio::try_join!(sha256_file(source), sha256_file(&scratch))?;
    if source_hash != copy_hash {
        anyhow::bail!("checksum mismatch ({} != {})", source_hash, copy_hash);
    }

    scratch
        .persist(destination)
        .map_err(|e| anyhow::anyhow!("Failed to move backup into place: {}", e.error))?;
    Ok(())
}

/// Hex SHA-256 of a file's bytes
pub async fn sha256_file(path: &Path) -> Result<String> {
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || -> Result<String> {
        let mut file = std::fs::File::open(&path)?;
        let mut hasher = Sha256::new();
        let mut buffer = [0u8; 64 * 1024];
        loop {
            let read = file.read(&mut buffer)?;
            if read == 0 {
                break;
            }
            hasher.update(&buffer[..read]);
        }
        Ok(hex::encode(hasher.finalize()))
    })
    .await?
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    struct Fixture {
        _dir: TempDir,
        source: PathBuf,
        backup: PathBuf,
        log_path: PathBuf,
    }

    fn fixture() -> Fixture {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("src");
        let backup = dir.path().join("bak");
        std::fs::create_dir_all(source.join("2023/trip")).unwrap();
        let log_path = dir.path().join("audit.log");
        Fixture { source, backup, log_path, _dir: dir }
    }

    fn config_for(fx: &Fixture) -> Config {
        Config {
            source_dir: fx.source.clone(),
            backup_dir: Some(fx.backup.clone()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_backup_mirrors_relative_path() {
        let fx = fixture();
        let original = fx.source.join("2023/trip/photo.jpg");
        std::fs::write(&original, b"original bytes").unwrap();

        let manager = BackupManager::prepare(&config_for(&fx)).await.unwrap();
        let log = AuditLog::open(&fx.log_path).await.unwrap();
        let dest = manager.backup(&original, &log).await.unwrap().unwrap();

        assert!(dest.ends_with("2023/trip/photo.jpg"));
        assert!(dest.starts_with(manager.backup_root().unwrap()));
        assert_eq!(std::fs::read(&dest).unwrap(), b"original bytes");

        let log_text = std::fs::read_to_string(&fx.log_path).unwrap();
        assert!(log_text.contains(&format!("Backed up: {} -> {}", original.display(), dest.display())));
    }

    #[tokio::test]
    async fn test_last_writer_wins() {
        let fx = fixture();
        let original = fx.source.join("a.png");
        let manager = BackupManager::prepare(&config_for(&fx)).await.unwrap();
        let log = AuditLog::open(&fx.log_path).await.unwrap();

        std::fs::write(&original, b"first").unwrap();
        manager.backup(&original, &log).await.unwrap();
        std::fs::write(&original, b"second").unwrap();
        let dest = manager.backup(&original, &log).await.unwrap().unwrap();

        assert_eq!(std::fs::read(dest).unwrap(), b"second");
    }

    #[tokio::test]
    async fn test_disabled_and_dry_run_do_nothing() {
        let fx = fixture();
        let original = fx.source.join("a.png");
        std::fs::write(&original, b"data").unwrap();
        let log = AuditLog::open(&fx.log_path).await.unwrap();

        let mut config = config_for(&fx);
        config.backup_enabled = false;
        let manager = BackupManager::prepare(&config).await.unwrap();
        assert!(!manager.is_enabled());
        assert!(manager.backup(&original, &log).await.unwrap().is_none());

        config.backup_enabled = true;
        config.dry_run = true;
        let manager = BackupManager::prepare(&config).await.unwrap();
        assert!(!manager.is_enabled());
        assert!(!fx.backup.exists());
    }

    #[tokio::test]
    async fn test_uncreatable_backup_root_is_error() {
        let fx = fixture();
        let blocker = fx.source.join("not_a_dir");
        std::fs::write(&blocker, b"file").unwrap();

        let config = Config {
            source_dir: fx.source.clone(),
            backup_dir: Some(blocker.join("backups")),
            ..Default::default()
        };
        assert!(BackupManager::prepare(&config).await.is_err());
    }

    #[tokio::test]
    async fn test_missing_source_file_logs_failure() {
        let fx = fixture();
        let manager = BackupManager::prepare(&config_for(&fx)).await.unwrap();
        let log = AuditLog::open(&fx.log_path).await.unwrap();

        let missing = fx.source.join("gone.jpg");
        assert!(manager.backup(&missing, &log).await.is_err());
        let log_text = std::fs::read_to_string(&fx.log_path).unwrap();
        assert!(log_text.contains("Failed to back up"));
    }

    #[test]
    fn test_sha256_known_value() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("abc.txt");
        std::fs::write(&path, b"abc").unwrap();
        let rt = tokio::runtime::Runtime::new().unwrap();
        assert_eq!(
            rt.block_on(sha256_file(&path)).unwrap(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
