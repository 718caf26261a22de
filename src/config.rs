//! # Configuration Management Module
//!
//! Questo modulo gestisce tutta la configurazione dell'applicazione.
//!
//! ## Responsabilità:
//! - Definisce la struct `Config` con tutti i parametri di un run
//! - Fornisce validazione robusta dei parametri di input
//! - Supporta caricamento/salvataggio configurazione da/verso file JSON
//! - Fornisce valori di default sensati per tutti i parametri
//!
//! La soglia minima (`MIN_FILE_SIZE`, 1024 byte) è fissa e non configurabile.
//!
//! La configurazione è immutabile per tutta la durata di un run: viene costruita
//! una volta in `main` e condivisa (via `Arc`) con tutti i componenti.
//!
//! ## Parametri principali:
//! - `source_dir`: Directory da ottimizzare (default: `.`)
//! - `backup_dir`: Root dei backup (default: `~/image_optimization_backups`)
//! - `log_file`: File di log auditabile (default: fuori dalla source, nella
//!   state dir dell'utente: `~/.local/state/server_image_optimizer/image_optimization.log`)
//! - `workers`: Numero di worker paralleli (default: 4)
//! - `dry_run` / `recursive` / `backup_enabled` / `aggressive`
//! - `backup_failure`: Cosa fare se la copia di backup fallisce (default: abort del job)
//!
//! ## Esempio:
//! ```rust,ignore
//! let config = Config {
//!     source_dir: PathBuf::from("/var/www/uploads"),
//!     workers: 8,
//!     ..Default::default()
//! };
//! config.validate()?;
//! ```

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::OptimizeError;

/// Files smaller than this are never handed to a strategy
pub const MIN_FILE_SIZE: u64 = 1024;

/// Ghostscript quality preset used for PDF rewriting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PdfPreset {
    /// Medium resolution (150 DPI images), default
    Ebook,
    /// Low resolution (72 DPI images), lighter alternative
    Screen,
}

impl PdfPreset {
    pub fn as_gs_setting(&self) -> &'static str {
        match self {
            PdfPreset::Ebook => "/ebook",
            PdfPreset::Screen => "/screen",
        }
    }
}

/// What happens to a job when its backup copy cannot be written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackupFailurePolicy {
    /// Log the failure and leave the original untouched
    AbortJob,
    /// Log the failure and optimize anyway
    Continue,
}

/// Configuration for one optimization run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root of the tree to optimize
    pub source_dir: PathBuf,
    /// Root under which originals are mirrored before mutation
    pub backup_dir: Option<PathBuf>,
    /// Audit log destination
    pub log_file: PathBuf,
    /// Number of parallel workers
    pub workers: usize,
    /// Dry run - never touch the filesystem under the source root
    pub dry_run: bool,
    /// Descend into subdirectories
    pub recursive: bool,
    /// Copy originals under `backup_dir` before mutating them
    pub backup_enabled: bool,
    /// Run resize / bit depth / DPI passes after the primary pass (raster only)
    pub aggressive: bool,
    /// JPEG quality ceiling (1-100)
    pub jpeg_quality: u8,
    /// PNG quantization quality band, lower bound
    pub png_quality_min: u8,
    /// PNG quantization quality band, upper bound
    pub png_quality_max: u8,
    /// gifsicle optimization level (1-3)
    pub gif_level: u8,
    /// PDF rewrite preset
    pub pdf_preset: PdfPreset,
    /// Longest side allowed by the aggressive resize pass
    pub max_dimension: u32,
    /// Bits per channel allowed by the aggressive depth pass
    pub max_bit_depth: u8,
    /// Resolution metadata allowed by the aggressive DPI pass
    pub max_dpi: u32,
    /// Behavior when a per-file backup copy fails
    pub backup_failure: BackupFailurePolicy,
}

/// Audit log under the user's state directory, never inside the tree being optimized
fn default_log_file() -> PathBuf {
    dirs::state_dir()
        .or_else(dirs::data_local_dir)
        .unwrap_or_else(std::env::temp_dir)
        .join("server_image_optimizer")
        .join("image_optimization.log")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("."),
            backup_dir: dirs::home_dir().map(|home| home.join("image_optimization_backups")),
            log_file: default_log_file(),
            workers: 4,
            dry_run: false,
            recursive: true,
            backup_enabled: true,
            aggressive: true,
            jpeg_quality: 85,
            png_quality_min: 70,
            png_quality_max: 85,
            gif_level: 3,
            pdf_preset: PdfPreset::Ebook,
            max_dimension: 1920,
            max_bit_depth: 8,
            max_dpi: 96,
            backup_failure: BackupFailurePolicy::AbortJob,
        }
    }
}

impl Config {
    /// Validate configuration parameters
    pub fn validate(&self) -> Result<(), OptimizeError> {
        let invalid = |msg: &str| Err(OptimizeError::Validation(msg.to_string()));

        if self.workers == 0 {
            return invalid("Number of workers must be greater than 0");
        }
        if self.jpeg_quality == 0 || self.jpeg_quality > 100 {
            return invalid("JPEG quality must be between 1 and 100");
        }
        if self.png_quality_max > 100 || self.png_quality_min > self.png_quality_max {
            return invalid("PNG quality band must satisfy min <= max <= 100");
        }
        if !(1..=3).contains(&self.gif_level) {
            return invalid("GIF optimization level must be between 1 and 3");
        }
        if self.max_dimension == 0 || self.max_bit_depth == 0 || self.max_dpi == 0 {
            return invalid("Aggressive limits (dimension, bit depth, DPI) must be greater than 0");
        }

        Ok(())
    }

    /// Backup root, only when backups are both enabled and configured
    pub fn backup_root(&self) -> Option<&Path> {
        if self.backup_enabled {
            self.backup_dir.as_deref()
        } else {
            None
        }
    }

    /// Load configuration from file
    pub async fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(path).await?;
        let config: Config = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub async fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.workers = 0;
        assert!(config.validate().is_err());

        config.workers = 4;
        config.jpeg_quality = 0;
        assert!(config.validate().is_err());

        config.jpeg_quality = 85;
        config.png_quality_min = 90;
        assert!(config.validate().is_err());

        config.png_quality_min = 70;
        config.gif_level = 4;
        assert!(config.validate().is_err());

        config.gif_level = 3;
        config.max_dpi = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.workers, 4);
        assert_eq!(config.jpeg_quality, 85);
        assert_eq!((config.png_quality_min, config.png_quality_max), (70, 85));
        assert_eq!(config.max_dimension, 1920);
        assert_eq!(config.max_bit_depth, 8);
        assert_eq!(config.max_dpi, 96);
        assert_eq!(config.pdf_preset, PdfPreset::Ebook);
        assert_eq!(config.backup_failure, BackupFailurePolicy::AbortJob);
        assert!(config.recursive);
        assert!(config.aggressive);
        assert!(config.backup_enabled);
        assert!(!config.dry_run);
    }

    #[test]
    fn test_default_log_outside_default_source() {
        let config = Config::default();
        assert!(config.log_file.is_absolute());
        let source = config.source_dir.canonicalize().unwrap();
        assert!(!config.log_file.starts_with(&source), "{:?} is inside {:?}", config.log_file, source);
    }

    #[test]
    fn test_min_file_size_is_not_configurable() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("threshold.json");
        std::fs::write(&config_path, r#"{ "min_file_size": 1, "workers": 3 }"#).unwrap();

        let config = tokio_test::block_on(Config::from_file(&config_path)).unwrap();
        assert_eq!(config.workers, 3);
        assert!(!serde_json::to_string(&config).unwrap().contains("min_file_size"));
        assert_eq!(MIN_FILE_SIZE, 1024);
    }

    #[test]
    fn test_backup_root_requires_flag() {
        let mut config = Config {
            backup_dir: Some(PathBuf::from("/srv/backup")),
            ..Default::default()
        };
        assert_eq!(config.backup_root(), Some(Path::new("/srv/backup")));

        config.backup_enabled = false;
        assert_eq!(config.backup_root(), None);

        config.backup_enabled = true;
        config.backup_dir = None;
        assert_eq!(config.backup_root(), None);
    }

    #[tokio::test]
    async fn test_config_save_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");

        let original_config = Config {
            source_dir: PathBuf::from("/srv/uploads"),
            workers: 8,
            dry_run: true,
            pdf_preset: PdfPreset::Screen,
            backup_failure: BackupFailurePolicy::Continue,
            ..Default::default()
        };

        original_config.save_to_file(&config_path).await.unwrap();
        let loaded_config = Config::from_file(&config_path).await.unwrap();

        assert_eq!(loaded_config.source_dir, PathBuf::from("/srv/uploads"));
        assert_eq!(loaded_config.workers, 8);
        assert!(loaded_config.dry_run);
        assert_eq!(loaded_config.pdf_preset, PdfPreset::Screen);
        assert_eq!(loaded_config.backup_failure, BackupFailurePolicy::Continue);
    }

    #[test]
    fn test_partial_file_falls_back_to_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("partial.json");
        std::fs::write(&config_path, r#"{ "workers": 2, "pdf_preset": "screen" }"#).unwrap();

        let config = tokio_test::block_on(Config::from_file(&config_path)).unwrap();
        assert_eq!(config.workers, 2);
        assert_eq!(config.pdf_preset, PdfPreset::Screen);
        assert_eq!(config.jpeg_quality, 85);
    }

    #[test]
    fn test_pdf_preset_settings() {
        assert_eq!(PdfPreset::Ebook.as_gs_setting(), "/ebook");
        assert_eq!(PdfPreset::Screen.as_gs_setting(), "/screen");
    }
}
