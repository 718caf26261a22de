//! # Error Types Module
//!
//! Questo modulo definisce tutti i tipi di errore custom dell'applicazione.
//!
//! ## Responsabilità:
//! - Definisce `OptimizeError` enum per categorizzare tutti gli errori possibili
//! - Distingue errori fatali di pre-flight da fallimenti per singolo file
//! - Integra con `thiserror` per automatic error conversion
//!
//! ## Categorie di errori:
//! - `MissingSource`, `MissingDependency`, `Validation`: fatali, bloccano il run
//! - `ToolFailed`, `EmptyArtifact`: tool esterno fallito su un file (run continua)
//! - `Backup`: copia di backup non riuscita per un file
//! - `Io` / `Image`: errori di I/O e di probing header
//!
//! ## Esempio:
//! ```rust,ignore
//! if !source.is_dir() {
//!     return Err(OptimizeError::MissingSource(source.to_path_buf()));
//! }
//! ```

use std::path::PathBuf;
use std::process::ExitStatus;

/// Custom error types for the optimization pipeline
#[derive(thiserror::Error, Debug)]
pub enum OptimizeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image probing error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Source directory does not exist: {}", .0.display())]
    MissingSource(PathBuf),

    #[error("Required tools missing: {}", .0.join(", "))]
    MissingDependency(Vec<String>),

    #[error("{tool} exited with {status}")]
    ToolFailed { tool: String, status: ExitStatus },

    #[error("{tool} produced no output")]
    EmptyArtifact { tool: String },

    #[error("Backup failed for {}: {reason}", .path.display())]
    Backup { path: PathBuf, reason: String },

    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("Configuration error: {0}")]
    Validation(String),
}

impl OptimizeError {
    /// True for errors that must abort the whole run before dispatch
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::MissingSource(_) | Self::MissingDependency(_) | Self::Validation(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_dependency_lists_all_tools() {
        let err = OptimizeError::MissingDependency(vec!["pngquant".into(), "gifsicle".into()]);
        assert_eq!(err.to_string(), "Required tools missing: pngquant, gifsicle");
        assert!(err.is_fatal());
    }

    #[test]
    fn test_per_file_errors_are_not_fatal() {
        let err = OptimizeError::EmptyArtifact { tool: "gs".into() };
        assert!(!err.is_fatal());
        let err = OptimizeError::Backup { path: PathBuf::from("/a.jpg"), reason: "disk full".into() };
        assert!(!err.is_fatal());
        assert!(err.to_string().contains("/a.jpg"));
    }
}
