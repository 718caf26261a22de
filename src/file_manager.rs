//! # File Management Module
//!
//! Questo modulo gestisce la discovery dei file candidati e le utilità sui file.
//!
//! ## Responsabilità:
//! - Discovery (ricorsiva o flat) dei file con estensione supportata
//! - Esclusione della root di backup e dei file scratch della pipeline
//! - Utilità per calcoli dimensioni e percentuali
//!
//! ## Formati supportati:
//! JPG, JPEG, PNG, TIF, TIFF, PDF, GIF (case-insensitive)
//!
//! La discovery è lazy: non apre e non misura i file. Il gate per dimensione e
//! leggibilità avviene per singolo job nel worker.
//!
//! ## Esempio:
//! ```rust,ignore
//! let discovery = Discovery::new(&source, true).exclude(&backup_root);
//! for job in discovery.jobs()? {
//!     println!("{} ({})", job.path.display(), job.kind);
//! }
//! ```

use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

use crate::error::OptimizeError;
use crate::format::Job;
use crate::safe_replace::SCRATCH_PREFIX;

/// Enumerates candidate files under a root
#[derive(Debug, Clone)]
pub struct Discovery {
    root: PathBuf,
    recursive: bool,
    excluded: Vec<PathBuf>,
}

impl Discovery {
    pub fn new(root: &Path, recursive: bool) -> Self {
        Self {
            root: root.to_path_buf(),
            recursive,
            excluded: Vec::new(),
        }
    }

    /// Skip a subtree (e.g. a backup root nested in the source tree)
    pub fn exclude(mut self, path: &Path) -> Self {
        self.excluded.push(path.to_path_buf());
        self
    }

    /// Lazy sequence of jobs; fails if the root does not exist
    pub fn jobs(&self) -> Result<impl Iterator<Item = Job>, OptimizeError> {
        if !self.root.is_dir() {
            return Err(OptimizeError::MissingSource(self.root.clone()));
        }

        let max_depth = if self.recursive { usize::MAX } else { 1 };
        let excluded = self.excluded.clone();

        let jobs = WalkDir::new(&self.root)
            .max_depth(max_depth)
            .follow_links(false)
            .into_iter()
            .filter_entry(move |entry| !Self::is_excluded(entry, &excluded))
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .filter_map(|entry| Job::from_path(entry.into_path()));

        Ok(jobs)
    }

    fn is_excluded(entry: &DirEntry, excluded: &[PathBuf]) -> bool {
        // depth 0 is the root itself
        if entry.depth() == 0 {
            return false;
        }
        if entry.file_name().to_string_lossy().starts_with(SCRATCH_PREFIX) {
            return true;
        }
        excluded.iter().any(|ex| entry.path() == ex.as_path())
    }
}

/// Get human-readable file size
pub fn format_size(size: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = size as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", size as u64, UNITS[unit_index])
    } else {
        format!("{:.2} {}", size, UNITS[unit_index])
    }
}

/// Integer percentage saved, floor of `(before - after) * 100 / before`
pub fn percent_saved(before: u64, after: u64) -> u64 {
    if before == 0 || after >= before {
        return 0;
    }
    ((before - after) as u128 * 100 / before as u128) as u64
}
