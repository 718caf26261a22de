//! Supported format kinds and the unit of work handed to workers.

use std::fmt;
use std::path::{Path, PathBuf};

/// One of the file kinds the pipeline knows how to shrink
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatKind {
    Jpeg,
    Png,
    Tiff,
    Pdf,
    Gif,
}

impl FormatKind {
    pub const ALL: [FormatKind; 5] = [
        FormatKind::Jpeg,
        FormatKind::Png,
        FormatKind::Tiff,
        FormatKind::Pdf,
        FormatKind::Gif,
    ];

    /// Resolve the kind from the file extension (case-insensitive)
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_string_lossy().to_lowercase();
        match ext.as_str() {
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            "tif" | "tiff" => Some(Self::Tiff),
            "pdf" => Some(Self::Pdf),
            "gif" => Some(Self::Gif),
            _ => None,
        }
    }

    /// Name used in audit log lines
    pub fn label(&self) -> &'static str {
        match self {
            Self::Jpeg => "JPEG",
            Self::Png => "PNG",
            Self::Tiff => "TIFF",
            Self::Pdf => "PDF",
            Self::Gif => "GIF",
        }
    }

    /// Formats eligible for the aggressive resize / depth / DPI passes
    pub fn is_raster(&self) -> bool {
        matches!(self, Self::Jpeg | Self::Png | Self::Gif)
    }
}

impl fmt::Display for FormatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A discovered file slated for optimization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub path: PathBuf,
    pub kind: FormatKind,
}

impl Job {
    pub fn new(path: PathBuf, kind: FormatKind) -> Self {
        Self { path, kind }
    }

    /// Build a job when the path has a supported extension
    pub fn from_path(path: PathBuf) -> Option<Self> {
        let kind = FormatKind::from_path(&path)?;
        Some(Self { path, kind })
    }
}
