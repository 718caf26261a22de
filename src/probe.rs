//! Image property probing for the aggressive passes.
//!
//! Uses `identify` on the first frame; falls back to reading the header with
//! the `image` crate when only the dimensions are needed.

use anyhow::Result;
use std::path::Path;
use tracing::debug;

use crate::toolchain::{Tool, Toolchain};
use crate::utils::first_frame_arg;

/// Centimeters per inch, for `PixelsPerCentimeter` densities
const CM_PER_INCH: f64 = 2.54;

/// Properties reported by `identify -format "%w %h %z %x %U"`
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ImageInfo {
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// Bits per channel
    pub depth: Option<u32>,
    /// Horizontal resolution in pixels per inch
    pub density: Option<f64>,
}

impl ImageInfo {
    /// Parse `"<w> <h> <depth> <density>[ units]"`. Unreadable fields stay `None`.
    ///
    /// A density in `PixelsPerCentimeter` (PNG `pHYs`, some TIFFs) is converted
    /// to pixels per inch; `PixelsPerInch` and `Undefined` are taken as is.
    pub fn parse(output: &str) -> Self {
        let mut fields = output.split_whitespace();
        let width = fields.next().and_then(|f| f.parse::<u32>().ok());
        let height = fields.next().and_then(|f| f.parse::<u32>().ok());
        let depth = fields.next().and_then(|f| f.parse::<u32>().ok());
        let raw_density = fields.next().and_then(|f| f.parse::<f64>().ok());

        let per_centimeter = fields.any(|f| f.eq_ignore_ascii_case("PixelsPerCentimeter"));
        let density = raw_density.map(|d| if per_centimeter { d * CM_PER_INCH } else { d });

        Self { width, height, depth, density }
    }

    /// Longer side, when both sides are known
    pub fn longest_side(&self) -> Option<u32> {
        Some(self.width?.max(self.height?))
    }
}

/// Probe `path`, returning whatever could be read
pub async fn probe(tools: &Toolchain, path: &Path) -> ImageInfo {
    let args = crate::args!["-format", "%w %h %z %x %U", first_frame_arg(path)];

    let mut info = match tools.capture(Tool::Identify, &args).await {
        Ok(output) => ImageInfo::parse(&output),
        Err(e) => {
            debug!("identify failed for {}: {:#}", path.display(), e);
            ImageInfo::default()
        }
    };

    if info.width.is_none() || info.height.is_none() {
        if let Ok((width, height)) = header_dimensions(path).await {
            info.width = Some(width);
            info.height = Some(height);
        }
    }

    info
}

async fn header_dimensions(path: &Path) -> Result<(u32, u32)> {
    let path = path.to_path_buf();
    let dims = tokio::task::spawn_blocking(move || image::image_dimensions(&path)).await??;
    Ok(dims)
}
