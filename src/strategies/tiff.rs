//! # TIFF Strategy
//!
//! Documenti multipagina: ogni pagina viene ricompressa singolarmente e poi
//! riassemblata nell'ordine originale.
//!
//! ## Flusso:
//! 1. `convert input page-%04d.tif` in una directory temporanea di sistema
//! 2. Per ogni pagina: `-colorspace Gray -depth 8 -compress LZW`
//! 3. `convert lzw-0000.tif lzw-0001.tif ... -compress LZW output`
//!
//! La directory temporanea viene rimossa in ogni caso (drop di `TempDir`).

use anyhow::Result;
use futures::future::BoxFuture;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

use super::FormatStrategy;
use crate::args;
use crate::error::OptimizeError;
use crate::format::FormatKind;
use crate::safe_replace::{ensure_artifact, TransformStatus};
use crate::toolchain::{Tool, Toolchain};

const PAGE_PREFIX: &str = "page-";
const RECOMPRESSED_PREFIX: &str = "lzw-";

pub struct TiffStrategy;

impl TiffStrategy {
    async fn split(tools: &Toolchain, input: &Path, work_dir: &Path) -> Result<Vec<PathBuf>> {
        let pattern = work_dir.join(format!("{}%04d.tif", PAGE_PREFIX));
        tools.run(Tool::Convert, &args![input, pattern]).await?;

        let pages = list_pages(work_dir, PAGE_PREFIX).await?;
        if pages.is_empty() {
            return Err(OptimizeError::EmptyArtifact {
                tool: Tool::Convert.binary_name().to_string(),
            }
            .into());
        }
        Ok(pages)
    }

    async fn recompress(tools: &Toolchain, pages: &[PathBuf], work_dir: &Path) -> Result<Vec<PathBuf>> {
        let mut recompressed = Vec::with_capacity(pages.len());
        for (index, page) in pages.iter().enumerate() {
            let target = work_dir.join(format!("{}{:04}.tif", RECOMPRESSED_PREFIX, index));
            let args = args![
                page,
                "-colorspace",
                "Gray",
                "-depth",
                "8",
                "-compress",
                "LZW",
                target,
            ];
            tools.run(Tool::Convert, &args).await?;
            recompressed.push(target);
        }
        Ok(recompressed)
    }

    async fn merge(tools: &Toolchain, pages: &[PathBuf], output: &Path) -> Result<()> {
        let mut args: Vec<OsString> = pages.iter().map(|p| p.as_os_str().to_os_string()).collect();
        args.extend(args!["-compress", "LZW", output]);
        tools.run(Tool::Convert, &args).await
    }
}

impl FormatStrategy for TiffStrategy {
    fn kind(&self) -> FormatKind {
        FormatKind::Tiff
    }

    fn transform<'a>(
        &'a self,
        tools: &'a Toolchain,
        input: &'a Path,
        output: &'a Path,
    ) -> BoxFuture<'a, Result<TransformStatus>> {
        Box::pin(async move {
            let work_dir = tempfile::Builder::new().prefix("optimg-tiff-").tempdir()?;

            let pages = Self::split(tools, input, work_dir.path()).await?;
            debug!("{} split into {} page(s)", input.display(), pages.len());

            let recompressed = Self::recompress(tools, &pages, work_dir.path()).await?;
            Self::merge(tools, &recompressed, output).await?;
            ensure_artifact(output, Tool::Convert.binary_name()).await?;
            Ok(TransformStatus::Produced)
        })
    }
}

/// Page number encoded after `prefix` (`page-0042.tif` → 42)
fn page_index(path: &Path, prefix: &str) -> Option<u64> {
    path.file_stem()?.to_str()?.strip_prefix(prefix)?.parse().ok()
}

/// Files in `dir` whose name starts with `prefix`, in page order
///
/// `%04d` only pads to four digits, so `page-10000` must sort after `page-9999`.
pub async fn list_pages(dir: &Path, prefix: &str) -> Result<Vec<PathBuf>> {
    let mut pages = Vec::new();
    let mut entries = fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        if entry.file_name().to_string_lossy().starts_with(prefix) {
            pages.push(entry.path());
        }
    }
    pages.sort_by_cached_key(|page| (page_index(page, prefix), page.clone()));
    Ok(pages)
}
