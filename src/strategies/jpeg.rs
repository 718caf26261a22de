//! JPEG: lossy re-encode with `jpegoptim` under a quality ceiling, metadata stripped.

use anyhow::Result;
use futures::future::BoxFuture;
use std::ffi::OsString;
use std::path::Path;

use super::FormatStrategy;
use crate::args;
use crate::format::FormatKind;
use crate::safe_replace::TransformStatus;
use crate::toolchain::{Tool, Toolchain};

pub struct JpegStrategy {
    quality: u8,
}

impl JpegStrategy {
    pub fn new(quality: u8) -> Self {
        Self { quality }
    }

    /// `jpegoptim` writes to stdout so the original is never touched
    pub fn arguments(&self, input: &Path) -> Vec<OsString> {
        args![format!("--max={}", self.quality), "--strip-all", "--stdout", input]
    }
}

impl FormatStrategy for JpegStrategy {
    fn kind(&self) -> FormatKind {
        FormatKind::Jpeg
    }

    fn transform<'a>(
        &'a self,
        tools: &'a Toolchain,
        input: &'a Path,
        output: &'a Path,
    ) -> BoxFuture<'a, Result<TransformStatus>> {
        Box::pin(async move {
            tools.run_to_file(Tool::Jpegoptim, &self.arguments(input), output).await?;
            Ok(TransformStatus::Produced)
        })
    }
}
