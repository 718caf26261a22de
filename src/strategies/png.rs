//! PNG: palette quantization with `pngquant`.
//!
//! `pngquant` exits with 98 when the result would be larger (`--skip-if-larger`)
//! and 99 when the quality floor cannot be met; both mean "no output", not failure.

use anyhow::Result;
use futures::future::BoxFuture;
use std::ffi::OsString;
use std::path::Path;
use tracing::warn;

use super::FormatStrategy;
use crate::args;
use crate::error::OptimizeError;
use crate::format::FormatKind;
use crate::safe_replace::TransformStatus;
use crate::toolchain::{Tool, Toolchain};

const EXIT_TOO_LARGE: i32 = 98;
const EXIT_QUALITY_TOO_LOW: i32 = 99;

pub struct PngStrategy {
    quality_min: u8,
    quality_max: u8,
}

impl PngStrategy {
    pub fn new(quality_min: u8, quality_max: u8) -> Self {
        Self { quality_min, quality_max }
    }

    pub fn arguments(&self, input: &Path, output: &Path) -> Vec<OsString> {
        args![
            format!("--quality={}-{}", self.quality_min, self.quality_max),
            "--skip-if-larger",
            "--strip",
            "--force",
            "--output",
            output,
            input,
        ]
    }
}

impl FormatStrategy for PngStrategy {
    fn kind(&self) -> FormatKind {
        FormatKind::Png
    }

    fn transform<'a>(
        &'a self,
        tools: &'a Toolchain,
        input: &'a Path,
        output: &'a Path,
    ) -> BoxFuture<'a, Result<TransformStatus>> {
        Box::pin(async move {
            let status = tools.run_status(Tool::Pngquant, &self.arguments(input, output)).await?;
            match status.code() {
                Some(0) => Ok(TransformStatus::Produced),
                Some(EXIT_TOO_LARGE) | Some(EXIT_QUALITY_TOO_LOW) => Ok(TransformStatus::Declined),
                _ => {
                    warn!("pngquant failed with {}", status);
                    Err(OptimizeError::ToolFailed {
                        tool: Tool::Pngquant.binary_name().to_string(),
                        status,
                    }
                    .into())
                }
            }
        })
    }
}
