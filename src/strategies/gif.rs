//! GIF: frame and palette optimization with `gifsicle`.

use anyhow::Result;
use futures::future::BoxFuture;
use std::ffi::OsString;
use std::path::Path;

use super::FormatStrategy;
use crate::args;
use crate::format::FormatKind;
use crate::safe_replace::TransformStatus;
use crate::toolchain::{Tool, Toolchain};

pub struct GifStrategy {
    level: u8,
}

impl GifStrategy {
    pub fn new(level: u8) -> Self {
        Self { level }
    }

    pub fn arguments(&self, input: &Path, output: &Path) -> Vec<OsString> {
        args![format!("-O{}", self.level), input, "-o", output]
    }
}

impl FormatStrategy for GifStrategy {
    fn kind(&self) -> FormatKind {
        FormatKind::Gif
    }

    fn transform<'a>(
        &'a self,
        tools: &'a Toolchain,
        input: &'a Path,
        output: &'a Path,
    ) -> BoxFuture<'a, Result<TransformStatus>> {
        Box::pin(async move {
            tools.run(Tool::Gifsicle, &self.arguments(input, output)).await?;
            Ok(TransformStatus::Produced)
        })
    }
}
