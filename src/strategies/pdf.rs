//! PDF: rewrite through Ghostscript's `pdfwrite` device with a fixed preset.

use anyhow::Result;
use futures::future::BoxFuture;
use std::ffi::OsString;
use std::path::Path;

use super::FormatStrategy;
use crate::args;
use crate::config::PdfPreset;
use crate::format::FormatKind;
use crate::safe_replace::TransformStatus;
use crate::toolchain::{Tool, Toolchain};
use crate::utils::prefixed_path_arg;

pub struct PdfStrategy {
    preset: PdfPreset,
}

impl PdfStrategy {
    pub fn new(preset: PdfPreset) -> Self {
        Self { preset }
    }

    pub fn arguments(&self, input: &Path, output: &Path) -> Vec<OsString> {
        args![
            "-sDEVICE=pdfwrite",
            "-dCompatibilityLevel=1.4",
            format!("-dPDFSETTINGS={}", self.preset.as_gs_setting()),
            "-dNOPAUSE",
            "-dQUIET",
            "-dBATCH",
            prefixed_path_arg("-sOutputFile=", output),
            input,
        ]
    }
}

impl FormatStrategy for PdfStrategy {
    fn kind(&self) -> FormatKind {
        FormatKind::Pdf
    }

    fn transform<'a>(
        &'a self,
        tools: &'a Toolchain,
        input: &'a Path,
        output: &'a Path,
    ) -> BoxFuture<'a, Result<TransformStatus>> {
        Box::pin(async move {
            tools.run(Tool::Ghostscript, &self.arguments(input, output)).await?;
            Ok(TransformStatus::Produced)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_selects_pdfsettings() {
        let input = Path::new("doc.pdf");
        let output = Path::new("out.pdf");

        let ebook = PdfStrategy::new(PdfPreset::Ebook).arguments(input, output);
        assert!(ebook.contains(&OsString::from("-dPDFSETTINGS=/ebook")));
        assert!(ebook.contains(&OsString::from("-sOutputFile=out.pdf")));
        assert_eq!(ebook.last().and_then(|arg| arg.to_str()), Some("doc.pdf"));

        let screen = PdfStrategy::new(PdfPreset::Screen).arguments(input, output);
        assert!(screen.contains(&OsString::from("-dPDFSETTINGS=/screen")));
    }
}
