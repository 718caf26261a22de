//! # Aggressive Passes
//!
//! Dopo la trasformazione primaria, i formati raster possono subire fino a tre
//! pass aggiuntivi, sempre in quest'ordine:
//!
//! 1. **Resize**: lato lungo > `max_dimension` → ridimensionamento proporzionale
//! 2. **Bit depth**: profondità > `max_bit_depth` → riduzione a 8 bit
//! 3. **DPI**: densità > `max_dpi` → metadata di risoluzione riscritti
//!
//! Ogni pass riesamina il file corrente ed è a sua volta un SafeReplace.
//! Un pass che non si applica non produce nessuna riga nel log di audit.
//! Un pass che fallisce viene registrato con la propria label e interrompe i
//! pass successivi, senza toccare l'esito della trasformazione primaria.

use anyhow::Result;
use std::ffi::OsString;
use std::path::Path;
use tracing::{debug, warn};

use super::{record_failure, JobContext};
use crate::args;
use crate::config::Config;
use crate::format::FormatKind;
use crate::probe::{probe, ImageInfo};
use crate::safe_replace::{safe_replace, TransformStatus};
use crate::toolchain::{Tool, Toolchain};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass {
    Resize,
    BitDepth,
    Density,
}

impl Pass {
    pub const ORDER: [Pass; 3] = [Pass::Resize, Pass::BitDepth, Pass::Density];

    pub fn name(&self) -> &'static str {
        match self {
            Pass::Resize => "resize",
            Pass::BitDepth => "bit depth",
            Pass::Density => "DPI",
        }
    }

    /// `convert` operators for this pass, or `None` if the image is already within limits
    pub fn plan(&self, info: &ImageInfo, config: &Config) -> Option<Vec<OsString>> {
        match self {
            Pass::Resize => {
                let longest = info.longest_side()?;
                (longest > config.max_dimension).then(|| {
                    let max = config.max_dimension;
                    args!["-resize", format!("{}x{}>", max, max)]
                })
            }
            Pass::BitDepth => {
                let depth = info.depth?;
                (depth > u32::from(config.max_bit_depth)).then(|| args!["-depth", config.max_bit_depth])
            }
            Pass::Density => {
                let density = info.density?;
                (density > f64::from(config.max_dpi))
                    .then(|| args!["-units", "PixelsPerInch", "-density", config.max_dpi])
            }
        }
    }
}

/// Run every applicable pass on `path`. Returns `true` if any pass replaced the file.
pub async fn run(ctx: &JobContext, kind: FormatKind, path: &Path) -> bool {
    let mut replaced_any = false;

    for pass in Pass::ORDER {
        let info = probe(&ctx.tools, path).await;
        let Some(operators) = pass.plan(&info, &ctx.config) else {
            debug!("{} pass not needed for {}", pass.name(), path.display());
            continue;
        };

        let label = format!("{} {}", kind.label(), pass.name());
        let tools = &ctx.tools;
        let operators = &operators;
        let result = safe_replace(path, &label, &ctx.log, |scratch| async move {
            convert(tools, path, operators, &scratch).await
        })
        .await;

        match result {
            Ok(outcome) => replaced_any |= outcome.is_replaced(),
            Err(e) => {
                warn!("{} pass aborted for {}: {:#}", label, path.display(), e);
                record_failure(&ctx.log, &label, path).await;
                break;
            }
        }
    }

    replaced_any
}

async fn convert(tools: &Toolchain, input: &Path, operators: &[OsString], output: &Path) -> Result<TransformStatus> {
    let mut args = args![input];
    args.extend_from_slice(operators);
    args.push(output.as_os_str().to_os_string());
    tools.run(Tool::Convert, &args).await?;
    Ok(TransformStatus::Produced)
}
