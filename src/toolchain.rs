//! # Toolchain Module
//!
//! Risolve una volta sola (pre-flight) i tool esterni richiesti e li invoca
//! come processi figli con `tokio::process::Command`.
//!
//! ## Tool richiesti:
//! | Tool        | Uso                                             |
//! |-------------|-------------------------------------------------|
//! | `jpegoptim` | Ricompressione JPEG lossy + strip metadata      |
//! | `pngquant`  | Quantizzazione palette PNG                      |
//! | `convert`   | Split/merge TIFF, resize, bit depth, DPI        |
//! | `identify`  | Probing dimensioni / profondità / DPI           |
//! | `gs`        | Riscrittura PDF con preset di qualità           |
//! | `gifsicle`  | Ottimizzazione frame/palette GIF                |
//!
//! Nessuno stato globale: il `Toolchain` viene creato dal controller e passato
//! per riferimento ai worker.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use tokio::process::Command;
use tracing::{debug, error, warn};

use crate::error::OptimizeError;
use crate::tool_resolver::ToolPathResolver;

/// External binaries the pipeline depends on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tool {
    Jpegoptim,
    Pngquant,
    Convert,
    Identify,
    Ghostscript,
    Gifsicle,
}

impl Tool {
    pub const ALL: [Tool; 6] = [
        Tool::Jpegoptim,
        Tool::Pngquant,
        Tool::Convert,
        Tool::Identify,
        Tool::Ghostscript,
        Tool::Gifsicle,
    ];

    pub fn binary_name(&self) -> &'static str {
        match self {
            Tool::Jpegoptim => "jpegoptim",
            Tool::Pngquant => "pngquant",
            Tool::Convert => "convert",
            Tool::Identify => "identify",
            Tool::Ghostscript => "gs",
            Tool::Gifsicle => "gifsicle",
        }
    }
}

/// Resolved paths of every required tool
#[derive(Debug, Clone)]
pub struct Toolchain {
    paths: HashMap<Tool, PathBuf>,
}

impl Toolchain {
    /// Resolve all tools, failing with every missing one listed
    pub fn resolve(resolver: &ToolPathResolver) -> Result<Self, OptimizeError> {
        let mut paths = HashMap::new();
        let mut missing = Vec::new();

        for tool in Tool::ALL {
            match resolver.check_tool_with_instructions(tool.binary_name()) {
                Ok(path) => {
                    paths.insert(tool, path);
                }
                Err(msg) => {
                    error!("{}", msg);
                    missing.push(tool.binary_name().to_string());
                }
            }
        }

        if missing.is_empty() {
            Ok(Self { paths })
        } else {
            Err(OptimizeError::MissingDependency(missing))
        }
    }

    /// Resolve all tools from a single directory
    pub fn from_dir(dir: &Path) -> Result<Self, OptimizeError> {
        Self::resolve(&ToolPathResolver::with_search_path(None, vec![dir.to_path_buf()]))
    }

    pub fn path(&self, tool: Tool) -> &Path {
        // Every tool is inserted by `resolve`, the fallback is never taken
        self.paths
            .get(&tool)
            .map(PathBuf::as_path)
            .unwrap_or_else(|| Path::new(tool.binary_name()))
    }

    fn command(&self, tool: Tool, args: &[OsString]) -> Command {
        debug!("Running {} {:?}", tool.binary_name(), args);
        let mut command = Command::new(self.path(tool));
        command.args(args).stdin(Stdio::null());
        command
    }

    /// Run a tool and return its exit status
    pub async fn run_status(&self, tool: Tool, args: &[OsString]) -> Result<ExitStatus> {
        let start_time = std::time::Instant::now();
        let output = self
            .command(tool, args)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await
            .with_context(|| format!("Failed to spawn {}", tool.binary_name()))?;

        debug!("{} finished in {:?} with {}", tool.binary_name(), start_time.elapsed(), output.status);
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            if !stderr.trim().is_empty() {
                debug!("{} stderr: {}", tool.binary_name(), stderr.trim());
            }
        }
        Ok(output.status)
    }

    /// Run a tool, treating a non-zero exit as an error
    pub async fn run(&self, tool: Tool, args: &[OsString]) -> Result<()> {
        let status = self.run_status(tool, args).await?;
        if status.success() {
            Ok(())
        } else {
            warn!("{} failed with {}", tool.binary_name(), status);
            Err(OptimizeError::ToolFailed {
                tool: tool.binary_name().to_string(),
                status,
            }
            .into())
        }
    }

    /// Run a tool that writes its result on stdout, saving it to `output_path`
    pub async fn run_to_file(&self, tool: Tool, args: &[OsString], output_path: &Path) -> Result<()> {
        let output = self
            .command(tool, args)
            .stderr(Stdio::piped())
            .output()
            .await
            .with_context(|| format!("Failed to spawn {}", tool.binary_name()))?;

        if !output.status.success() {
            warn!("{} failed with {}", tool.binary_name(), output.status);
            return Err(OptimizeError::ToolFailed {
                tool: tool.binary_name().to_string(),
                status: output.status,
            }
            .into());
        }

        tokio::fs::write(output_path, output.stdout).await?;
        Ok(())
    }

    /// Run a tool and capture its stdout as text
    pub async fn capture(&self, tool: Tool, args: &[OsString]) -> Result<String> {
        let output = self
            .command(tool, args)
            .stderr(Stdio::null())
            .output()
            .await
            .with_context(|| format!("Failed to spawn {}", tool.binary_name()))?;

        if !output.status.success() {
            return Err(OptimizeError::ToolFailed {
                tool: tool.binary_name().to_string(),
                status: output.status,
            }
            .into());
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
