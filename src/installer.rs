//! # Dependency Installer
//!
//! Supporto per `--install-dependencies`: individua il package manager del
//! sistema e installa i pacchetti che forniscono i tool esterni.
//!
//! ## Package manager supportati (in ordine di ricerca):
//! apt-get, dnf, yum, pacman, zypper, brew

use anyhow::{Context, Result};
use std::process::Stdio;
use tokio::process::Command;
use tracing::info;

use crate::error::OptimizeError;
use crate::tool_resolver::ToolPathResolver;
use crate::toolchain::Tool;
use crate::utils::to_string_vec;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageManager {
    AptGet,
    Dnf,
    Yum,
    Pacman,
    Zypper,
    Brew,
}

impl PackageManager {
    pub const ALL: [PackageManager; 6] = [
        PackageManager::AptGet,
        PackageManager::Dnf,
        PackageManager::Yum,
        PackageManager::Pacman,
        PackageManager::Zypper,
        PackageManager::Brew,
    ];

    pub fn binary_name(&self) -> &'static str {
        match self {
            PackageManager::AptGet => "apt-get",
            PackageManager::Dnf => "dnf",
            PackageManager::Yum => "yum",
            PackageManager::Pacman => "pacman",
            PackageManager::Zypper => "zypper",
            PackageManager::Brew => "brew",
        }
    }

    /// First package manager found on the search path
    pub fn detect(resolver: &ToolPathResolver) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|pm| resolver.is_tool_available(pm.binary_name()))
    }

    /// Package names for jpegoptim, pngquant, ImageMagick, Ghostscript and gifsicle
    pub fn packages(&self) -> Vec<&'static str> {
        let imagemagick = match self {
            PackageManager::Dnf | PackageManager::Yum | PackageManager::Zypper => "ImageMagick",
            _ => "imagemagick",
        };
        vec!["jpegoptim", "pngquant", imagemagick, "ghostscript", "gifsicle"]
    }

    /// Non-interactive install arguments
    pub fn install_args(&self) -> Vec<String> {
        let mut args: Vec<String> = match self {
            PackageManager::AptGet | PackageManager::Dnf | PackageManager::Yum => {
                to_string_vec(["install", "-y"])
            }
            PackageManager::Pacman => to_string_vec(["-S", "--needed", "--noconfirm"]),
            PackageManager::Zypper => to_string_vec(["--non-interactive", "install"]),
            PackageManager::Brew => to_string_vec(["install"]),
        };
        args.extend(to_string_vec(self.packages()));
        args
    }
}

/// Install every external tool with the detected package manager
pub async fn install_dependencies() -> Result<()> {
    let resolver = ToolPathResolver::new();
    let manager = PackageManager::detect(&resolver).ok_or_else(|| {
        OptimizeError::Validation(
            "No supported package manager found (apt-get, dnf, yum, pacman, zypper, brew)".to_string(),
        )
    })?;

    let args = manager.install_args();
    info!("📦 Installing dependencies with {}: {}", manager.binary_name(), args.join(" "));

    let status = Command::new(manager.binary_name())
        .args(&args)
        .stdin(Stdio::inherit())
        .status()
        .await
        .with_context(|| format!("Failed to run {}", manager.binary_name()))?;

    if !status.success() {
        return Err(OptimizeError::ToolFailed {
            tool: manager.binary_name().to_string(),
            status,
        }
        .into());
    }

    let names: Vec<&str> = Tool::ALL.iter().map(Tool::binary_name).collect();
    info!("✅ Dependencies installed\n{}", ToolPathResolver::new().get_tools_report(&names));
    Ok(())
}
