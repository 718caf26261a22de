//! # Tool Path Resolver
//!
//! This module handles finding the external optimization tools:
//! - A bundle directory named by the `TOOLS_DIR` environment variable
//! - System-installed tools on `PATH`

use std::env;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Tool path resolver for bundled and system-installed binaries
pub struct ToolPathResolver {
    /// Directory checked before `PATH` (from `TOOLS_DIR`)
    tools_dir: Option<PathBuf>,
    /// Directories from `PATH`, in order
    search_path: Vec<PathBuf>,
}

impl ToolPathResolver {
    /// Create a resolver from the process environment
    pub fn new() -> Self {
        let tools_dir = env::var_os("TOOLS_DIR")
            .map(PathBuf::from)
            .filter(|dir| dir.is_dir());
        if let Some(ref dir) = tools_dir {
            debug!("Using tools directory from TOOLS_DIR: {:?}", dir);
        }

        let search_path = env::var_os("PATH")
            .map(|paths| env::split_paths(&paths).collect())
            .unwrap_or_default();

        Self { tools_dir, search_path }
    }

    /// Create a resolver that only looks in the given directories
    pub fn with_search_path(tools_dir: Option<PathBuf>, search_path: Vec<PathBuf>) -> Self {
        Self { tools_dir, search_path }
    }

    /// Resolve the path to a specific tool
    pub fn resolve_tool(&self, tool_name: &str) -> Option<PathBuf> {
        if let Some(ref tools_dir) = self.tools_dir {
            let bundled = Self::executable_in(tools_dir, tool_name);
            if bundled.is_file() {
                debug!("Using bundled tool: {} -> {:?}", tool_name, bundled);
                return Some(bundled);
            }
        }

        let found = self
            .search_path
            .iter()
            .map(|dir| Self::executable_in(dir, tool_name))
            .find(|path| path.is_file());

        match found {
            Some(path) => {
                debug!("Using system tool: {} -> {:?}", tool_name, path);
                Some(path)
            }
            None => {
                warn!("Tool not found: {}", tool_name);
                None
            }
        }
    }

    fn executable_in(dir: &Path, tool_name: &str) -> PathBuf {
        let extension = if cfg!(windows) { ".exe" } else { "" };
        dir.join(format!("{}{}", tool_name, extension))
    }

    /// Check if a specific tool is available
    pub fn is_tool_available(&self, tool_name: &str) -> bool {
        self.resolve_tool(tool_name).is_some()
    }

    /// Package that provides a tool, for the distribution's package manager
    pub fn package_for(tool_name: &str) -> &'static str {
        match tool_name {
            "jpegoptim" => "jpegoptim",
            "pngquant" => "pngquant",
            "convert" | "identify" => "imagemagick",
            "gs" => "ghostscript",
            "gifsicle" => "gifsicle",
            _ => "",
        }
    }

    /// Check if a tool is available and provide installation instructions if not
    pub fn check_tool_with_instructions(&self, tool_name: &str) -> Result<PathBuf, String> {
        if let Some(path) = self.resolve_tool(tool_name) {
            return Ok(path);
        }

        let package = Self::package_for(tool_name);
        if package.is_empty() {
            Err(format!("Tool '{}' not found in PATH.", tool_name))
        } else {
            Err(format!(
                "Tool '{}' not found in PATH.\n\
                 Install the '{}' package, or run with --install-dependencies",
                tool_name, package
            ))
        }
    }

    /// Get a report of tool availability
    pub fn get_tools_report(&self, tool_names: &[&str]) -> String {
        let mut report = String::from("Tool availability:\n");
        if let Some(ref dir) = self.tools_dir {
            report.push_str(&format!("Bundled tools dir: {:?}\n", dir));
        }

        for tool in tool_names {
            match self.resolve_tool(tool) {
                Some(path) => report.push_str(&format!("  ✅ {} -> {:?}\n", tool, path)),
                None => report.push_str(&format!(
                    "  ❌ {} (package: {})\n",
                    tool,
                    Self::package_for(tool)
                )),
            }
        }

        report
    }
}

impl Default for ToolPathResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_bundled_dir_takes_precedence() {
        let bundle = TempDir::new().unwrap();
        let system = TempDir::new().unwrap();
        std::fs::write(bundle.path().join("gifsicle"), "").unwrap();
        std::fs::write(system.path().join("gifsicle"), "").unwrap();

        let resolver = ToolPathResolver::with_search_path(
            Some(bundle.path().to_path_buf()),
            vec![system.path().to_path_buf()],
        );
        assert_eq!(resolver.resolve_tool("gifsicle"), Some(bundle.path().join("gifsicle")));
    }

    #[test]
    fn test_search_path_order() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        std::fs::write(second.path().join("gs"), "").unwrap();

        let resolver = ToolPathResolver::with_search_path(
            None,
            vec![first.path().to_path_buf(), second.path().to_path_buf()],
        );
        assert_eq!(resolver.resolve_tool("gs"), Some(second.path().join("gs")));
        assert!(!resolver.is_tool_available("pngquant"));
    }

    #[test]
    fn test_missing_tool_instructions() {
        let resolver = ToolPathResolver::with_search_path(None, Vec::new());
        let err = resolver.check_tool_with_instructions("identify").unwrap_err();
        assert!(err.contains("imagemagick"));

        let report = resolver.get_tools_report(&["gs"]);
        assert!(report.contains("❌ gs (package: ghostscript)"));
    }
}
