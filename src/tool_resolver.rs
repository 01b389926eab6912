//! # Tool Path Resolver
//!
//! Trova i tool esterni usati dal codec:
//! - Directory indicata da `HEIC2WEBP_TOOLS_DIR` (tool bundled)
//! - PATH di sistema

use std::env;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable pointing at a directory of bundled tools
pub const TOOLS_DIR_ENV: &str = "HEIC2WEBP_TOOLS_DIR";

/// Tool path resolver for bundled and system-installed tools
#[derive(Debug, Clone, Default)]
pub struct ToolPathResolver {
    /// Directory searched before PATH
    tools_dir: Option<PathBuf>,
}

impl ToolPathResolver {
    /// Create a resolver honoring `HEIC2WEBP_TOOLS_DIR`
    pub fn new() -> Self {
        let tools_dir = env::var_os(TOOLS_DIR_ENV)
            .map(PathBuf::from)
            .filter(|dir| dir.is_dir());
        debug!("Tools directory: {:?}", tools_dir);
        Self { tools_dir }
    }

    /// Create a resolver with an explicit tools directory
    pub fn with_tools_dir(tools_dir: impl Into<PathBuf>) -> Self {
        Self {
            tools_dir: Some(tools_dir.into()),
        }
    }

    fn executable_name(tool_name: &str) -> String {
        if cfg!(windows) {
            format!("{}.exe", tool_name)
        } else {
            tool_name.to_string()
        }
    }

    /// Resolve the path to a specific tool
    pub fn resolve_tool(&self, tool_name: &str) -> Option<PathBuf> {
        let executable = Self::executable_name(tool_name);

        if let Some(ref tools_dir) = self.tools_dir {
            let bundled = tools_dir.join(&executable);
            if bundled.is_file() {
                debug!("Using bundled tool: {} -> {:?}", tool_name, bundled);
                return Some(bundled);
            }
        }

        let found = Self::find_in_system_path(&executable);
        if found.is_none() {
            debug!("Tool not found: {}", tool_name);
        }
        found
    }

    /// Find tool in system PATH
    fn find_in_system_path(executable: &str) -> Option<PathBuf> {
        let path = env::var_os("PATH")?;
        env::split_paths(&path)
            .map(|dir| dir.join(executable))
            .find(|candidate| candidate.is_file())
    }

    /// First available tool out of `candidates`, in order of preference
    pub fn first_available(&self, candidates: &[&str]) -> Option<(String, PathBuf)> {
        candidates
            .iter()
            .find_map(|name| self.resolve_tool(name).map(|path| (name.to_string(), path)))
    }

    /// Get installation instructions for a tool on Linux
    pub fn install_instructions(tool_name: &str) -> String {
        match tool_name {
            "heif-dec" | "heif-convert" => "sudo apt-get install libheif-examples".to_string(),
            "cwebp" | "dwebp" => "sudo apt-get install webp".to_string(),
            _ => format!("sudo apt-get install {}", tool_name),
        }
    }

    /// Resolve one of `candidates` or describe how to install it
    pub fn check_tool_with_instructions(&self, candidates: &[&str]) -> Result<PathBuf, String> {
        if let Some((_, path)) = self.first_available(candidates) {
            return Ok(path);
        }

        let wanted = candidates.join(" or ");
        let primary = candidates.first().copied().unwrap_or_default();
        Err(format!(
            "Tool '{}' not found{}. To install on Linux, run: {}",
            wanted,
            self.tools_dir
                .as_deref()
                .map(|dir: &Path| format!(" in {} or PATH", dir.display()))
                .unwrap_or_else(|| " in PATH".to_string()),
            Self::install_instructions(primary)
        ))
    }
}
