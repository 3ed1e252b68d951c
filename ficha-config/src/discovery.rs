//! Configuration file discovery
//!
//! Looks for `ficha.{toml,yaml,yml,json}` in the global (`~/.ficha/`) and
//! project (`./.ficha/`) directories.

use std::path::{Path, PathBuf};
use tracing::{debug, trace, warn};

/// Name of the directory holding configuration files
const CONFIG_DIR_NAME: &str = ".ficha";

/// Candidate file names, in the order they are merged within one directory
const CONFIG_FILE_NAMES: &[&str] = &["ficha.toml", "ficha.yaml", "ficha.yml", "ficha.json"];

/// A discovered configuration file
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFile {
    pub path: PathBuf,
    pub format: ConfigFormat,
    pub scope: ConfigScope,
}

/// Configuration file format detected from file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Yaml,
    Json,
}

impl ConfigFormat {
    /// Detect format from file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "yaml" | "yml" => Some(Self::Yaml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Where a configuration file was found
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConfigScope {
    /// `~/.ficha/`
    Global,
    /// `./.ficha/`
    Project,
}

/// Finds configuration files in priority order (lowest first)
#[derive(Debug, Default)]
pub struct FileDiscovery {
    project_dir: Option<PathBuf>,
    global_dir: Option<PathBuf>,
}

impl FileDiscovery {
    /// Discover using the current directory and the user's home directory
    pub fn new() -> Self {
        Self::default()
    }

    /// Discover in explicit directories instead of the resolved defaults
    pub fn with_dirs(project_dir: Option<PathBuf>, global_dir: Option<PathBuf>) -> Self {
        Self {
            project_dir,
            global_dir,
        }
    }

    /// Discover all configuration files, global before project
    pub fn discover_all(&self) -> Vec<ConfigFile> {
        let project_dir = self.project_dir.clone().or_else(Self::resolve_project_dir);
        let global_dir = self.global_dir.clone().or_else(Self::resolve_global_dir);

        let mut files = Vec::new();
        if let Some(dir) = global_dir {
            files.extend(Self::search_directory(&dir, ConfigScope::Global));
        }
        if let Some(dir) = project_dir {
            files.extend(Self::search_directory(&dir, ConfigScope::Project));
        }

        // Stable: keeps candidate order within a scope
        files.sort_by_key(|f| f.scope);

        debug!("Discovered {} configuration files", files.len());
        files
    }

    fn search_directory(dir: &Path, scope: ConfigScope) -> Vec<ConfigFile> {
        if !dir.exists() {
            trace!("Directory does not exist: {}", dir.display());
            return Vec::new();
        }
        if !dir.is_dir() {
            warn!("Path exists but is not a directory: {}", dir.display());
            return Vec::new();
        }

        CONFIG_FILE_NAMES
            .iter()
            .map(|name| dir.join(name))
            .filter(|path| path.is_file())
            .filter_map(|path| {
                let format = ConfigFormat::from_extension(path.extension()?.to_str()?)?;
                trace!("Found config: {} ({:?})", path.display(), format);
                Some(ConfigFile {
                    path,
                    format,
                    scope,
                })
            })
            .collect()
    }

    fn resolve_project_dir() -> Option<PathBuf> {
        std::env::current_dir()
            .ok()
            .map(|dir| dir.join(CONFIG_DIR_NAME))
    }

    fn resolve_global_dir() -> Option<PathBuf> {
        dirs::home_dir().map(|dir| dir.join(CONFIG_DIR_NAME))
    }
}
