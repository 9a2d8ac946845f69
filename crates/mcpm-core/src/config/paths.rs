//! Config path resolution helpers.

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

use crate::error::{McpmError, Result};

/// Scope name to file path, replacing a client's default locations.
pub type PathOverrides = BTreeMap<String, PathBuf>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Platform {
    MacOs,
    Windows,
    Linux,
    Other(String),
}

impl Platform {
    pub fn current() -> Self {
        Self::from_os(std::env::consts::OS)
    }

    pub fn from_os(os: &str) -> Self {
        match os {
            "macos" => Platform::MacOs,
            "windows" => Platform::Windows,
            "linux" => Platform::Linux,
            other => Platform::Other(other.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Platform::MacOs => "macos",
            Platform::Windows => "windows",
            Platform::Linux => "linux",
            Platform::Other(name) => name,
        }
    }

    pub fn ensure_supported(&self) -> Result<()> {
        match self {
            Platform::Other(name) => Err(McpmError::UnsupportedPlatform(name.clone())),
            _ => Ok(()),
        }
    }
}

/// Per-user application config directory for desktop-style clients.
///
/// - macOS: `~/Library/Application Support`
/// - Windows: `%APPDATA%` (required)
/// - Linux: `~/.config`
pub fn user_config_dir(
    platform: &Platform,
    home_dir: &Path,
    appdata: Option<&Path>,
) -> Result<PathBuf> {
    match platform {
        Platform::MacOs => Ok(home_dir.join("Library").join("Application Support")),
        Platform::Windows => appdata.map(Path::to_path_buf).ok_or_else(|| {
            McpmError::Settings("APPDATA is not set; cannot resolve user config directory".into())
        }),
        Platform::Linux => Ok(home_dir.join(".config")),
        Platform::Other(name) => Err(McpmError::UnsupportedPlatform(name.clone())),
    }
}

/// Resolve `~` against `home_dir` and relative paths against `base`.
pub fn resolve_path(raw: &Path, home_dir: &Path, base: &Path) -> PathBuf {
    let expanded = match raw.strip_prefix("~") {
        Ok(rest) => home_dir.join(rest),
        Err(_) if raw.is_absolute() => raw.to_path_buf(),
        Err(_) => base.join(raw),
    };
    normalize(&expanded)
}

/// Drop `.` components without touching the filesystem.
fn normalize(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

/// Sibling file holding disabled entries: `config.json` -> `config.disabled.json`.
pub fn shadow_path_for(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "config".to_string());
    let file_name = match path.extension() {
        Some(ext) => format!("{stem}.disabled.{}", ext.to_string_lossy()),
        None => format!("{stem}.disabled"),
    };
    path.with_file_name(file_name)
}

/// Whether a file at `path` could be created: the nearest existing ancestor
/// must be a writable directory.
pub fn parent_is_creatable(path: &Path) -> bool {
    let mut current = path.parent();
    while let Some(dir) = current {
        if dir.as_os_str().is_empty() {
            return true;
        }
        match std::fs::metadata(dir) {
            Ok(meta) => return meta.is_dir() && !meta.permissions().readonly(),
            Err(_) => current = dir.parent(),
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn desktop_dirs_per_platform() {
        let home = Path::new("/home/u");
        assert_eq!(
            user_config_dir(&Platform::MacOs, home, None).unwrap(),
            PathBuf::from("/home/u/Library/Application Support")
        );
        assert_eq!(
            user_config_dir(&Platform::Linux, home, None).unwrap(),
            PathBuf::from("/home/u/.config")
        );
        assert_eq!(
            user_config_dir(&Platform::Windows, home, Some(Path::new("/appdata"))).unwrap(),
            PathBuf::from("/appdata")
        );
        assert!(user_config_dir(&Platform::Windows, home, None).is_err());
        assert!(user_config_dir(&Platform::from_os("haiku"), home, None).is_err());
    }

    #[test]
    fn resolves_tilde_and_relative_paths() {
        let home = Path::new("/home/u");
        let base = Path::new("/work/project");
        assert_eq!(
            resolve_path(Path::new("~/.claude.json"), home, base),
            PathBuf::from("/home/u/.claude.json")
        );
        assert_eq!(
            resolve_path(Path::new("./.mcp.json"), home, base),
            PathBuf::from("/work/project/.mcp.json")
        );
        assert_eq!(
            resolve_path(Path::new("/etc/mcp.json"), home, base),
            PathBuf::from("/etc/mcp.json")
        );
    }

    #[test]
    fn shadow_file_is_a_sibling() {
        assert_eq!(
            shadow_path_for(Path::new("/a/claude_desktop_config.json")),
            PathBuf::from("/a/claude_desktop_config.disabled.json")
        );
        assert_eq!(
            shadow_path_for(Path::new("/home/u/.claude.json")),
            PathBuf::from("/home/u/.claude.disabled.json")
        );
    }
}
