//! Atomic JSON config file access.
//!
//! Files are always read in full, mutated in the relevant subtree and written back
//! in full, so keys this crate does not know about survive every rewrite.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::error::{McpmError, Result};

/// Read a JSON object from `path`.
///
/// A missing (or whitespace-only) file reads as an empty object.
pub fn read_json_map(path: &Path) -> Result<Map<String, Value>> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(err)
            if matches!(
                err.kind(),
                std::io::ErrorKind::NotFound | std::io::ErrorKind::NotADirectory
            ) =>
        {
            return Ok(Map::new());
        }
        Err(err) => return Err(McpmError::io(path, err)),
    };
    tracing::debug!(path = %path.display(), bytes = content.len(), "read config file");
    if content.trim().is_empty() {
        return Ok(Map::new());
    }
    let value: Value = serde_json::from_str(&content).map_err(|e| McpmError::MalformedConfig {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(McpmError::MalformedConfig {
            path: path.to_path_buf(),
            reason: "expected a JSON object at the root".to_string(),
        }),
    }
}

/// Atomically replace `path` with the pretty-printed `map`.
///
/// The content goes to a sibling temporary file which is synced and then renamed
/// over the target, so readers see either the old or the new file. Parent
/// directories are created as needed and existing permissions are kept. A symlinked
/// config is written through to the file it points at.
pub fn write_json_map(path: &Path, map: &Map<String, Value>) -> Result<()> {
    let resolved = resolve_link(path)?;
    let path = resolved.as_path();
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent).map_err(|e| McpmError::io(parent, e))?;

    let mut content = serde_json::to_string_pretty(map).map_err(|e| McpmError::Io {
        path: path.to_path_buf(),
        source: std::io::Error::new(std::io::ErrorKind::InvalidData, e),
    })?;
    content.push('\n');

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "config".to_string());
    let mut tmp = tempfile::Builder::new()
        .prefix(&format!(".{file_name}."))
        .suffix(".tmp")
        .tempfile_in(parent)
        .map_err(|e| McpmError::io(parent, e))?;

    tmp.write_all(content.as_bytes())
        .map_err(|e| McpmError::io(tmp.path(), e))?;
    if let Ok(meta) = std::fs::metadata(path) {
        tmp.as_file()
            .set_permissions(meta.permissions())
            .map_err(|e| McpmError::io(tmp.path(), e))?;
    }
    tmp.as_file()
        .sync_all()
        .map_err(|e| McpmError::io(tmp.path(), e))?;
    tmp.persist(path).map_err(|e| McpmError::io(path, e.error))?;

    tracing::debug!(path = %path.display(), bytes = content.len(), "wrote config file");
    Ok(())
}

fn resolve_link(path: &Path) -> Result<PathBuf> {
    match std::fs::symlink_metadata(path) {
        Ok(meta) if meta.file_type().is_symlink() => match std::fs::canonicalize(path) {
            Ok(target) => Ok(target),
            // Dangling link: create the file it names.
            Err(_) => {
                let target = std::fs::read_link(path).map_err(|e| McpmError::io(path, e))?;
                Ok(match path.parent() {
                    Some(parent) if target.is_relative() => parent.join(target),
                    _ => target,
                })
            }
        },
        _ => Ok(path.to_path_buf()),
    }
}

/// Extract the servers mapping stored at `key_path`; absent keys read as empty.
pub fn servers_at(
    file: &Path,
    root: &Map<String, Value>,
    key_path: &[String],
) -> Result<Map<String, Value>> {
    let mut current = root;
    for (idx, segment) in key_path.iter().enumerate() {
        let Some(value) = current.get(segment) else {
            return Ok(Map::new());
        };
        match value {
            Value::Object(map) if idx + 1 == key_path.len() => return Ok(map.clone()),
            Value::Object(map) => current = map,
            Value::Null => return Ok(Map::new()),
            _ => {
                return Err(McpmError::MalformedConfig {
                    path: file.to_path_buf(),
                    reason: format!("expected '{segment}' to be a JSON object"),
                });
            }
        }
    }
    Ok(current.clone())
}

/// Store `servers` at `key_path`, creating intermediate objects.
pub fn set_servers_at(
    file: &Path,
    root: &mut Map<String, Value>,
    key_path: &[String],
    servers: Map<String, Value>,
) -> Result<()> {
    let Some((last, parents)) = key_path.split_last() else {
        *root = servers;
        return Ok(());
    };
    let mut current = root;
    for segment in parents {
        let next = current
            .entry(segment.clone())
            .or_insert_with(|| Value::Object(Map::new()));
        if next.is_null() {
            *next = Value::Object(Map::new());
        }
        current = match next {
            Value::Object(map) => map,
            _ => {
                return Err(McpmError::MalformedConfig {
                    path: file.to_path_buf(),
                    reason: format!("expected '{segment}' to be a JSON object"),
                });
            }
        };
    }
    current.insert(last.clone(), Value::Object(servers));
    Ok(())
}
