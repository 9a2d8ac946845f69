//! Shadow file holding disabled entries for formats with no native flag.
//!
//! Moving an entry always writes the destination first and only then removes it
//! from the source, so a failed write never loses the entry.

use serde_json::{Map, Value};

use crate::config::ScopeFile;
use crate::error::{McpmError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShadowStrategy {
    active: ScopeFile,
    shadow: ScopeFile,
}

impl ShadowStrategy {
    pub fn new(active: ScopeFile, shadow: ScopeFile) -> Self {
        Self { active, shadow }
    }

    pub fn shadow_file(&self) -> &ScopeFile {
        &self.shadow
    }

    pub fn is_disabled(&self, id: &str) -> Result<bool> {
        self.shadow.contains(id)
    }

    pub fn disabled_servers(&self) -> Result<Map<String, Value>> {
        self.shadow.read_servers()
    }

    pub fn disable(&self, id: &str) -> Result<bool> {
        move_entry(id, &self.active, &self.shadow)
    }

    pub fn enable(&self, id: &str) -> Result<bool> {
        move_entry(id, &self.shadow, &self.active)
    }

    /// Drop `id` from the shadow file.
    pub fn forget(&self, id: &str) -> Result<bool> {
        if !self.shadow.exists() {
            return Ok(false);
        }
        self.shadow
            .update_servers(|servers| Ok(servers.shift_remove(id).is_some()))
    }
}

fn move_entry(id: &str, from: &ScopeFile, to: &ScopeFile) -> Result<bool> {
    let mut from_root = from.load()?;
    let mut from_servers = from.servers(&from_root)?;

    let Some(entry) = from_servers.get(id).cloned() else {
        if to.contains(id)? {
            return Ok(false);
        }
        return Err(McpmError::not_found(
            id,
            format!(
                "in {} or {}",
                from.path().display(),
                to.path().display()
            ),
        ));
    };

    let mut to_root = to.load()?;
    let mut to_servers = to.servers(&to_root)?;
    to_servers.insert(id.to_string(), entry);
    to.store(&mut to_root, to_servers)?;
    to.save(&to_root)?;

    from_servers.shift_remove(id);
    from.store(&mut from_root, from_servers)?;
    from.save(&from_root)?;

    tracing::debug!(
        server = id,
        from = %from.path().display(),
        to = %to.path().display(),
        "moved server entry"
    );
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FileSchema;
    use crate::config::paths::shadow_path_for;
    use serde_json::json;
    use tempfile::TempDir;

    fn setup(content: Value) -> (TempDir, ShadowStrategy, ScopeFile, ScopeFile) {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("claude_desktop_config.json");
        std::fs::write(&path, serde_json::to_vec_pretty(&content).unwrap()).unwrap();
        let active = ScopeFile::new(path.clone(), FileSchema::mcp_servers());
        let shadow = ScopeFile::new(shadow_path_for(&path), FileSchema::mcp_servers());
        let strategy = ShadowStrategy::new(active.clone(), shadow.clone());
        (temp, strategy, active, shadow)
    }

    #[test]
    fn disable_then_enable_moves_entry_intact() {
        let entry = json!({"command": "npx", "args": ["-y", "pkg"], "env": {"K": "V"}});
        let (_temp, strategy, active, shadow) =
            setup(json!({"globalShortcut": "x", "mcpServers": {"g": entry.clone()}}));

        assert!(strategy.disable("g").unwrap());
        assert!(!active.contains("g").unwrap());
        assert_eq!(shadow.read_servers().unwrap()["g"], entry);
        assert!(strategy.is_disabled("g").unwrap());
        assert_eq!(active.load().unwrap()["globalShortcut"], json!("x"));

        assert!(strategy.enable("g").unwrap());
        assert!(!shadow.contains("g").unwrap());
        assert_eq!(active.read_servers().unwrap()["g"], entry);
    }

    #[test]
    fn repeated_moves_are_noops() {
        let (_temp, strategy, _active, _shadow) =
            setup(json!({"mcpServers": {"g": {"command": "x"}}}));
        assert!(strategy.disable("g").unwrap());
        assert!(!strategy.disable("g").unwrap());
        assert!(strategy.enable("g").unwrap());
        assert!(!strategy.enable("g").unwrap());
    }

    #[test]
    fn failed_destination_write_leaves_source_untouched() {
        let (_temp, strategy, active, shadow) =
            setup(json!({"mcpServers": {"g": {"command": "x"}}}));
        // A directory in place of the shadow file makes the move fail.
        std::fs::create_dir_all(shadow.path()).unwrap();
        let before = std::fs::read(active.path()).unwrap();

        assert!(strategy.disable("g").is_err());
        assert_eq!(std::fs::read(active.path()).unwrap(), before);
    }

    #[test]
    fn absent_everywhere_is_not_found() {
        let (_temp, strategy, _active, _shadow) = setup(json!({"mcpServers": {}}));
        let err = strategy.disable("nope").unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::NotFound);
    }
}
