//! Inline `disabled: true` flag on the server entry itself.

use serde_json::Value;

use crate::config::ScopeFile;
use crate::error::{McpmError, Result};
use crate::types::DISABLED_KEY;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineStrategy {
    file: ScopeFile,
}

impl InlineStrategy {
    pub fn new(file: ScopeFile) -> Self {
        Self { file }
    }

    pub fn is_disabled(&self, id: &str) -> Result<bool> {
        let servers = self.file.read_servers()?;
        Ok(servers.get(id).is_some_and(entry_is_disabled))
    }

    pub fn disable(&self, id: &str) -> Result<bool> {
        self.file.update_servers(|servers| {
            let entry = servers
                .get_mut(id)
                .ok_or_else(|| McpmError::not_found(id, self.location()))?;
            if entry_is_disabled(entry) {
                return Ok(false);
            }
            let fields = entry.as_object_mut().ok_or_else(|| {
                McpmError::Validation(vec![format!("server '{id}' entry is not an object")])
            })?;
            fields.insert(DISABLED_KEY.to_string(), Value::Bool(true));
            Ok(true)
        })
    }

    /// Removes the flag entirely rather than writing `false`.
    pub fn enable(&self, id: &str) -> Result<bool> {
        self.file.update_servers(|servers| {
            let entry = servers
                .get_mut(id)
                .ok_or_else(|| McpmError::not_found(id, self.location()))?;
            Ok(clear_inline_flag(entry))
        })
    }

    fn location(&self) -> String {
        format!("in {}", self.file.path().display())
    }
}

pub(crate) fn entry_is_disabled(entry: &Value) -> bool {
    entry.get(DISABLED_KEY).and_then(Value::as_bool) == Some(true)
}

/// Drop the `disabled` key; reports whether the entry changed.
pub(crate) fn clear_inline_flag(entry: &mut Value) -> bool {
    entry
        .as_object_mut()
        .is_some_and(|fields| fields.shift_remove(DISABLED_KEY).is_some())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FileSchema;
    use serde_json::json;
    use tempfile::TempDir;

    fn setup(content: Value) -> (TempDir, InlineStrategy, ScopeFile) {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(".mcp.json");
        std::fs::write(&path, serde_json::to_vec_pretty(&content).unwrap()).unwrap();
        let file = ScopeFile::new(path, FileSchema::mcp_servers());
        (temp, InlineStrategy::new(file.clone()), file)
    }

    #[test]
    fn disable_sets_flag_and_enable_removes_key() {
        let (_temp, strategy, file) = setup(json!({"mcpServers": {"a": {"command": "x"}}}));

        assert!(strategy.disable("a").unwrap());
        assert!(strategy.is_disabled("a").unwrap());
        assert_eq!(file.read_servers().unwrap()["a"]["disabled"], json!(true));

        assert!(strategy.enable("a").unwrap());
        assert!(!strategy.is_disabled("a").unwrap());
        assert_eq!(file.read_servers().unwrap()["a"], json!({"command": "x"}));
    }

    #[test]
    fn repeated_calls_do_not_write() {
        let (_temp, strategy, _file) = setup(json!({"mcpServers": {"a": {"command": "x"}}}));
        assert!(strategy.disable("a").unwrap());
        assert!(!strategy.disable("a").unwrap());
        assert!(strategy.enable("a").unwrap());
        assert!(!strategy.enable("a").unwrap());
    }

    #[test]
    fn absent_server_fails_both_ways() {
        let (_temp, strategy, _file) = setup(json!({"mcpServers": {}}));
        assert!(strategy.disable("missing").is_err());
        assert!(strategy.enable("missing").is_err());
    }
}
