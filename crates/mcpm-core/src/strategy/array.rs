//! Parallel `enabledMcpjsonServers` / `disabledMcpjsonServers` name arrays.
//!
//! The arrays live in the scope's own settings file and act as standalone
//! allow/deny lists, so an id does not need a matching servers entry.

use serde_json::{Map, Value};

use crate::config::{DISABLED_ARRAY_KEY, ENABLED_ARRAY_KEY, ScopeFile};
use crate::error::{McpmError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrayStrategy {
    file: ScopeFile,
}

impl ArrayStrategy {
    pub fn new(file: ScopeFile) -> Self {
        Self { file }
    }

    pub fn is_disabled(&self, id: &str) -> Result<bool> {
        let root = self.file.load()?;
        Ok(self.read_names(&root, DISABLED_ARRAY_KEY)?.iter().any(|n| n == id))
    }

    pub fn disabled_names(&self) -> Result<Vec<String>> {
        self.read_names(&self.file.load()?, DISABLED_ARRAY_KEY)
    }

    pub fn enabled_names(&self) -> Result<Vec<String>> {
        self.read_names(&self.file.load()?, ENABLED_ARRAY_KEY)
    }

    pub fn disable(&self, id: &str) -> Result<bool> {
        self.rewrite(|enabled, disabled| {
            enabled.retain(|n| n != id);
            if !disabled.iter().any(|n| n == id) {
                disabled.push(id.to_string());
            }
        })
    }

    pub fn enable(&self, id: &str) -> Result<bool> {
        self.rewrite(|enabled, disabled| {
            disabled.retain(|n| n != id);
            if !enabled.iter().any(|n| n == id) {
                enabled.push(id.to_string());
            }
        })
    }

    /// Drop `id` from both arrays.
    pub fn forget(&self, id: &str) -> Result<bool> {
        self.rewrite(|enabled, disabled| {
            enabled.retain(|n| n != id);
            disabled.retain(|n| n != id);
        })
    }

    /// Apply `mutate` to deduplicated copies of both arrays, then write only if
    /// the file content changes. Names left in both arrays stay disabled.
    fn rewrite<F>(&self, mutate: F) -> Result<bool>
    where
        F: FnOnce(&mut Vec<String>, &mut Vec<String>),
    {
        let mut root = self.file.load()?;
        let mut enabled = dedupe(self.read_names(&root, ENABLED_ARRAY_KEY)?);
        let mut disabled = dedupe(self.read_names(&root, DISABLED_ARRAY_KEY)?);

        mutate(&mut enabled, &mut disabled);
        enabled.retain(|n| !disabled.contains(n));

        let changed_enabled = put_names(&mut root, ENABLED_ARRAY_KEY, enabled);
        let changed_disabled = put_names(&mut root, DISABLED_ARRAY_KEY, disabled);
        if !(changed_enabled || changed_disabled) {
            return Ok(false);
        }
        self.file.save(&root)?;
        Ok(true)
    }

    /// Names stored under `key`. Anything but an array of strings is malformed, so a
    /// rewrite never silently drops foreign items.
    fn read_names(&self, root: &Map<String, Value>, key: &str) -> Result<Vec<String>> {
        let malformed = || McpmError::MalformedConfig {
            path: self.file.path().to_path_buf(),
            reason: format!("'{key}' must be an array of strings"),
        };
        match root.get(key) {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| item.as_str().map(str::to_string).ok_or_else(malformed))
                .collect(),
            Some(_) => Err(malformed()),
        }
    }
}

fn dedupe(names: Vec<String>) -> Vec<String> {
    let mut unique: Vec<String> = Vec::with_capacity(names.len());
    for name in names {
        if !unique.contains(&name) {
            unique.push(name);
        }
    }
    unique
}

/// Store `names` under `key`; an absent key stays absent when there is nothing to store.
fn put_names(root: &mut Map<String, Value>, key: &str, names: Vec<String>) -> bool {
    let next = Value::Array(names.into_iter().map(Value::String).collect());
    match root.get(key) {
        Some(current) if *current == next => false,
        None if next.as_array().is_some_and(Vec::is_empty) => false,
        _ => {
            root.insert(key.to_string(), next);
            true
        }
    }
}
