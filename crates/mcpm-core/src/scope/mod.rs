//! Scope handlers: one configuration file plus the way it records disabled servers.
//!
//! A handler owns every read and write of its scope's files. Mutations return an
//! [`OperationResult`] rather than an error so callers can report and continue.

use std::path::PathBuf;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::config::paths::{parent_is_creatable, shadow_path_for};
use crate::config::{FileSchema, ScopeFile};
use crate::error::{McpmError, Result};
use crate::strategy::inline::{clear_inline_flag, entry_is_disabled};
use crate::strategy::{
    ArrayStrategy, DisableStrategy, InlineStrategy, ShadowStrategy, StrategyKind,
};
use crate::types::{DISABLED_KEY, OperationResult, ScopeConfig, ServerConfig, ServerState};

/// One server entry as seen from inside a single scope.
#[derive(Debug, Clone, PartialEq)]
pub struct ScopeEntry {
    pub id: String,
    pub state: ServerState,
    /// Raw on-disk entry.
    pub entry: Value,
}

/// Introspection view of a scope for listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScopeInfo {
    pub name: String,
    pub description: String,
    pub priority: i32,
    pub path: Option<PathBuf>,
    pub level: &'static str,
    pub strategy: Option<StrategyKind>,
    pub exists: bool,
    pub readonly: bool,
}

#[derive(Debug, Clone)]
pub struct ScopeHandler {
    config: ScopeConfig,
    file: Option<ScopeFile>,
    strategy: Option<DisableStrategy>,
}

impl ScopeHandler {
    /// Build a handler for `config`, wiring the requested strategy to its file.
    ///
    /// Virtual scopes (no path) get neither a file nor a strategy.
    pub fn new(config: ScopeConfig, schema: FileSchema, strategy: Option<StrategyKind>) -> Self {
        let Some(path) = config.path.clone() else {
            return Self {
                config,
                file: None,
                strategy: None,
            };
        };

        let file = ScopeFile::new(path.clone(), schema.clone());
        let strategy = strategy.map(|kind| match kind {
            StrategyKind::Inline => DisableStrategy::Inline(InlineStrategy::new(file.clone())),
            StrategyKind::Array => DisableStrategy::Array(ArrayStrategy::new(file.clone())),
            StrategyKind::Shadow => DisableStrategy::Shadow(ShadowStrategy::new(
                file.clone(),
                ScopeFile::new(shadow_path_for(&path), schema),
            )),
        });

        Self {
            config,
            file: Some(file),
            strategy,
        }
    }

    pub fn config(&self) -> &ScopeConfig {
        &self.config
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn priority(&self) -> i32 {
        self.config.priority
    }

    pub fn file(&self) -> Option<&ScopeFile> {
        self.file.as_ref()
    }

    pub fn strategy(&self) -> Option<&DisableStrategy> {
        self.strategy.as_ref()
    }

    pub fn strategy_kind(&self) -> Option<StrategyKind> {
        self.strategy.as_ref().map(DisableStrategy::kind)
    }

    pub fn info(&self) -> ScopeInfo {
        let level = if self.config.is_project_level {
            "project"
        } else if self.config.is_user_level {
            "user"
        } else {
            "virtual"
        };
        ScopeInfo {
            name: self.config.name.clone(),
            description: self.config.description.clone(),
            priority: self.config.priority,
            path: self.config.path.clone(),
            level,
            strategy: self.strategy_kind(),
            exists: self.exists(),
            readonly: self.is_readonly(),
        }
    }

    fn shadow_file(&self) -> Option<&ScopeFile> {
        self.strategy
            .as_ref()
            .and_then(DisableStrategy::as_shadow)
            .map(ShadowStrategy::shadow_file)
    }

    pub fn exists(&self) -> bool {
        self.file.as_ref().is_some_and(ScopeFile::exists)
    }

    /// Whether the scope refuses mutations.
    pub fn is_readonly(&self) -> bool {
        if self.config.readonly {
            return true;
        }
        let Some(file) = &self.file else {
            return true;
        };
        match std::fs::metadata(file.path()) {
            Ok(meta) => meta.permissions().readonly(),
            Err(_) => !parent_is_creatable(file.path()),
        }
    }

    /// Raw entries of the active file, keyed by id.
    pub fn get_servers(&self) -> Result<Map<String, Value>> {
        match &self.file {
            Some(file) => file.read_servers(),
            None => Ok(Map::new()),
        }
    }

    pub fn get_server_config(&self, id: &str) -> Result<Option<ServerConfig>> {
        let Some(entry) = self.get_servers()?.get(id).cloned() else {
            return Ok(None);
        };
        ServerConfig::from_entry(&entry)
            .map(Some)
            .map_err(|e| McpmError::Validation(vec![format!("server '{id}': {e}")]))
    }

    pub fn has_server(&self, id: &str) -> Result<bool> {
        Ok(self.get_servers()?.contains_key(id))
    }

    /// Active file or shadow file holds `id`.
    pub fn is_installed(&self, id: &str) -> Result<bool> {
        if self.has_server(id)? {
            return Ok(true);
        }
        match self.shadow_file() {
            Some(shadow) => shadow.contains(id),
            None => Ok(false),
        }
    }

    /// Raw entry for `id`, from the active file first and then the shadow file.
    pub fn entry(&self, id: &str) -> Result<Option<Value>> {
        if let Some(entry) = self.get_servers()?.get(id) {
            return Ok(Some(entry.clone()));
        }
        match self.shadow_file() {
            Some(shadow) => Ok(shadow.read_servers()?.get(id).cloned()),
            None => Ok(None),
        }
    }

    /// State of `id` computed only from this scope's own entry and strategy.
    pub fn server_state(&self, id: &str) -> Result<ServerState> {
        if let Some(entry) = self.get_servers()?.get(id) {
            return self.active_state(id, entry);
        }
        match self.shadow_file() {
            Some(shadow) if shadow.contains(id)? => Ok(ServerState::Disabled),
            _ => Ok(ServerState::NotInstalled),
        }
    }

    fn active_state(&self, id: &str, entry: &Value) -> Result<ServerState> {
        if entry_is_disabled(entry) {
            return Ok(ServerState::Disabled);
        }
        match &self.strategy {
            Some(strategy) if strategy.is_disabled(id)? => Ok(ServerState::Disabled),
            _ => Ok(ServerState::Enabled),
        }
    }

    /// Every entry this scope knows about, including disabled shadow entries.
    pub fn list_entries(&self) -> Result<Vec<ScopeEntry>> {
        let active = self.get_servers()?;
        let mut entries = Vec::with_capacity(active.len());
        for (id, entry) in &active {
            entries.push(ScopeEntry {
                id: id.clone(),
                state: self.active_state(id, entry)?,
                entry: entry.clone(),
            });
        }
        if let Some(shadow) = self.shadow_file() {
            for (id, entry) in shadow.read_servers()? {
                if active.contains_key(&id) {
                    continue;
                }
                entries.push(ScopeEntry {
                    id,
                    state: ServerState::Disabled,
                    entry,
                });
            }
        }
        Ok(entries)
    }

    pub fn add_server(&self, id: &str, config: &ServerConfig) -> OperationResult {
        self.try_add(id, config)
            .unwrap_or_else(OperationResult::from)
    }

    fn try_add(&self, id: &str, config: &ServerConfig) -> Result<OperationResult> {
        let file = self.writable_file()?;
        check_config(id, config)?;
        if self.is_installed(id)? {
            return Err(McpmError::AlreadyPresent {
                id: id.to_string(),
                scope: self.config.name.clone(),
            });
        }

        file.update_servers(|servers| {
            servers.insert(id.to_string(), config.to_entry());
            Ok(true)
        })?;
        tracing::info!(server = id, scope = %self.config.name, "added server");

        Ok(self
            .result(format!("Added server '{id}' to scope '{}'", self.config.name), id)
            .with_data("changed", true))
    }

    /// Replace the definition of an existing server, keeping its enable/disable state.
    pub fn update_server(&self, id: &str, config: &ServerConfig) -> OperationResult {
        self.try_update(id, config)
            .unwrap_or_else(OperationResult::from)
    }

    fn try_update(&self, id: &str, config: &ServerConfig) -> Result<OperationResult> {
        let file = self.writable_file()?;
        check_config(id, config)?;

        let target = if file.contains(id)? {
            file
        } else {
            match self.shadow_file() {
                Some(shadow) if shadow.contains(id)? => shadow,
                _ => return Err(McpmError::not_found(id, self.location())),
            }
        };

        let changed = target.update_servers(|servers| {
            let Some(current) = servers.get_mut(id) else {
                return Ok(false);
            };
            let mut next = config.to_entry();
            if entry_is_disabled(current)
                && let Some(fields) = next.as_object_mut()
            {
                fields.insert(DISABLED_KEY.to_string(), Value::Bool(true));
            }
            if *current == next {
                return Ok(false);
            }
            *current = next;
            Ok(true)
        })?;
        if changed {
            tracing::info!(server = id, scope = %self.config.name, "updated server");
        }

        let message = if changed {
            format!("Updated server '{id}' in scope '{}'", self.config.name)
        } else {
            format!("Server '{id}' in scope '{}' is unchanged", self.config.name)
        };
        Ok(self.result(message, id).with_data("changed", changed))
    }

    /// Remove `id` from the active file and from strategy bookkeeping.
    ///
    /// Removing an absent server succeeds with `already_absent` set.
    pub fn remove_server(&self, id: &str) -> OperationResult {
        self.try_remove(id).unwrap_or_else(OperationResult::from)
    }

    fn try_remove(&self, id: &str) -> Result<OperationResult> {
        let file = self.writable_file()?;
        let was_installed = self.is_installed(id)?;

        let mut changed = file.update_servers(|servers| Ok(servers.shift_remove(id).is_some()))?;
        if let Some(strategy) = &self.strategy {
            changed |= strategy.forget(id)?;
        }

        if !was_installed {
            return Ok(self
                .result(
                    format!("Server '{id}' is not in scope '{}'", self.config.name),
                    id,
                )
                .with_data("changed", changed)
                .with_data("already_absent", true));
        }

        tracing::info!(server = id, scope = %self.config.name, "removed server");
        Ok(self
            .result(
                format!("Removed server '{id}' from scope '{}'", self.config.name),
                id,
            )
            .with_data("changed", changed)
            .with_data("already_absent", false))
    }

    pub fn enable_server(&self, id: &str) -> OperationResult {
        self.try_enable(id).unwrap_or_else(OperationResult::from)
    }

    fn try_enable(&self, id: &str) -> Result<OperationResult> {
        let file = self.writable_file()?;
        let changed = if self.server_state(id)? == ServerState::Enabled {
            false
        } else {
            let mut changed = match &self.strategy {
                Some(strategy) => strategy.enable(id)?,
                None if file.contains(id)? => false,
                None => return Err(McpmError::not_found(id, self.location())),
            };
            // A stray inline flag would keep the entry disabled whatever the strategy says.
            changed |= file.update_servers(|servers| {
                Ok(servers.get_mut(id).is_some_and(clear_inline_flag))
            })?;
            changed
        };

        let message = if changed {
            tracing::info!(server = id, scope = %self.config.name, "enabled server");
            format!("Enabled server '{id}' in scope '{}'", self.config.name)
        } else {
            format!("Server '{id}' is already enabled in scope '{}'", self.config.name)
        };
        Ok(self
            .result(message, id)
            .with_data("changed", changed)
            .with_data("state", ServerState::Enabled.as_str()))
    }

    pub fn disable_server(&self, id: &str) -> OperationResult {
        self.try_disable(id).unwrap_or_else(OperationResult::from)
    }

    fn try_disable(&self, id: &str) -> Result<OperationResult> {
        self.writable_file()?;
        let strategy = self.strategy.as_ref().ok_or_else(|| {
            McpmError::UnsupportedOperation(format!(
                "scope '{}' has no way to disable servers",
                self.config.name
            ))
        })?;
        let changed = if self.server_state(id)? == ServerState::Disabled {
            false
        } else {
            strategy.disable(id)?
        };

        let message = if changed {
            tracing::info!(server = id, scope = %self.config.name, "disabled server");
            format!("Disabled server '{id}' in scope '{}'", self.config.name)
        } else {
            format!("Server '{id}' is already disabled in scope '{}'", self.config.name)
        };
        Ok(self
            .result(message, id)
            .with_data("changed", changed)
            .with_data("state", ServerState::Disabled.as_str()))
    }

    fn writable_file(&self) -> Result<&ScopeFile> {
        match &self.file {
            Some(file) if !self.is_readonly() => Ok(file),
            _ => Err(McpmError::ReadOnlyScope(self.config.name.clone())),
        }
    }

    fn location(&self) -> String {
        format!("in scope '{}'", self.config.name)
    }

    fn result(&self, message: String, id: &str) -> OperationResult {
        OperationResult::ok(message)
            .with_data("server", id)
            .with_data("scope", self.config.name.as_str())
    }
}

fn check_config(id: &str, config: &ServerConfig) -> Result<()> {
    if id.trim().is_empty() {
        return Err(McpmError::Validation(vec![
            "server id must not be empty".to_string(),
        ]));
    }
    let issues = config.generic_issues();
    if issues.is_empty() {
        Ok(())
    } else {
        Err(McpmError::Validation(issues))
    }
}
