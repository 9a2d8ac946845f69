//! Client plugin layer.
//!
//! A client is a named bundle of scopes plus client-specific validation:
//! - Built-in clients (Claude Code, Claude Desktop, Cursor, VS Code) via [`ClientKind`]
//! - Extra clients through factories registered on the [`registry::ClientRegistry`]
//! - Hermetic construction through per-scope path overrides

pub mod claude_code;
pub mod claude_desktop;
pub mod cursor;
pub mod registry;
pub mod vscode;

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::paths::{resolve_path, user_config_dir};
use crate::config::{FileSchema, PathOverrides, Platform};
use crate::error::{McpmError, Result};
use crate::scope::ScopeHandler;
use crate::strategy::StrategyKind;
use crate::types::{
    OperationResult, ScopeConfig, ServerConfig, ServerInfo, ServerState, TransportType,
};

/// Environment a client resolves its default paths against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientContext {
    pub home_dir: PathBuf,
    pub project_root: PathBuf,
    pub platform: Platform,
    /// `%APPDATA%` on Windows.
    pub appdata: Option<PathBuf>,
    /// Read once from `TEST_MODE`; forbids default paths.
    pub test_mode: bool,
}

impl ClientContext {
    pub fn new(home_dir: PathBuf, project_root: PathBuf) -> Self {
        Self {
            home_dir,
            project_root,
            platform: Platform::current(),
            appdata: None,
            test_mode: false,
        }
    }

    /// Context for the running process.
    pub fn from_env() -> Result<Self> {
        let home_dir = dirs::home_dir()
            .ok_or_else(|| McpmError::Settings("could not determine home directory".into()))?;
        let project_root =
            std::env::current_dir().map_err(|e| McpmError::io(Path::new("."), e))?;

        Ok(Self {
            home_dir,
            project_root,
            platform: Platform::current(),
            appdata: std::env::var_os("APPDATA").map(PathBuf::from),
            test_mode: test_mode_enabled(std::env::var("TEST_MODE").ok().as_deref()),
        })
    }

    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    pub fn with_appdata(mut self, appdata: Option<PathBuf>) -> Self {
        self.appdata = appdata;
        self
    }

    pub fn with_test_mode(mut self, test_mode: bool) -> Self {
        self.test_mode = test_mode;
        self
    }

    /// Resolve `~` and project-relative paths to absolute ones.
    pub fn resolve(&self, raw: &Path) -> PathBuf {
        resolve_path(raw, &self.home_dir, &self.project_root)
    }

    pub fn user_config_dir(&self) -> Result<PathBuf> {
        user_config_dir(&self.platform, &self.home_dir, self.appdata.as_deref())
    }
}

/// `TEST_MODE` accepts `1`, `true` and `yes` in any case.
pub fn test_mode_enabled(value: Option<&str>) -> bool {
    value.is_some_and(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes"))
}

/// Built-in client types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClientKind {
    ClaudeCode,
    ClaudeDesktop,
    Cursor,
    #[serde(rename = "vscode")]
    VsCode,
}

impl ClientKind {
    /// Also the default-client preference order.
    pub const ALL: [ClientKind; 4] = [
        ClientKind::ClaudeCode,
        ClientKind::ClaudeDesktop,
        ClientKind::Cursor,
        ClientKind::VsCode,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ClientKind::ClaudeCode => claude_code::NAME,
            ClientKind::ClaudeDesktop => claude_desktop::NAME,
            ClientKind::Cursor => cursor::NAME,
            ClientKind::VsCode => vscode::NAME,
        }
    }

    pub fn build(
        self,
        ctx: &ClientContext,
        overrides: Option<&PathOverrides>,
    ) -> Result<ClientPlugin> {
        match self {
            ClientKind::ClaudeCode => claude_code::build(ctx, overrides),
            ClientKind::ClaudeDesktop => claude_desktop::build(ctx, overrides),
            ClientKind::Cursor => cursor::build(ctx, overrides),
            ClientKind::VsCode => vscode::build(ctx, overrides),
        }
    }
}

impl fmt::Display for ClientKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ClientKind {
    type Err = McpmError;

    fn from_str(s: &str) -> Result<Self> {
        ClientKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| McpmError::UnknownClient(s.to_string()))
    }
}

/// Where a scope's file lives when no override is given.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultPath {
    /// Relative to the home directory.
    Home(&'static str),
    /// Relative to the project root.
    Project(&'static str),
    /// Relative to the per-user application config directory.
    UserConfig(&'static str),
}

impl DefaultPath {
    fn resolve(self, ctx: &ClientContext) -> Result<PathBuf> {
        ctx.platform.ensure_supported()?;
        match self {
            DefaultPath::Home(rel) => Ok(ctx.home_dir.join(rel)),
            DefaultPath::Project(rel) => Ok(ctx.project_root.join(rel)),
            DefaultPath::UserConfig(rel) => Ok(ctx.user_config_dir()?.join(rel)),
        }
    }
}

/// Declarative description of one built-in scope.
#[derive(Debug, Clone)]
pub struct ScopeSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub priority: i32,
    pub project_level: bool,
    pub default_path: DefaultPath,
    pub schema: FileSchema,
    pub strategy: Option<StrategyKind>,
}

/// Resolve every scope's path and build its handler.
///
/// In test mode, overrides are mandatory for every scope and no default path is
/// ever computed.
pub fn build_handlers(
    client: &str,
    ctx: &ClientContext,
    overrides: Option<&PathOverrides>,
    specs: Vec<ScopeSpec>,
) -> Result<Vec<ScopeHandler>> {
    if ctx.test_mode && overrides.is_none() {
        return Err(McpmError::TestModeViolation(format!(
            "client '{client}' must be constructed with explicit path overrides"
        )));
    }
    if let Some(overrides) = overrides
        && let Some(unknown) = overrides
            .keys()
            .find(|scope| !specs.iter().any(|spec| spec.name == scope.as_str()))
    {
        return Err(McpmError::UnknownScope {
            client: client.to_string(),
            scope: unknown.clone(),
        });
    }

    let mut handlers = Vec::with_capacity(specs.len());
    for spec in specs {
        let path = match overrides.and_then(|o| o.get(spec.name)) {
            Some(path) => ctx.resolve(path),
            None if ctx.test_mode => {
                return Err(McpmError::TestModeViolation(format!(
                    "client '{client}' has no path override for scope '{}'",
                    spec.name
                )));
            }
            None => spec.default_path.resolve(ctx)?,
        };
        let config = if spec.project_level {
            ScopeConfig::project(spec.name, spec.description, spec.priority, path)
        } else {
            ScopeConfig::user(spec.name, spec.description, spec.priority, path)
        };
        handlers.push(ScopeHandler::new(config, spec.schema, spec.strategy));
    }
    Ok(handlers)
}

const PACKAGE_RUNNERS: [&str; 4] = ["npx", "uvx", "bunx", "pipx"];

/// Client-specific checks applied on top of the generic ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationRules {
    pub transports: Vec<TransportType>,
}

impl Default for ValidationRules {
    fn default() -> Self {
        Self {
            transports: TransportType::ALL.to_vec(),
        }
    }
}

impl ValidationRules {
    pub fn with_transports(transports: &[TransportType]) -> Self {
        Self {
            transports: transports.to_vec(),
        }
    }

    pub fn check(&self, client: &str, config: &ServerConfig) -> Vec<String> {
        let mut issues = Vec::new();
        if !self.transports.contains(&config.transport) {
            let allowed: Vec<&str> = self.transports.iter().map(|t| t.as_str()).collect();
            issues.push(format!(
                "client '{client}' does not support transport '{}' (allowed: {})",
                config.transport,
                allowed.join(", ")
            ));
        }

        let program = command_name(&config.command);
        if PACKAGE_RUNNERS.contains(&program) && !config.args.iter().any(|a| !a.starts_with('-')) {
            issues.push(format!("'{program}' needs a package argument"));
        }
        match program {
            "npm" => issues.push(
                "'npm' installs packages instead of running them; use 'npx -y <package>'"
                    .to_string(),
            ),
            "pip" | "pip3" => issues.push(
                "'pip' installs packages instead of running them; use 'uvx <package>' or 'pipx run <package>'"
                    .to_string(),
            ),
            _ => {}
        }
        issues
    }
}

/// File name of the program, so `/usr/bin/npx` and `npx.cmd` both read as `npx`.
fn command_name(command: &str) -> &str {
    let base = command
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(command)
        .trim();
    base.strip_suffix(".cmd")
        .or_else(|| base.strip_suffix(".exe"))
        .unwrap_or(base)
}

/// A named bundle of scope handlers.
#[derive(Debug, Clone)]
pub struct ClientPlugin {
    name: String,
    handlers: Vec<ScopeHandler>,
    rules: ValidationRules,
}

impl ClientPlugin {
    /// Handlers are kept in priority order; ties keep declaration order.
    pub fn new(
        name: impl Into<String>,
        mut handlers: Vec<ScopeHandler>,
        rules: ValidationRules,
    ) -> Self {
        handlers.sort_by_key(ScopeHandler::priority);
        Self {
            name: name.into(),
            handlers,
            rules,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rules(&self) -> &ValidationRules {
        &self.rules
    }

    pub fn handlers(&self) -> &[ScopeHandler] {
        &self.handlers
    }

    pub fn get_scopes(&self) -> Vec<&ScopeConfig> {
        self.handlers.iter().map(ScopeHandler::config).collect()
    }

    pub fn get_scope_handler(&self, scope: &str) -> Option<&ScopeHandler> {
        self.handlers.iter().find(|h| h.name() == scope)
    }

    fn handler(&self, scope: &str) -> Result<&ScopeHandler> {
        self.get_scope_handler(scope)
            .ok_or_else(|| McpmError::UnknownScope {
                client: self.name.clone(),
                scope: scope.to_string(),
            })
    }

    /// Any scope file exists on disk.
    pub fn is_installed(&self) -> bool {
        self.handlers.iter().any(ScopeHandler::exists)
    }

    /// Generic plus client-specific issues; empty means valid.
    pub fn validate_server_config(&self, config: &ServerConfig) -> Vec<String> {
        let mut issues = config.generic_issues();
        issues.extend(self.rules.check(&self.name, config));
        issues
    }

    /// Servers in priority order, each state computed from its own scope only.
    ///
    /// A scope whose file cannot be parsed is skipped with a warning.
    pub fn list_servers(&self, scope: Option<&str>) -> Result<Vec<ServerInfo>> {
        let handlers: Vec<&ScopeHandler> = match scope {
            Some(name) => vec![self.handler(name)?],
            None => self.handlers.iter().collect(),
        };

        let mut servers = Vec::new();
        for handler in handlers {
            let entries = match handler.list_entries() {
                Ok(entries) => entries,
                Err(err) => {
                    tracing::warn!(
                        client = %self.name,
                        scope = handler.name(),
                        error = %err,
                        "skipping unreadable scope"
                    );
                    continue;
                }
            };
            for entry in entries {
                let issues = match ServerConfig::from_entry(&entry.entry) {
                    Ok(config) => self.validate_server_config(&config),
                    Err(reason) => vec![reason],
                };
                servers.push(ServerInfo {
                    id: entry.id,
                    client: self.name.clone(),
                    scope: handler.name().to_string(),
                    state: entry.state,
                    config: entry.entry,
                    priority: handler.priority(),
                    valid: issues.is_empty(),
                    issues,
                });
            }
        }
        Ok(servers)
    }

    /// Scopes where `id` is installed (active or shadow file), in priority order.
    pub fn find_server_scopes(&self, id: &str) -> Result<Vec<&ScopeHandler>> {
        let mut found = Vec::new();
        for handler in &self.handlers {
            if handler.is_installed(id)? {
                found.push(handler);
            }
        }
        Ok(found)
    }

    /// State in the highest-priority scope holding `id`.
    pub fn get_server_state(&self, id: &str) -> Result<ServerState> {
        match self.find_server_scopes(id)?.first() {
            Some(handler) => handler.server_state(id),
            None => Ok(ServerState::NotInstalled),
        }
    }

    pub fn add_server(&self, id: &str, config: &ServerConfig, scope: &str) -> OperationResult {
        let handler = match self.handler(scope) {
            Ok(handler) => handler,
            Err(err) => return err.into(),
        };
        let issues = self.validate_server_config(config);
        if !issues.is_empty() {
            return OperationResult::from(McpmError::Validation(issues)).in_context(scope);
        }
        handler.add_server(id, config).in_context(scope)
    }

    pub fn update_server(&self, id: &str, config: &ServerConfig, scope: &str) -> OperationResult {
        let handler = match self.handler(scope) {
            Ok(handler) => handler,
            Err(err) => return err.into(),
        };
        let issues = self.validate_server_config(config);
        if !issues.is_empty() {
            return OperationResult::from(McpmError::Validation(issues)).in_context(scope);
        }
        handler.update_server(id, config).in_context(scope)
    }

    pub fn remove_server(&self, id: &str, scope: &str) -> OperationResult {
        match self.handler(scope) {
            Ok(handler) => handler.remove_server(id).in_context(scope),
            Err(err) => err.into(),
        }
    }

    pub fn enable_server(&self, id: &str, scope: Option<&str>) -> OperationResult {
        match self.target_scope(id, scope) {
            Ok(handler) => handler.enable_server(id).in_context(handler.name()),
            Err(err) => err.into(),
        }
    }

    pub fn disable_server(&self, id: &str, scope: Option<&str>) -> OperationResult {
        match self.target_scope(id, scope) {
            Ok(handler) => handler.disable_server(id).in_context(handler.name()),
            Err(err) => err.into(),
        }
    }

    /// The named scope, or the single scope where `id` is installed.
    fn target_scope(&self, id: &str, scope: Option<&str>) -> Result<&ScopeHandler> {
        if let Some(name) = scope {
            return self.handler(name);
        }
        let found = self.find_server_scopes(id)?;
        match found.as_slice() {
            [] => Err(McpmError::not_found(
                id,
                format!("in any scope of client '{}'", self.name),
            )),
            [only] => Ok(*only),
            many => Err(McpmError::AmbiguousScope {
                id: id.to_string(),
                scopes: many.iter().map(|h| h.name().to_string()).collect(),
            }),
        }
    }
}
