//! Shared core types used across scopes, clients and the manager.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ErrorKind, McpmError};

/// Key of the inline disabled flag on a server entry.
pub const DISABLED_KEY: &str = "disabled";

/// Transport type of a server definition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportType {
    #[default]
    Stdio,
    Websocket,
    Http,
}

impl TransportType {
    pub const ALL: [TransportType; 3] = [
        TransportType::Stdio,
        TransportType::Websocket,
        TransportType::Http,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TransportType::Stdio => "stdio",
            TransportType::Websocket => "websocket",
            TransportType::Http => "http",
        }
    }

    pub fn is_remote(self) -> bool {
        !matches!(self, TransportType::Stdio)
    }
}

impl fmt::Display for TransportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransportType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "stdio" => Ok(TransportType::Stdio),
            "websocket" | "ws" => Ok(TransportType::Websocket),
            "http" => Ok(TransportType::Http),
            other => Err(format!(
                "unknown transport type '{other}' (expected stdio, websocket or http)"
            )),
        }
    }
}

/// On-disk definition of one MCP server.
///
/// Unknown per-entry keys are kept in `extra` so rewriting an entry never drops
/// client-private fields. The inline `disabled` flag is scope bookkeeping and is
/// never part of a `ServerConfig`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub command: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,

    #[serde(rename = "type", default)]
    pub transport: TransportType,

    /// Endpoint for remote transports.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ServerConfig {
    pub fn stdio(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
            ..Self::default()
        }
    }

    pub fn remote(transport: TransportType, url: impl Into<String>) -> Self {
        Self {
            transport,
            url: Some(url.into()),
            ..Self::default()
        }
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Parse a raw on-disk entry.
    pub fn from_entry(entry: &Value) -> Result<Self, String> {
        if !entry.is_object() {
            return Err("server entry must be a JSON object".to_string());
        }
        let mut config: ServerConfig =
            serde_json::from_value(entry.clone()).map_err(|e| e.to_string())?;
        config.extra.remove(DISABLED_KEY);
        Ok(config)
    }

    /// Render as a raw on-disk entry.
    pub fn to_entry(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|_| Value::Object(Map::new()))
    }

    /// Client-independent checks.
    pub fn generic_issues(&self) -> Vec<String> {
        let mut issues = Vec::new();
        match self.transport {
            TransportType::Stdio => {
                if self.command.trim().is_empty() {
                    issues.push("missing required field 'command'".to_string());
                }
            }
            TransportType::Websocket | TransportType::Http => {
                let has_url = self.url.as_deref().is_some_and(|u| !u.trim().is_empty());
                if !has_url && self.command.trim().is_empty() {
                    issues.push(format!(
                        "transport '{}' requires a 'url' or a 'command'",
                        self.transport
                    ));
                }
            }
        }
        if self.env.keys().any(|k| k.trim().is_empty()) {
            issues.push("environment variable names must not be empty".to_string());
        }
        issues
    }
}

/// State of a server within one scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServerState {
    Enabled,
    Disabled,
    NotInstalled,
}

impl ServerState {
    pub fn as_str(self) -> &'static str {
        match self {
            ServerState::Enabled => "ENABLED",
            ServerState::Disabled => "DISABLED",
            ServerState::NotInstalled => "NOT_INSTALLED",
        }
    }
}

impl fmt::Display for ServerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServerState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "enabled" => Ok(ServerState::Enabled),
            "disabled" => Ok(ServerState::Disabled),
            "not_installed" => Ok(ServerState::NotInstalled),
            other => Err(format!(
                "unknown state '{other}' (expected enabled, disabled or not_installed)"
            )),
        }
    }
}

/// Static description of one scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeConfig {
    pub name: String,
    pub description: String,
    /// Lower means higher precedence.
    pub priority: i32,
    /// `None` for virtual scopes.
    pub path: Option<PathBuf>,
    pub is_user_level: bool,
    pub is_project_level: bool,
    pub readonly: bool,
}

impl ScopeConfig {
    pub fn user(name: &str, description: &str, priority: i32, path: PathBuf) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            priority,
            path: Some(path),
            is_user_level: true,
            is_project_level: false,
            readonly: false,
        }
    }

    pub fn project(name: &str, description: &str, priority: i32, path: PathBuf) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            priority,
            path: Some(path),
            is_user_level: false,
            is_project_level: true,
            readonly: false,
        }
    }

    pub fn virtual_scope(name: &str, description: &str, priority: i32) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            priority,
            path: None,
            is_user_level: false,
            is_project_level: false,
            readonly: true,
        }
    }

    pub fn with_readonly(mut self, readonly: bool) -> Self {
        self.readonly = readonly;
        self
    }

    pub fn is_virtual(&self) -> bool {
        self.path.is_none()
    }
}

/// `client:scope:id`, unique across the system.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QualifiedId {
    pub client: String,
    pub scope: String,
    pub id: String,
}

impl QualifiedId {
    pub fn new(client: &str, scope: &str, id: &str) -> Self {
        Self {
            client: client.to_string(),
            scope: scope.to_string(),
            id: id.to_string(),
        }
    }
}

impl fmt::Display for QualifiedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.client, self.scope, self.id)
    }
}

impl FromStr for QualifiedId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(3, ':');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(client), Some(scope), Some(id))
                if !client.is_empty() && !scope.is_empty() && !id.is_empty() =>
            {
                Ok(QualifiedId::new(client, scope, id))
            }
            _ => Err(format!("invalid qualified id '{s}' (expected client:scope:id)")),
        }
    }
}

/// Resolved view of one server in one scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerInfo {
    pub id: String,
    pub client: String,
    pub scope: String,
    pub state: ServerState,
    /// Raw on-disk entry.
    pub config: Value,
    pub priority: i32,
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<String>,
}

impl ServerInfo {
    pub fn qualified_id(&self) -> QualifiedId {
        QualifiedId::new(&self.client, &self.scope, &self.id)
    }

    /// Parsed config, if the raw entry is well formed.
    pub fn server_config(&self) -> Option<ServerConfig> {
        ServerConfig::from_entry(&self.config).ok()
    }
}

/// Outcome of every mutating operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationResult {
    pub success: bool,
    pub message: String,
    #[serde(default)]
    pub errors: Vec<String>,
    #[serde(default)]
    pub data: Map<String, Value>,
}

impl OperationResult {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            errors: Vec::new(),
            data: Map::new(),
        }
    }

    pub fn failure(message: impl Into<String>, errors: Vec<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            errors,
            data: Map::new(),
        }
    }

    pub fn from_error(error: &McpmError) -> Self {
        Self::failure(error.to_string(), vec![error.to_error_string()])
    }

    pub fn with_data(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.data.insert(key.to_string(), value.into());
        self
    }

    /// Prefix the message of a failed result with routing context.
    pub fn in_context(mut self, context: &str) -> Self {
        if !self.success {
            self.message = format!("{context}: {}", self.message);
        }
        self
    }

    pub fn has_error(&self, kind: ErrorKind) -> bool {
        let prefix = format!("{}:", kind.as_str());
        self.errors.iter().any(|e| e.starts_with(&prefix))
    }

    pub fn changed(&self) -> bool {
        self.data
            .get("changed")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}

impl From<McpmError> for OperationResult {
    fn from(error: McpmError) -> Self {
        Self::from_error(&error)
    }
}
