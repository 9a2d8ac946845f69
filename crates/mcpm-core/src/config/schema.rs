//! Structural validation of scope files.
//!
//! Only the subtrees this crate owns are checked; anything else in the file is
//! client-private and allowed.

use serde_json::{Map, Value};

use crate::types::{DISABLED_KEY, TransportType};

pub const ENABLED_ARRAY_KEY: &str = "enabledMcpjsonServers";
pub const DISABLED_ARRAY_KEY: &str = "disabledMcpjsonServers";

/// Where a scope file keeps its servers mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSchema {
    pub servers_path: Vec<String>,
}

impl FileSchema {
    pub fn new(servers_path: &[&str]) -> Self {
        Self {
            servers_path: servers_path.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// `{ "mcpServers": { ... } }`
    pub fn mcp_servers() -> Self {
        Self::new(&["mcpServers"])
    }

    /// `{ "servers": { ... } }`
    pub fn servers() -> Self {
        Self::new(&["servers"])
    }

    pub fn servers_key(&self) -> String {
        self.servers_path.join(".")
    }
}

/// Validate `root` against `schema`, returning one message per violation.
pub fn validate(root: &Map<String, Value>, schema: &FileSchema) -> Vec<String> {
    let mut errors = Vec::new();
    let key = schema.servers_key();

    match lookup(root, &schema.servers_path) {
        None | Some(Value::Null) => {}
        Some(Value::Object(servers)) => {
            for (id, entry) in servers {
                validate_entry(&key, id, entry, &mut errors);
            }
        }
        Some(_) => errors.push(format!("'{key}' must be an object")),
    }

    for array_key in [ENABLED_ARRAY_KEY, DISABLED_ARRAY_KEY] {
        match root.get(array_key) {
            None | Some(Value::Null) => {}
            Some(Value::Array(items)) => {
                if items.iter().any(|item| !item.is_string()) {
                    errors.push(format!("'{array_key}' must contain only strings"));
                }
            }
            Some(_) => errors.push(format!("'{array_key}' must be an array of strings")),
        }
    }

    errors
}

fn lookup<'a>(root: &'a Map<String, Value>, path: &[String]) -> Option<&'a Value> {
    let (first, rest) = path.split_first()?;
    let mut value = root.get(first)?;
    for segment in rest {
        value = value.as_object()?.get(segment)?;
    }
    Some(value)
}

fn validate_entry(key: &str, id: &str, entry: &Value, errors: &mut Vec<String>) {
    let Some(fields) = entry.as_object() else {
        errors.push(format!("{key}.{id}: entry must be an object"));
        return;
    };

    if let Some(command) = fields.get("command")
        && !command.is_string()
    {
        errors.push(format!("{key}.{id}.command: must be a string"));
    }
    if let Some(args) = fields.get("args") {
        let ok = args
            .as_array()
            .is_some_and(|items| items.iter().all(Value::is_string));
        if !ok {
            errors.push(format!("{key}.{id}.args: must be an array of strings"));
        }
    }
    if let Some(env) = fields.get("env") {
        let ok = env
            .as_object()
            .is_some_and(|vars| vars.values().all(Value::is_string));
        if !ok {
            errors.push(format!("{key}.{id}.env: must map names to strings"));
        }
    }
    if let Some(transport) = fields.get("type") {
        let known = transport
            .as_str()
            .is_some_and(|t| TransportType::ALL.iter().any(|k| k.as_str() == t));
        if !known {
            errors.push(format!(
                "{key}.{id}.type: must be one of stdio, websocket, http"
            ));
        }
    }
    if let Some(disabled) = fields.get(DISABLED_KEY)
        && !disabled.is_boolean()
    {
        errors.push(format!("{key}.{id}.disabled: must be a boolean"));
    }
}
