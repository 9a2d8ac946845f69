//! Client registry for discovering and routing to client plugins.
//!
//! Each client is built once when registered. A failed construction is kept
//! alongside the healthy clients so frontends can show why a client is missing.

use std::collections::BTreeMap;

use serde::Serialize;

use super::{ClientContext, ClientKind, ClientPlugin};
use crate::config::PathOverrides;
use crate::error::{McpmError, Result};
use crate::scope::ScopeInfo;
use crate::types::{OperationResult, ServerConfig, ServerInfo, ServerState};

/// Summary of one registered client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientInfo {
    pub name: String,
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub scopes: Vec<ScopeInfo>,
    pub installed: bool,
}

#[derive(Debug)]
struct Slot {
    name: String,
    plugin: std::result::Result<ClientPlugin, McpmError>,
}

/// Registry of client plugins, in registration order.
#[derive(Debug)]
pub struct ClientRegistry {
    ctx: ClientContext,
    overrides: BTreeMap<String, PathOverrides>,
    slots: Vec<Slot>,
}

impl ClientRegistry {
    /// Create an empty registry.
    pub fn new(ctx: ClientContext, overrides: BTreeMap<String, PathOverrides>) -> Self {
        Self {
            ctx,
            overrides,
            slots: Vec::new(),
        }
    }

    /// Create a registry with every built-in client.
    pub fn with_builtin_clients(
        ctx: ClientContext,
        overrides: BTreeMap<String, PathOverrides>,
    ) -> Self {
        let mut registry = Self::new(ctx, overrides);
        for kind in ClientKind::ALL {
            registry
                .register_factory(kind.name(), move |ctx, overrides| kind.build(ctx, overrides));
        }
        registry
    }

    pub fn context(&self) -> &ClientContext {
        &self.ctx
    }

    /// Build a client with this registry's context and its path overrides.
    ///
    /// Construction errors are captured, not returned. Registering an existing
    /// name replaces that client.
    pub fn register_factory<F>(&mut self, name: &str, factory: F)
    where
        F: FnOnce(&ClientContext, Option<&PathOverrides>) -> Result<ClientPlugin>,
    {
        let plugin = factory(&self.ctx, self.overrides.get(name));
        if let Err(err) = &plugin {
            tracing::warn!(client = name, error = %err, "client unavailable");
        }
        self.put(name, plugin);
    }

    /// Replace or add a ready-made client.
    pub fn inject_client_instance(&mut self, name: &str, plugin: ClientPlugin) {
        self.put(name, Ok(plugin));
    }

    fn put(&mut self, name: &str, plugin: std::result::Result<ClientPlugin, McpmError>) {
        match self.slots.iter_mut().find(|slot| slot.name == name) {
            Some(slot) => slot.plugin = plugin,
            None => self.slots.push(Slot {
                name: name.to_string(),
                plugin,
            }),
        }
    }

    /// Names of every client that constructed successfully.
    pub fn get_available_clients(&self) -> Vec<&str> {
        self.slots
            .iter()
            .filter(|slot| slot.plugin.is_ok())
            .map(|slot| slot.name.as_str())
            .collect()
    }

    /// Every registered name, including unavailable clients.
    pub fn client_names(&self) -> Vec<&str> {
        self.slots.iter().map(|slot| slot.name.as_str()).collect()
    }

    pub fn has_client(&self, name: &str) -> bool {
        self.get_client(name).is_some()
    }

    pub fn get_client(&self, name: &str) -> Option<&ClientPlugin> {
        self.slots
            .iter()
            .find(|slot| slot.name == name)
            .and_then(|slot| slot.plugin.as_ref().ok())
    }

    /// Like [`Self::get_client`], failing with `UnknownClient`.
    pub fn client(&self, name: &str) -> Result<&ClientPlugin> {
        self.get_client(name)
            .ok_or_else(|| McpmError::UnknownClient(name.to_string()))
    }

    pub fn get_client_info(&self, name: &str) -> Option<ClientInfo> {
        let slot = self.slots.iter().find(|slot| slot.name == name)?;
        Some(match &slot.plugin {
            Ok(plugin) => ClientInfo {
                name: slot.name.clone(),
                available: true,
                error: None,
                scopes: plugin.handlers().iter().map(|h| h.info()).collect(),
                installed: plugin.is_installed(),
            },
            Err(err) => ClientInfo {
                name: slot.name.clone(),
                available: false,
                error: Some(err.to_error_string()),
                scopes: Vec::new(),
                installed: false,
            },
        })
    }

    pub fn client_infos(&self) -> Vec<ClientInfo> {
        self.slots
            .iter()
            .filter_map(|slot| self.get_client_info(&slot.name))
            .collect()
    }

    /// Servers of every available client, client by client in priority order.
    pub fn list_all_servers(&self) -> Vec<ServerInfo> {
        let mut servers = Vec::new();
        for slot in &self.slots {
            let Ok(plugin) = &slot.plugin else {
                continue;
            };
            match plugin.list_servers(None) {
                Ok(found) => servers.extend(found),
                Err(err) => {
                    tracing::warn!(client = %slot.name, error = %err, "failed to list servers")
                }
            }
        }
        servers
    }

    fn route<F>(&self, client: &str, op: F) -> OperationResult
    where
        F: FnOnce(&ClientPlugin) -> OperationResult,
    {
        match self.client(client) {
            Ok(plugin) => op(plugin).in_context(client),
            Err(err) => err.into(),
        }
    }

    pub fn add_server(
        &self,
        client: &str,
        id: &str,
        config: &ServerConfig,
        scope: &str,
    ) -> OperationResult {
        self.route(client, |plugin| plugin.add_server(id, config, scope))
    }

    pub fn update_server(
        &self,
        client: &str,
        id: &str,
        config: &ServerConfig,
        scope: &str,
    ) -> OperationResult {
        self.route(client, |plugin| plugin.update_server(id, config, scope))
    }

    pub fn remove_server(&self, client: &str, id: &str, scope: &str) -> OperationResult {
        self.route(client, |plugin| plugin.remove_server(id, scope))
    }

    pub fn enable_server(&self, client: &str, id: &str, scope: Option<&str>) -> OperationResult {
        self.route(client, |plugin| plugin.enable_server(id, scope))
    }

    pub fn disable_server(&self, client: &str, id: &str, scope: Option<&str>) -> OperationResult {
        self.route(client, |plugin| plugin.disable_server(id, scope))
    }

    pub fn get_server_state(&self, client: &str, id: &str) -> Result<ServerState> {
        self.client(client)?.get_server_state(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::path::PathBuf;

    fn test_ctx() -> ClientContext {
        ClientContext::new(PathBuf::from("/home/u"), PathBuf::from("/work")).with_test_mode(true)
    }

    #[test]
    fn construction_errors_are_captured_per_client() {
        let registry = ClientRegistry::with_builtin_clients(test_ctx(), BTreeMap::new());

        assert!(registry.get_available_clients().is_empty());
        assert_eq!(registry.client_names().len(), 4);

        let info = registry.get_client_info("cursor").unwrap();
        assert!(!info.available);
        assert!(info.error.unwrap().starts_with("TestModeViolation:"));
    }

    #[test]
    fn unknown_client_routing_fails() {
        let registry = ClientRegistry::new(test_ctx(), BTreeMap::new());
        let result = registry.remove_server("zed", "a", "user");
        assert!(!result.success);
        assert!(result.has_error(ErrorKind::UnknownClient));
        assert!(registry.get_client_info("zed").is_none());
    }

    #[test]
    fn injected_instance_replaces_failed_client() {
        let mut registry = ClientRegistry::with_builtin_clients(test_ctx(), BTreeMap::new());
        registry.inject_client_instance(
            "cursor",
            ClientPlugin::new("cursor", Vec::new(), Default::default()),
        );
        assert_eq!(registry.get_available_clients(), vec!["cursor"]);
        assert!(registry.has_client("cursor"));
    }
}
