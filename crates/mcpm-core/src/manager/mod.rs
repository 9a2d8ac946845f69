//! Stateful façade used by frontends.
//!
//! The manager resolves which client an operation targets (explicit name or the
//! default client) and routes through the [`ClientRegistry`], which adds client
//! context to failures.

pub mod rescope;

use serde::Serialize;

use crate::catalog::Catalog;
use crate::client::registry::{ClientInfo, ClientRegistry};
use crate::client::{ClientContext, ClientKind};
use crate::error::{McpmError, Result};
use crate::scope::ScopeInfo;
use crate::settings::McpmSettings;
use crate::status::StatusSummary;
use crate::types::{OperationResult, QualifiedId, ServerConfig, ServerInfo, ServerState};

pub use rescope::RescopeOptions;

/// Where a server was found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerLocation {
    pub client: String,
    pub scope: String,
    pub qualified_id: String,
}

#[derive(Debug)]
pub struct Manager {
    registry: ClientRegistry,
    catalog: Catalog,
    default_client: Option<String>,
}

impl Manager {
    /// Wrap a registry, picking the default client automatically.
    pub fn new(registry: ClientRegistry, catalog: Catalog) -> Self {
        let default_client = detect_default_client(&registry);
        Self {
            registry,
            catalog,
            default_client,
        }
    }

    /// Build the built-in clients the settings enable, with their path overrides.
    pub fn from_settings(ctx: ClientContext, settings: &McpmSettings) -> anyhow::Result<Self> {
        let catalog = match &settings.catalog {
            Some(path) => Catalog::from_path(&ctx.resolve(path))?,
            None => Catalog::builtin()?,
        };

        let mut registry = ClientRegistry::new(ctx, settings.path_overrides());
        for kind in ClientKind::ALL {
            if settings.is_client_enabled(kind.name()) {
                registry.register_factory(kind.name(), move |ctx, overrides| {
                    kind.build(ctx, overrides)
                });
            } else {
                tracing::debug!(client = kind.name(), "client disabled in settings");
            }
        }

        let mut manager = Self::new(registry, catalog);
        if let Some(preferred) = &settings.default_client {
            if manager.registry.has_client(preferred) {
                manager.default_client = Some(preferred.clone());
            } else {
                tracing::warn!(client = %preferred, "configured default client is unavailable");
            }
        }
        Ok(manager)
    }

    pub fn registry(&self) -> &ClientRegistry {
        &self.registry
    }

    /// Mutable access for registering or injecting clients.
    pub fn registry_mut(&mut self) -> &mut ClientRegistry {
        &mut self.registry
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn default_client(&self) -> Option<&str> {
        self.default_client.as_deref()
    }

    pub fn set_default_client(&mut self, name: &str) -> OperationResult {
        if !self.registry.has_client(name) {
            return McpmError::UnknownClient(name.to_string()).into();
        }
        self.default_client = Some(name.to_string());
        OperationResult::ok(format!("Default client set to '{name}'")).with_data("client", name)
    }

    pub fn get_available_clients(&self) -> Vec<&str> {
        self.registry.get_available_clients()
    }

    /// Info for the named client, or the default one.
    pub fn get_client_info(&self, client: Option<&str>) -> Result<ClientInfo> {
        let name = match client {
            Some(name) => name.to_string(),
            None => self.resolve_client(None)?.to_string(),
        };
        self.registry
            .get_client_info(&name)
            .ok_or(McpmError::UnknownClient(name))
    }

    pub fn client_infos(&self) -> Vec<ClientInfo> {
        self.registry.client_infos()
    }

    fn resolve_client<'a>(&'a self, client: Option<&'a str>) -> Result<&'a str> {
        match client.or(self.default_client.as_deref()) {
            Some(name) if self.registry.has_client(name) => Ok(name),
            Some(name) => Err(McpmError::UnknownClient(name.to_string())),
            None => Err(McpmError::UnknownClient(
                "(none: no client given and no default client available)".to_string(),
            )),
        }
    }

    /// Clients to search: the named one, or the default first and then the rest.
    fn search_order<'a>(&'a self, client: Option<&'a str>) -> Result<Vec<&'a str>> {
        if let Some(name) = client {
            return Ok(vec![self.resolve_client(Some(name))?]);
        }
        let mut order: Vec<&str> = self.default_client.as_deref().into_iter().collect();
        order.extend(
            self.registry
                .get_available_clients()
                .into_iter()
                .filter(|name| Some(*name) != self.default_client.as_deref()),
        );
        Ok(order)
    }

    /// Servers of one client, or of every client when none is named.
    ///
    /// Without a client, `scope` filters by scope name across all clients.
    pub fn list_servers(
        &self,
        client: Option<&str>,
        scope: Option<&str>,
        state: Option<ServerState>,
    ) -> Result<Vec<ServerInfo>> {
        let servers = match client {
            Some(name) => self.registry.client(name)?.list_servers(scope)?,
            None => {
                if let Some(scope) = scope
                    && !self.registry.get_available_clients().into_iter().any(|name| {
                        self.registry
                            .client(name)
                            .is_ok_and(|c| c.get_scope_handler(scope).is_some())
                    })
                {
                    return Err(McpmError::UnknownScope {
                        client: "(any available client)".to_string(),
                        scope: scope.to_string(),
                    });
                }
                self.registry
                    .list_all_servers()
                    .into_iter()
                    .filter(|s| scope.is_none_or(|scope| s.scope == scope))
                    .collect()
            }
        };
        Ok(servers
            .into_iter()
            .filter(|s| state.is_none_or(|state| s.state == state))
            .collect())
    }

    /// Highest-priority entry for `id`: the named client, else the default client
    /// and then every other client.
    pub fn get_server_info(&self, id: &str, client: Option<&str>) -> Result<Option<ServerInfo>> {
        for name in self.search_order(client)? {
            let found = self
                .registry
                .client(name)?
                .list_servers(None)?
                .into_iter()
                .find(|s| s.id == id);
            if found.is_some() {
                return Ok(found);
            }
        }
        Ok(None)
    }

    pub fn add_server(
        &self,
        id: &str,
        config: &ServerConfig,
        scope: &str,
        client: Option<&str>,
    ) -> OperationResult {
        match self.resolve_client(client) {
            Ok(name) => self.registry.add_server(name, id, config, scope),
            Err(err) => err.into(),
        }
    }

    pub fn update_server(
        &self,
        id: &str,
        config: &ServerConfig,
        scope: &str,
        client: Option<&str>,
    ) -> OperationResult {
        match self.resolve_client(client) {
            Ok(name) => self.registry.update_server(name, id, config, scope),
            Err(err) => err.into(),
        }
    }

    pub fn remove_server(&self, id: &str, scope: &str, client: Option<&str>) -> OperationResult {
        match self.resolve_client(client) {
            Ok(name) => self.registry.remove_server(name, id, scope),
            Err(err) => err.into(),
        }
    }

    pub fn enable_server(
        &self,
        id: &str,
        scope: Option<&str>,
        client: Option<&str>,
    ) -> OperationResult {
        match self.resolve_client(client) {
            Ok(name) => self.registry.enable_server(name, id, scope),
            Err(err) => err.into(),
        }
    }

    pub fn disable_server(
        &self,
        id: &str,
        scope: Option<&str>,
        client: Option<&str>,
    ) -> OperationResult {
        match self.resolve_client(client) {
            Ok(name) => self.registry.disable_server(name, id, scope),
            Err(err) => err.into(),
        }
    }

    pub fn get_server_state(&self, id: &str, client: Option<&str>) -> Result<ServerState> {
        let name = self.resolve_client(client)?;
        self.registry.get_server_state(name, id)
    }

    /// Single best match: default client first, then the others, each by scope priority.
    pub fn find_server_location(&self, id: &str) -> Result<Option<ServerLocation>> {
        for name in self.search_order(None)? {
            let plugin = self.registry.client(name)?;
            if let Some(handler) = plugin.find_server_scopes(id)?.first() {
                return Ok(Some(ServerLocation {
                    client: name.to_string(),
                    scope: handler.name().to_string(),
                    qualified_id: QualifiedId::new(name, handler.name(), id).to_string(),
                }));
            }
        }
        Ok(None)
    }

    pub fn get_scopes_for_client(&self, client: Option<&str>) -> Result<Vec<ScopeInfo>> {
        let name = self.resolve_client(client)?;
        Ok(self
            .registry
            .client(name)?
            .handlers()
            .iter()
            .map(|h| h.info())
            .collect())
    }

    pub fn get_status_summary(&self) -> StatusSummary {
        StatusSummary::collect(
            &self.registry.list_all_servers(),
            &self.registry.client_infos(),
            self.default_client(),
            self.catalog.stats(),
        )
    }

    /// Add a catalog package under `id` (defaults to the entry id).
    pub fn add_from_catalog(
        &self,
        entry_id: &str,
        id: Option<&str>,
        scope: &str,
        client: Option<&str>,
    ) -> OperationResult {
        let Some(entry) = self.catalog.get(entry_id) else {
            return McpmError::not_found(entry_id, "in the catalog").into();
        };
        let id = id.unwrap_or(&entry.id);
        self.add_server(id, &entry.server_config(), scope, client)
            .with_data("catalog_entry", entry.id.as_str())
    }

    /// Move `id` into `target_scope`, consolidating every copy in the client.
    pub fn rescope(
        &self,
        id: &str,
        target_scope: &str,
        client: Option<&str>,
        options: RescopeOptions,
    ) -> OperationResult {
        let resolved = self
            .resolve_client(client)
            .and_then(|name| self.registry.client(name).map(|plugin| (name, plugin)));
        match resolved {
            Ok((name, plugin)) => {
                rescope::rescope(plugin, id, target_scope, options).in_context(name)
            }
            Err(err) => err.into(),
        }
    }
}

/// Preference order among installed clients, else the first available.
fn detect_default_client(registry: &ClientRegistry) -> Option<String> {
    let available = registry.get_available_clients();
    let preferred = ClientKind::ALL.iter().map(|kind| kind.name()).find(|name| {
        registry
            .get_client(name)
            .is_some_and(|plugin| plugin.is_installed())
    });
    preferred
        .or_else(|| available.first().copied())
        .map(str::to_string)
}
