//! Aggregated overview of every server across every client.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::catalog::CatalogStats;
use crate::client::registry::ClientInfo;
use crate::types::{ServerInfo, ServerState};

/// Summary counts for quick overview
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusSummary {
    pub total: usize,
    pub by_state: BTreeMap<ServerState, usize>,
    pub by_client: BTreeMap<String, usize>,
    /// Entries with validation issues.
    pub invalid: usize,
    pub clients: Vec<String>,
    pub unavailable_clients: Vec<String>,
    pub default_client: Option<String>,
    pub catalog: CatalogStats,
}

impl StatusSummary {
    pub fn collect(
        servers: &[ServerInfo],
        clients: &[ClientInfo],
        default_client: Option<&str>,
        catalog: CatalogStats,
    ) -> Self {
        let mut by_state = BTreeMap::new();
        let mut by_client = BTreeMap::new();
        for server in servers {
            *by_state.entry(server.state).or_insert(0) += 1;
            *by_client.entry(server.client.clone()).or_insert(0) += 1;
        }

        let (available, unavailable): (Vec<&ClientInfo>, Vec<&ClientInfo>) =
            clients.iter().partition(|c| c.available);

        Self {
            total: servers.len(),
            by_state,
            by_client,
            invalid: servers.iter().filter(|s| !s.valid).count(),
            clients: available.iter().map(|c| c.name.clone()).collect(),
            unavailable_clients: unavailable.iter().map(|c| c.name.clone()).collect(),
            default_client: default_client.map(str::to_string),
            catalog,
        }
    }

    pub fn count(&self, state: ServerState) -> usize {
        self.by_state.get(&state).copied().unwrap_or(0)
    }
}
