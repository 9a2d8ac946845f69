//! Read-only catalog of installable MCP servers.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::types::ServerConfig;

const BUILTIN_CATALOG: &str = include_str!("catalog.toml");

/// How a catalog package is launched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Runtime {
    Npx,
    Uvx,
    Docker,
}

impl Runtime {
    pub fn as_str(self) -> &'static str {
        match self {
            Runtime::Npx => "npx",
            Runtime::Uvx => "uvx",
            Runtime::Docker => "docker",
        }
    }
}

impl fmt::Display for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub runtime: Runtime,
    /// npm/PyPI package or container image.
    pub package: String,
    /// Extra arguments after the package.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
    /// Environment the server expects; values are placeholders.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub homepage: Option<Url>,
}

impl CatalogEntry {
    /// Server definition that launches this package.
    pub fn server_config(&self) -> ServerConfig {
        let (command, mut args) = match self.runtime {
            Runtime::Npx => ("npx", vec!["-y".to_string(), self.package.clone()]),
            Runtime::Uvx => ("uvx", vec![self.package.clone()]),
            Runtime::Docker => {
                let mut args = vec!["run".to_string(), "-i".to_string(), "--rm".to_string()];
                for key in self.env.keys() {
                    args.push("-e".to_string());
                    args.push(key.clone());
                }
                args.push(self.package.clone());
                ("docker", args)
            }
        };
        args.extend(self.args.iter().cloned());

        let mut config = ServerConfig::stdio(command, args);
        config.env = self.env.clone();
        config
    }

    fn matches(&self, needle: &str) -> bool {
        self.id.to_lowercase().contains(needle)
            || self.name.to_lowercase().contains(needle)
            || self.description.to_lowercase().contains(needle)
            || self.tags.iter().any(|t| t.to_lowercase().contains(needle))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogStats {
    pub total: usize,
    pub by_runtime: BTreeMap<String, usize>,
    pub tags: usize,
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default, rename = "entry")]
    entries: Vec<CatalogEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    pub fn builtin() -> Result<Self> {
        Self::parse_str(BUILTIN_CATALOG).context("Built-in catalog is invalid")
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read catalog file: {}", path.display()))?;
        Self::parse_str(&content)
            .with_context(|| format!("Failed to parse catalog file: {}", path.display()))
    }

    pub fn parse_str(content: &str) -> Result<Self> {
        let file: CatalogFile = toml::from_str(content)?;
        let mut seen = BTreeSet::new();
        for entry in &file.entries {
            if entry.id.trim().is_empty() || entry.package.trim().is_empty() {
                anyhow::bail!("catalog entry '{}' needs an id and a package", entry.id);
            }
            if !seen.insert(entry.id.as_str()) {
                anyhow::bail!("duplicate catalog entry '{}'", entry.id);
            }
        }
        Ok(Self {
            entries: file.entries,
        })
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn get(&self, id: &str) -> Option<&CatalogEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Case-insensitive match on id, name, description and tags.
    pub fn search(&self, query: &str) -> Vec<&CatalogEntry> {
        let needle = query.trim().to_lowercase();
        self.entries.iter().filter(|e| e.matches(&needle)).collect()
    }

    pub fn stats(&self) -> CatalogStats {
        let mut by_runtime = BTreeMap::new();
        let mut tags = BTreeSet::new();
        for entry in &self.entries {
            *by_runtime.entry(entry.runtime.to_string()).or_insert(0) += 1;
            tags.extend(entry.tags.iter().map(String::as_str));
        }
        CatalogStats {
            total: self.entries.len(),
            by_runtime,
            tags: tags.len(),
        }
    }
}
