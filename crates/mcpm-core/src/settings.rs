//! `mcpm.toml` user settings.
//!
//! ```toml
//! default_client = "claude-code"
//! catalog = "~/mcp-catalog.toml"
//!
//! [clients.cursor]
//! enabled = false
//!
//! [clients.claude-desktop.paths]
//! user = "~/Dropbox/claude_desktop_config.json"
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::config::PathOverrides;

/// Environment variable naming an alternate settings file.
pub const CONFIG_ENV: &str = "MCPM_CONFIG";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct McpmSettings {
    /// Client used when a command names none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_client: Option<String>,

    /// Catalog file replacing the built-in catalog.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub clients: BTreeMap<String, ClientSettings>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientSettings {
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Scope name to file path.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub paths: PathOverrides,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            paths: PathOverrides::new(),
        }
    }
}

fn default_enabled() -> bool {
    true
}

impl McpmSettings {
    /// `$MCPM_CONFIG`, else `<config dir>/mcpm/mcpm.toml`.
    pub fn default_path() -> Option<PathBuf> {
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            return Some(PathBuf::from(path));
        }
        dirs::config_dir().map(|dir| dir.join("mcpm").join("mcpm.toml"))
    }

    /// Load settings; a missing file yields defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file: {}", path.display()))?;
        Self::parse_str(&content)
            .with_context(|| format!("Failed to parse settings file: {}", path.display()))
    }

    pub fn parse_str(content: &str) -> Result<Self> {
        let settings: McpmSettings =
            toml::from_str(content).map_err(|e| enhance_toml_error(e, content))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self
            .default_client
            .as_deref()
            .is_some_and(|c| c.trim().is_empty())
        {
            anyhow::bail!("default_client must not be empty");
        }
        for (client, settings) in &self.clients {
            if let Some((scope, _)) = settings
                .paths
                .iter()
                .find(|(_, path)| path.as_os_str().is_empty())
            {
                anyhow::bail!("clients.{client}.paths.{scope} must not be empty");
            }
        }
        Ok(())
    }

    pub fn is_client_enabled(&self, client: &str) -> bool {
        self.clients.get(client).is_none_or(|c| c.enabled)
    }

    /// Path overrides for every client that declares any.
    pub fn path_overrides(&self) -> BTreeMap<String, PathOverrides> {
        self.clients
            .iter()
            .filter(|(_, settings)| !settings.paths.is_empty())
            .map(|(name, settings)| (name.clone(), settings.paths.clone()))
            .collect()
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize settings to TOML")
    }
}

/// Attach the offending lines to a TOML parse error.
fn enhance_toml_error(error: toml::de::Error, content: &str) -> anyhow::Error {
    let message = error.message().to_string();
    let Some(span) = error.span() else {
        return anyhow::anyhow!("TOML parsing error: {message}");
    };
    let before = content.get(..span.start).unwrap_or(content);
    let line_num = before.matches('\n').count() + 1;
    anyhow::anyhow!(
        "TOML parsing error at line {line_num}:\n{}\n\nError: {message}",
        line_context(content, line_num)
    )
}

fn line_context(content: &str, line_num: usize) -> String {
    let lines: Vec<&str> = content.lines().collect();
    let start = line_num.saturating_sub(2);
    let end = (line_num + 1).min(lines.len());

    lines
        .get(start..end)
        .unwrap_or_default()
        .iter()
        .enumerate()
        .map(|(i, line)| {
            let num = start + i + 1;
            let marker = if num == line_num { ">>>" } else { "   " };
            format!("{marker} {num:4} | {line}")
        })
        .collect::<Vec<_>>()
        .join("\n")
}
