//! Hermetic sandbox shared by the integration tests.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tempfile::TempDir;

use mcpm_core::catalog::Catalog;
use mcpm_core::client::registry::ClientRegistry;
use mcpm_core::client::{
    ClientContext, ClientKind, ClientPlugin, ScopeSpec, claude_code, claude_desktop, cursor,
    vscode,
};
use mcpm_core::config::{PathOverrides, Platform};
use mcpm_core::manager::Manager;

/// Temporary home/project tree with every scope file redirected inside it.
pub struct Sandbox {
    temp: TempDir,
}

impl Sandbox {
    pub fn new() -> Self {
        Self {
            temp: TempDir::new().unwrap(),
        }
    }

    pub fn root(&self) -> &Path {
        self.temp.path()
    }

    pub fn home(&self) -> PathBuf {
        self.root().join("home")
    }

    pub fn project(&self) -> PathBuf {
        self.root().join("project")
    }

    /// Test-mode context: building a client without overrides fails.
    pub fn ctx(&self) -> ClientContext {
        ClientContext::new(self.home(), self.project())
            .with_platform(Platform::Linux)
            .with_test_mode(true)
    }

    /// File backing `scope` of `kind` inside the sandbox.
    pub fn path(&self, kind: ClientKind, scope: &str) -> PathBuf {
        self.root()
            .join("scopes")
            .join(kind.name())
            .join(format!("{scope}.json"))
    }

    pub fn overrides(&self, kind: ClientKind) -> PathOverrides {
        specs(kind)
            .into_iter()
            .map(|spec| (spec.name.to_string(), self.path(kind, spec.name)))
            .collect()
    }

    pub fn all_overrides(&self) -> BTreeMap<String, PathOverrides> {
        ClientKind::ALL
            .into_iter()
            .map(|kind| (kind.name().to_string(), self.overrides(kind)))
            .collect()
    }

    pub fn client(&self, kind: ClientKind) -> ClientPlugin {
        kind.build(&self.ctx(), Some(&self.overrides(kind))).unwrap()
    }

    /// Same client with one scope moved under a regular file, which makes it read-only.
    pub fn client_with_readonly(&self, kind: ClientKind, scope: &str) -> ClientPlugin {
        let blocker = self.root().join("blocker");
        std::fs::write(&blocker, b"not a directory").unwrap();
        let mut overrides = self.overrides(kind);
        overrides.insert(scope.to_string(), blocker.join(format!("{scope}.json")));
        kind.build(&self.ctx(), Some(&overrides)).unwrap()
    }

    pub fn registry(&self) -> ClientRegistry {
        ClientRegistry::with_builtin_clients(self.ctx(), self.all_overrides())
    }

    pub fn manager(&self) -> Manager {
        Manager::new(self.registry(), Catalog::builtin().unwrap())
    }
}

pub fn specs(kind: ClientKind) -> Vec<ScopeSpec> {
    match kind {
        ClientKind::ClaudeCode => claude_code::scopes(),
        ClientKind::ClaudeDesktop => claude_desktop::scopes(),
        ClientKind::Cursor => cursor::scopes(),
        ClientKind::VsCode => vscode::scopes(),
    }
}

pub fn write_json(path: &Path, value: &Value) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, serde_json::to_vec_pretty(value).unwrap()).unwrap();
}

pub fn read_json(path: &Path) -> Value {
    serde_json::from_slice(&std::fs::read(path).unwrap()).unwrap()
}

/// Raw bytes, or `None` when the file does not exist.
pub fn snapshot(path: &Path) -> Option<Vec<u8>> {
    std::fs::read(path).ok()
}
