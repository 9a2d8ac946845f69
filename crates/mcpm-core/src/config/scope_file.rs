//! One JSON file with a known location for its servers mapping.

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use super::json_file::{read_json_map, servers_at, set_servers_at, write_json_map};
use super::schema::{FileSchema, validate};
use crate::error::{McpmError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeFile {
    path: PathBuf,
    schema: FileSchema,
}

impl ScopeFile {
    pub fn new(path: PathBuf, schema: FileSchema) -> Self {
        Self { path, schema }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn schema(&self) -> &FileSchema {
        &self.schema
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Full file contents.
    pub fn load(&self) -> Result<Map<String, Value>> {
        read_json_map(&self.path)
    }

    pub fn servers(&self, root: &Map<String, Value>) -> Result<Map<String, Value>> {
        servers_at(&self.path, root, &self.schema.servers_path)
    }

    pub fn read_servers(&self) -> Result<Map<String, Value>> {
        let root = self.load()?;
        self.servers(&root)
    }

    pub fn contains(&self, id: &str) -> Result<bool> {
        Ok(self.read_servers()?.contains_key(id))
    }

    pub fn store(&self, root: &mut Map<String, Value>, servers: Map<String, Value>) -> Result<()> {
        set_servers_at(&self.path, root, &self.schema.servers_path, servers)
    }

    /// Validate and atomically write the full file.
    pub fn save(&self, root: &Map<String, Value>) -> Result<()> {
        let errors = validate(root, &self.schema);
        if !errors.is_empty() {
            return Err(McpmError::Validation(
                errors
                    .into_iter()
                    .map(|e| format!("{}: {e}", self.path.display()))
                    .collect(),
            ));
        }
        write_json_map(&self.path, root)
    }

    /// Load, let `mutate` edit the servers mapping, and save if it reports a change.
    pub fn update_servers<F>(&self, mutate: F) -> Result<bool>
    where
        F: FnOnce(&mut Map<String, Value>) -> Result<bool>,
    {
        let mut root = self.load()?;
        let mut servers = self.servers(&root)?;
        if !mutate(&mut servers)? {
            return Ok(false);
        }
        self.store(&mut root, servers)?;
        self.save(&root)?;
        Ok(true)
    }
}
