//! File I/O primitives shared by every scope.
//!
//! - `json_file`: atomic read/write of JSON config files and nested-key helpers
//! - `schema`: structural validation of scope files
//! - `scope_file`: a file plus the key path of its servers mapping
//! - `paths`: platform directories, `~` expansion and path overrides

pub mod json_file;
pub mod paths;
pub mod schema;
pub mod scope_file;

pub use json_file::{read_json_map, servers_at, set_servers_at, write_json_map};
pub use paths::{PathOverrides, Platform};
pub use schema::{DISABLED_ARRAY_KEY, ENABLED_ARRAY_KEY, FileSchema, validate};
pub use scope_file::ScopeFile;
