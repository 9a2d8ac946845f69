//! mcpm Core Library
//!
//! Manages the MCP servers configured for local MCP clients across every
//! configuration scope those clients read.

pub mod catalog;
pub mod client;
pub mod config;
pub mod error;
pub mod manager;
pub mod scope;
pub mod settings;
pub mod status;
pub mod strategy;
pub mod types;

/// Re-exports of commonly used types
pub mod prelude {
    // Errors
    pub use crate::error::{ErrorKind, McpmError, Result};

    // Core types
    pub use crate::types::{
        OperationResult, QualifiedId, ScopeConfig, ServerConfig, ServerInfo, ServerState,
        TransportType,
    };

    // Clients
    pub use crate::client::registry::{ClientInfo, ClientRegistry};
    pub use crate::client::{ClientContext, ClientKind, ClientPlugin, ValidationRules};
    pub use crate::config::{PathOverrides, Platform};

    // Scopes
    pub use crate::scope::{ScopeHandler, ScopeInfo};
    pub use crate::strategy::{DisableStrategy, StrategyKind};

    // Manager
    pub use crate::catalog::{Catalog, CatalogEntry};
    pub use crate::manager::{Manager, RescopeOptions, ServerLocation};
    pub use crate::settings::McpmSettings;
    pub use crate::status::StatusSummary;
}
