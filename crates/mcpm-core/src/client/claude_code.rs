//! Claude Code: six layered files across the project and the home directory.
//!
//! The project `.mcp.json` and the user `mcp.json` flag entries inline, the
//! settings files keep name arrays, and the internal `~/.claude.json` has no
//! native flag so disabled entries go to its shadow file.

use crate::client::{
    ClientContext, ClientPlugin, DefaultPath, ScopeSpec, ValidationRules, build_handlers,
};
use crate::config::{FileSchema, PathOverrides};
use crate::error::Result;
use crate::strategy::StrategyKind;

pub const NAME: &str = "claude-code";

pub fn scopes() -> Vec<ScopeSpec> {
    vec![
        ScopeSpec {
            name: "project-mcp",
            description: "Project-shared .mcp.json",
            priority: 1,
            project_level: true,
            default_path: DefaultPath::Project(".mcp.json"),
            schema: FileSchema::mcp_servers(),
            strategy: Some(StrategyKind::Inline),
        },
        ScopeSpec {
            name: "project-local",
            description: "Project-local settings (not committed)",
            priority: 2,
            project_level: true,
            default_path: DefaultPath::Project(".claude/settings.local.json"),
            schema: FileSchema::mcp_servers(),
            strategy: Some(StrategyKind::Array),
        },
        ScopeSpec {
            name: "user-local",
            description: "User-local settings",
            priority: 3,
            project_level: false,
            default_path: DefaultPath::Home(".claude/settings.local.json"),
            schema: FileSchema::mcp_servers(),
            strategy: Some(StrategyKind::Array),
        },
        ScopeSpec {
            name: "user-global",
            description: "User-global settings",
            priority: 4,
            project_level: false,
            default_path: DefaultPath::Home(".claude/settings.json"),
            schema: FileSchema::mcp_servers(),
            strategy: Some(StrategyKind::Array),
        },
        ScopeSpec {
            name: "user-internal",
            description: "Internal per-user state file",
            priority: 5,
            project_level: false,
            default_path: DefaultPath::Home(".claude.json"),
            schema: FileSchema::mcp_servers(),
            strategy: Some(StrategyKind::Shadow),
        },
        ScopeSpec {
            name: "user-mcp",
            description: "User MCP servers file",
            priority: 6,
            project_level: false,
            default_path: DefaultPath::Home(".claude/mcp.json"),
            schema: FileSchema::mcp_servers(),
            strategy: Some(StrategyKind::Inline),
        },
    ]
}

pub fn build(ctx: &ClientContext, overrides: Option<&PathOverrides>) -> Result<ClientPlugin> {
    let handlers = build_handlers(NAME, ctx, overrides, scopes())?;
    Ok(ClientPlugin::new(NAME, handlers, ValidationRules::default()))
}
