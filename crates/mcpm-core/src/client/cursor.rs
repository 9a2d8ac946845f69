//! Cursor: project and user `mcp.json` files, both without a native disabled flag.

use crate::client::{
    ClientContext, ClientPlugin, DefaultPath, ScopeSpec, ValidationRules, build_handlers,
};
use crate::config::{FileSchema, PathOverrides};
use crate::error::Result;
use crate::strategy::StrategyKind;
use crate::types::TransportType;

pub const NAME: &str = "cursor";

pub fn scopes() -> Vec<ScopeSpec> {
    vec![
        ScopeSpec {
            name: "project",
            description: "Project .cursor/mcp.json",
            priority: 1,
            project_level: true,
            default_path: DefaultPath::Project(".cursor/mcp.json"),
            schema: FileSchema::mcp_servers(),
            strategy: Some(StrategyKind::Shadow),
        },
        ScopeSpec {
            name: "user",
            description: "User ~/.cursor/mcp.json",
            priority: 2,
            project_level: false,
            default_path: DefaultPath::Home(".cursor/mcp.json"),
            schema: FileSchema::mcp_servers(),
            strategy: Some(StrategyKind::Shadow),
        },
    ]
}

pub fn build(ctx: &ClientContext, overrides: Option<&PathOverrides>) -> Result<ClientPlugin> {
    let handlers = build_handlers(NAME, ctx, overrides, scopes())?;
    Ok(ClientPlugin::new(
        NAME,
        handlers,
        ValidationRules::with_transports(&[TransportType::Stdio, TransportType::Http]),
    ))
}
