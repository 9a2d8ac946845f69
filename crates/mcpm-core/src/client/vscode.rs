//! VS Code: `mcp.json` files keyed by `servers` instead of `mcpServers`.

use crate::client::{
    ClientContext, ClientPlugin, DefaultPath, ScopeSpec, ValidationRules, build_handlers,
};
use crate::config::{FileSchema, PathOverrides};
use crate::error::Result;
use crate::strategy::StrategyKind;
use crate::types::TransportType;

pub const NAME: &str = "vscode";

pub fn scopes() -> Vec<ScopeSpec> {
    vec![
        ScopeSpec {
            name: "project",
            description: "Workspace .vscode/mcp.json",
            priority: 1,
            project_level: true,
            default_path: DefaultPath::Project(".vscode/mcp.json"),
            schema: FileSchema::servers(),
            strategy: Some(StrategyKind::Shadow),
        },
        ScopeSpec {
            name: "user",
            description: "User profile mcp.json",
            priority: 2,
            project_level: false,
            default_path: DefaultPath::UserConfig("Code/User/mcp.json"),
            schema: FileSchema::servers(),
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
