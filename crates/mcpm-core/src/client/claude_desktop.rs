//! Claude Desktop: one user-level file in the platform's application config directory.

use crate::client::{
    ClientContext, ClientPlugin, DefaultPath, ScopeSpec, ValidationRules, build_handlers,
};
use crate::config::{FileSchema, PathOverrides};
use crate::error::Result;
use crate::strategy::StrategyKind;
use crate::types::TransportType;

pub const NAME: &str = "claude-desktop";

pub fn scopes() -> Vec<ScopeSpec> {
    vec![ScopeSpec {
        name: "user",
        description: "Claude Desktop configuration",
        priority: 1,
        project_level: false,
        default_path: DefaultPath::UserConfig("Claude/claude_desktop_config.json"),
        schema: FileSchema::mcp_servers(),
        strategy: Some(StrategyKind::Shadow),
    }]
}

pub fn build(ctx: &ClientContext, overrides: Option<&PathOverrides>) -> Result<ClientPlugin> {
    let handlers = build_handlers(NAME, ctx, overrides, scopes())?;
    Ok(ClientPlugin::new(
        NAME,
        handlers,
        ValidationRules::with_transports(&[TransportType::Stdio]),
    ))
}
