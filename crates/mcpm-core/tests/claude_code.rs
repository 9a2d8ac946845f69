mod support;

use serde_json::json;

use mcpm_core::client::ClientKind;
use mcpm_core::error::ErrorKind;
use mcpm_core::types::{ServerConfig, ServerState};

use support::{Sandbox, read_json, write_json};

#[test]
fn disabled_array_in_another_scope_does_not_leak() {
    let sandbox = Sandbox::new();
    let client = sandbox.client(ClientKind::ClaudeCode);
    write_json(
        &sandbox.path(ClientKind::ClaudeCode, "user-global"),
        &json!({"mcpServers": {"a": {"command": "x"}}}),
    );
    write_json(
        &sandbox.path(ClientKind::ClaudeCode, "user-local"),
        &json!({"disabledMcpjsonServers": ["a"]}),
    );

    let servers = client.list_servers(None).unwrap();
    assert_eq!(servers.len(), 1);
    assert_eq!(servers[0].id, "a");
    assert_eq!(servers[0].scope, "user-global");
    assert_eq!(servers[0].state, ServerState::Enabled);
    assert!(client.list_servers(Some("user-local")).unwrap().is_empty());
    assert_eq!(client.get_server_state("a").unwrap(), ServerState::Enabled);
}

#[test]
fn state_depends_only_on_the_owning_scope() {
    let sandbox = Sandbox::new();
    let client = sandbox.client(ClientKind::ClaudeCode);
    let config = ServerConfig::stdio("npx", vec!["-y".into(), "pkg".into()]);
    assert!(client.add_server("a", &config, "user-mcp").success);

    for scope in ["project-local", "user-local", "user-global"] {
        let result = client.disable_server("a", Some(scope));
        assert!(result.success, "{scope}: {result:?}");
        let handler = client.get_scope_handler("user-mcp").unwrap();
        assert_eq!(handler.server_state("a").unwrap(), ServerState::Enabled);
    }
    assert_eq!(client.get_server_state("a").unwrap(), ServerState::Enabled);

    let listed: Vec<_> = client
        .list_servers(None)
        .unwrap()
        .into_iter()
        .map(|s| (s.scope, s.state))
        .collect();
    assert_eq!(listed, [("user-mcp".to_string(), ServerState::Enabled)]);
}

#[test]
fn same_id_in_several_scopes_is_listed_per_scope() {
    let sandbox = Sandbox::new();
    let client = sandbox.client(ClientKind::ClaudeCode);
    let config = ServerConfig::stdio("uvx", vec!["mcp-server-git".into()]);
    assert!(client.add_server("git", &config, "user-global").success);
    assert!(client.add_server("git", &config, "project-mcp").success);

    let servers = client.list_servers(None).unwrap();
    let ids: Vec<String> = servers.iter().map(|s| s.qualified_id().to_string()).collect();
    assert_eq!(
        ids,
        ["claude-code:project-mcp:git", "claude-code:user-global:git"]
    );

    let scopes: Vec<&str> = client
        .find_server_scopes("git")
        .unwrap()
        .iter()
        .map(|h| h.name())
        .collect();
    assert_eq!(scopes, ["project-mcp", "user-global"]);
}

#[test]
fn ambiguous_toggle_needs_a_scope() {
    let sandbox = Sandbox::new();
    let client = sandbox.client(ClientKind::ClaudeCode);
    let config = ServerConfig::stdio("uvx", vec!["mcp-server-time".into()]);
    assert!(client.add_server("t", &config, "user-global").success);
    assert!(client.add_server("t", &config, "user-internal").success);

    let result = client.disable_server("t", None);
    assert!(result.has_error(ErrorKind::AmbiguousScope), "{result:?}");

    let result = client.disable_server("t", Some("user-internal"));
    assert!(result.success, "{result:?}");
    let internal = client.get_scope_handler("user-internal").unwrap();
    assert_eq!(internal.server_state("t").unwrap(), ServerState::Disabled);
    let global = client.get_scope_handler("user-global").unwrap();
    assert_eq!(global.server_state("t").unwrap(), ServerState::Enabled);
}

#[test]
fn add_rejects_duplicates_and_unknown_scopes() {
    let sandbox = Sandbox::new();
    let client = sandbox.client(ClientKind::ClaudeCode);
    let config = ServerConfig::stdio("node", vec!["server.js".into()]);

    assert!(client.add_server("n", &config, "project-mcp").success);
    let again = client.add_server("n", &config, "project-mcp");
    assert!(again.has_error(ErrorKind::AlreadyPresent));

    let unknown = client.add_server("n", &config, "global");
    assert!(unknown.has_error(ErrorKind::UnknownScope));

    let entries = read_json(&sandbox.path(ClientKind::ClaudeCode, "project-mcp"));
    assert_eq!(entries["mcpServers"].as_object().unwrap().len(), 1);
}

#[test]
fn package_managers_are_not_launch_commands() {
    let sandbox = Sandbox::new();
    let client = sandbox.client(ClientKind::ClaudeCode);

    let npm = ServerConfig::stdio("npm", vec!["install".into(), "pkg".into()]);
    let result = client.add_server("bad", &npm, "user-mcp");
    assert!(result.has_error(ErrorKind::ValidationError), "{result:?}");

    let bare_npx = ServerConfig::stdio("npx", vec!["-y".into()]);
    let result = client.add_server("bad", &bare_npx, "user-mcp");
    assert!(result.has_error(ErrorKind::ValidationError), "{result:?}");

    assert!(!sandbox.path(ClientKind::ClaudeCode, "user-mcp").exists());
}
