mod support;

use std::collections::BTreeMap;

use serde_json::json;

use mcpm_core::client::{ClientKind, ClientPlugin, ValidationRules};
use mcpm_core::error::ErrorKind;
use mcpm_core::manager::Manager;
use mcpm_core::settings::{ClientSettings, McpmSettings};
use mcpm_core::types::{ServerConfig, ServerState};

use support::{Sandbox, read_json, write_json};

fn npx(package: &str) -> ServerConfig {
    ServerConfig::stdio("npx", vec!["-y".into(), package.into()])
}

#[test]
fn install_then_list() {
    let sandbox = Sandbox::new();
    let path = sandbox.path(ClientKind::ClaudeCode, "user-global");
    write_json(&path, &json!({}));
    let manager = sandbox.manager();

    let result =
        manager.add_server("fs", &npx("pkg-filesystem"), "user-global", Some("claude-code"));
    assert!(result.success, "{result:?}");
    assert!(result.changed());

    let servers = read_json(&path)["mcpServers"].clone();
    assert_eq!(servers.as_object().unwrap().len(), 1);
    assert_eq!(servers["fs"]["command"], "npx");
    assert_eq!(servers["fs"]["args"], json!(["-y", "pkg-filesystem"]));

    let listed = manager.list_servers(Some("claude-code"), None, None).unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, "fs");
    assert_eq!(listed[0].state, ServerState::Enabled);
    assert!(listed[0].valid);
    assert_eq!(
        manager.get_server_state("fs", Some("claude-code")).unwrap(),
        ServerState::Enabled
    );
}

#[test]
fn malformed_entries_stay_visible() {
    let sandbox = Sandbox::new();
    write_json(
        &sandbox.path(ClientKind::Cursor, "user"),
        &json!({"mcpServers": {"ok": {"command": "x"}, "bad": {"args": ["y"]}}}),
    );
    let manager = sandbox.manager();

    let listed = manager.list_servers(Some("cursor"), None, None).unwrap();
    let ids: Vec<&str> = listed.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, ["ok", "bad"]);

    assert!(listed[0].valid);
    assert!(!listed[1].valid);
    assert!(
        listed[1].issues.iter().any(|i| i.contains("command")),
        "{:?}",
        listed[1].issues
    );
    assert_eq!(listed[1].state, ServerState::Enabled);
}

#[test]
fn unreadable_scope_does_not_hide_other_scopes() {
    let sandbox = Sandbox::new();
    std::fs::create_dir_all(sandbox.path(ClientKind::Cursor, "project").parent().unwrap())
        .unwrap();
    std::fs::write(sandbox.path(ClientKind::Cursor, "project"), "not json").unwrap();
    write_json(
        &sandbox.path(ClientKind::Cursor, "user"),
        &json!({"mcpServers": {"u": {"command": "x"}}}),
    );
    let manager = sandbox.manager();

    let listed = manager.list_servers(Some("cursor"), None, None).unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].scope, "user");
}

#[test]
fn default_client_prefers_installed_clients() {
    let sandbox = Sandbox::new();
    assert_eq!(sandbox.manager().default_client(), Some("claude-code"));

    write_json(&sandbox.path(ClientKind::Cursor, "user"), &json!({}));
    let mut manager = sandbox.manager();
    assert_eq!(manager.default_client(), Some("cursor"));

    let result = manager.add_server("a", &npx("a"), "project", None);
    assert!(result.success, "{result:?}");
    assert!(sandbox.path(ClientKind::Cursor, "project").exists());

    assert!(manager.set_default_client("vscode").success);
    let result = manager.set_default_client("zed");
    assert!(result.has_error(ErrorKind::UnknownClient));
    assert_eq!(manager.default_client(), Some("vscode"));
}

#[test]
fn listing_and_filters_across_clients() {
    let sandbox = Sandbox::new();
    let manager = sandbox.manager();
    assert!(manager.add_server("a", &npx("a"), "user", Some("cursor")).success);
    assert!(manager.add_server("b", &npx("b"), "user", Some("vscode")).success);
    assert!(manager.add_server("c", &npx("c"), "project", Some("vscode")).success);
    assert!(manager.disable_server("b", None, Some("vscode")).success);

    let all = manager.list_servers(None, None, None).unwrap();
    assert_eq!(all.len(), 3);

    let user: Vec<String> = manager
        .list_servers(None, Some("user"), None)
        .unwrap()
        .iter()
        .map(|s| s.qualified_id().to_string())
        .collect();
    assert_eq!(user, ["cursor:user:a", "vscode:user:b"]);

    let disabled = manager
        .list_servers(None, None, Some(ServerState::Disabled))
        .unwrap();
    assert_eq!(disabled.len(), 1);
    assert_eq!(disabled[0].id, "b");

    let err = manager.list_servers(Some("cursor"), Some("global"), None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnknownScope);
    let err = manager.list_servers(None, Some("global"), None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnknownScope);
    assert!(
        manager
            .list_servers(None, Some("user-local"), None)
            .unwrap()
            .is_empty()
    );
}

#[test]
fn lookups_search_the_default_client_first() {
    let sandbox = Sandbox::new();
    let manager = sandbox.manager();
    assert_eq!(manager.default_client(), Some("claude-code"));
    assert!(manager.add_server("s", &npx("vs"), "user", Some("vscode")).success);

    let info = manager.get_server_info("s", None).unwrap().unwrap();
    assert_eq!(info.client, "vscode");
    let location = manager.find_server_location("s").unwrap().unwrap();
    assert_eq!(location.qualified_id, "vscode:user:s");

    assert!(manager.add_server("s", &npx("cc"), "user-mcp", None).success);
    let location = manager.find_server_location("s").unwrap().unwrap();
    assert_eq!(location.client, "claude-code");
    assert_eq!(location.scope, "user-mcp");

    assert!(manager.get_server_info("missing", None).unwrap().is_none());
    assert!(manager.find_server_location("missing").unwrap().is_none());
}

#[test]
fn catalog_entries_install_as_servers() {
    let sandbox = Sandbox::new();
    let manager = sandbox.manager();

    let result = manager.add_from_catalog("git", None, "project", Some("cursor"));
    assert!(result.success, "{result:?}");
    assert_eq!(result.data["catalog_entry"], "git");

    let result = manager.add_from_catalog("filesystem", Some("fs"), "project", Some("cursor"));
    assert!(result.success, "{result:?}");

    let servers = read_json(&sandbox.path(ClientKind::Cursor, "project"))["mcpServers"].clone();
    assert_eq!(servers["git"]["command"], "uvx");
    assert_eq!(servers["fs"]["command"], "npx");
    assert!(servers.get("filesystem").is_none());
}

#[test]
fn status_summary_counts_everything() {
    let sandbox = Sandbox::new();
    let mut overrides = sandbox.all_overrides();
    overrides.remove("claude-desktop");
    let mut registry =
        mcpm_core::client::registry::ClientRegistry::with_builtin_clients(sandbox.ctx(), overrides);
    registry.inject_client_instance(
        "empty",
        ClientPlugin::new("empty", Vec::new(), ValidationRules::default()),
    );
    let manager = Manager::new(registry, mcpm_core::catalog::Catalog::builtin().unwrap());

    assert!(manager.add_server("a", &npx("a"), "user-mcp", None).success);
    assert!(manager.add_server("b", &npx("b"), "user", Some("cursor")).success);
    assert!(manager.disable_server("b", None, Some("cursor")).success);

    let summary = manager.get_status_summary();
    assert_eq!(summary.total, 2);
    assert_eq!(summary.count(ServerState::Enabled), 1);
    assert_eq!(summary.count(ServerState::Disabled), 1);
    assert_eq!(summary.by_client["claude-code"], 1);
    assert_eq!(summary.unavailable_clients, ["claude-desktop"]);
    assert!(summary.clients.contains(&"empty".to_string()));
    assert_eq!(summary.default_client.as_deref(), Some("claude-code"));
    assert_eq!(summary.catalog.total, manager.catalog().entries().len());
}

#[test]
fn settings_choose_clients_paths_and_default() {
    let sandbox = Sandbox::new();
    let mut clients: BTreeMap<String, ClientSettings> = sandbox
        .all_overrides()
        .into_iter()
        .map(|(name, paths)| {
            (
                name,
                ClientSettings {
                    enabled: true,
                    paths,
                },
            )
        })
        .collect();
    clients.get_mut("cursor").unwrap().enabled = false;
    let settings = McpmSettings {
        default_client: Some("vscode".to_string()),
        catalog: None,
        clients,
    };

    let manager = Manager::from_settings(sandbox.ctx(), &settings).unwrap();
    assert_eq!(manager.default_client(), Some("vscode"));
    assert_eq!(
        manager.get_available_clients(),
        ["claude-code", "claude-desktop", "vscode"]
    );

    let result = manager.add_server("x", &npx("x"), "user", Some("cursor"));
    assert!(result.has_error(ErrorKind::UnknownClient));
}

#[test]
fn settings_catalog_file_replaces_the_builtin_one() {
    let sandbox = Sandbox::new();
    let catalog = sandbox.root().join("catalog.toml");
    std::fs::write(
        &catalog,
        r#"
[[entry]]
id = "internal"
name = "Internal tools"
runtime = "uvx"
package = "acme-mcp"
"#,
    )
    .unwrap();
    let settings = McpmSettings {
        catalog: Some(catalog),
        ..McpmSettings::default()
    };

    let manager = Manager::from_settings(sandbox.ctx(), &settings).unwrap();
    assert_eq!(manager.catalog().entries().len(), 1);
    assert!(manager.catalog().get("internal").is_some());
    // No overrides in test mode: every built-in client is unavailable.
    assert!(manager.get_available_clients().is_empty());
    assert_eq!(manager.default_client(), None);
}

#[test]
fn scopes_for_client_describe_files() {
    let sandbox = Sandbox::new();
    let manager = sandbox.manager();

    let scopes = manager.get_scopes_for_client(Some("claude-desktop")).unwrap();
    assert_eq!(scopes.len(), 1);
    assert_eq!(scopes[0].name, "user");
    assert_eq!(scopes[0].level, "user");
    assert!(!scopes[0].exists);
    assert!(!scopes[0].readonly);
    assert_eq!(
        scopes[0].path.as_deref(),
        Some(sandbox.path(ClientKind::ClaudeDesktop, "user").as_path())
    );

    let err = manager.get_scopes_for_client(Some("zed")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnknownClient);
}
