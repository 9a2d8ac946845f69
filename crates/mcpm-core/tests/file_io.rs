mod support;

use serde_json::json;

use mcpm_core::client::ClientKind;
use mcpm_core::config::{read_json_map, write_json_map};
use mcpm_core::error::ErrorKind;
use mcpm_core::types::ServerConfig;

use support::{Sandbox, read_json, write_json};

#[test]
fn writing_back_what_was_read_keeps_content() {
    let sandbox = Sandbox::new();
    let path = sandbox.root().join("config.json");
    let original = json!({
        "zeta": 1,
        "mcpServers": {"b": {"command": "x", "custom": {"nested": true}}, "a": {"command": "y"}},
        "alpha": [1, 2, 3]
    });
    write_json(&path, &original);

    let first = read_json_map(&path).unwrap();
    write_json_map(&path, &first).unwrap();
    let second = read_json_map(&path).unwrap();

    assert_eq!(first, second);
    let keys: Vec<&String> = second.keys().collect();
    assert_eq!(keys, ["zeta", "mcpServers", "alpha"]);
}

#[test]
fn writes_leave_no_temporary_files_behind() {
    let sandbox = Sandbox::new();
    let dir = sandbox.root().join("nested/dir");
    let path = dir.join("config.json");

    for i in 0..5 {
        let map = json!({"mcpServers": {"s": {"command": format!("cmd-{i}")}}});
        write_json_map(&path, map.as_object().unwrap()).unwrap();
    }

    let names: Vec<String> = std::fs::read_dir(&dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    assert_eq!(names, ["config.json"]);

    let content = std::fs::read_to_string(&path).unwrap();
    assert!(content.ends_with("}\n"));
    assert!(content.contains("\n  \"mcpServers\""));
    assert_eq!(read_json(&path)["mcpServers"]["s"]["command"], "cmd-4");
}

#[test]
fn scope_writes_keep_unrelated_keys() {
    let sandbox = Sandbox::new();
    let client = sandbox.client(ClientKind::ClaudeCode);
    let path = sandbox.path(ClientKind::ClaudeCode, "user-internal");
    write_json(
        &path,
        &json!({
            "numStartups": 12,
            "projects": {"/work": {"allowedTools": []}},
            "mcpServers": {"keep": {"command": "k", "timeout": 30}}
        }),
    );

    let config = ServerConfig::stdio("npx", vec!["-y".into(), "pkg".into()]);
    assert!(client.add_server("new", &config, "user-internal").success);

    let after = read_json(&path);
    assert_eq!(after["numStartups"], 12);
    assert_eq!(after["projects"], json!({"/work": {"allowedTools": []}}));
    assert_eq!(after["mcpServers"]["keep"], json!({"command": "k", "timeout": 30}));
    assert_eq!(after["mcpServers"]["new"]["command"], "npx");
}

#[test]
fn malformed_file_is_reported_and_never_rewritten() {
    let sandbox = Sandbox::new();
    let client = sandbox.client(ClientKind::Cursor);
    let path = sandbox.path(ClientKind::Cursor, "user");
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, "{ \"mcpServers\": { oops").unwrap();

    let err = read_json_map(&path).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedConfig);

    let result = client.add_server("a", &ServerConfig::stdio("x", Vec::new()), "user");
    assert!(result.has_error(ErrorKind::MalformedConfig), "{result:?}");
    assert_eq!(
        std::fs::read_to_string(&path).unwrap(),
        "{ \"mcpServers\": { oops"
    );
}

#[test]
fn schema_violations_block_the_write() {
    let sandbox = Sandbox::new();
    let client = sandbox.client(ClientKind::Cursor);
    let path = sandbox.path(ClientKind::Cursor, "user");
    let original = json!({"mcpServers": {"bad": {"command": 42}}});
    write_json(&path, &original);
    let before = std::fs::read(&path).unwrap();

    let result = client.add_server("ok", &ServerConfig::stdio("x", Vec::new()), "user");
    assert!(!result.success);
    assert!(result.has_error(ErrorKind::ValidationError), "{result:?}");
    assert_eq!(std::fs::read(&path).unwrap(), before);
}
