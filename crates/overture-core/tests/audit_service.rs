mod support;

use std::path::PathBuf;
use std::sync::Arc;

use overture_core::audit::{AuditService, generate_suggestions};
use overture_core::client::{ClientAdapter, ClientContext, ClientKind, ClientRegistry, adapter_for};
use overture_core::config::parse_config_str;
use overture_core::types::Platform;

use support::MemoryFs;

fn audit_service(fs: &Arc<MemoryFs>) -> AuditService {
    let ctx = ClientContext::new(PathBuf::from("/home/dev"), Some(PathBuf::from("/work/app")));
    AuditService::new(fs.clone(), ctx, Platform::Linux)
}

#[test]
fn slack_is_reported_as_unmanaged() {
    let fs = Arc::new(MemoryFs::new());
    fs.add_file(
        "/home/dev/.claude.json",
        r#"{"mcpServers": {"github": {"command": "gh-mcp"}, "slack": {"command": "slack-mcp"}}}"#,
    );
    let config = parse_config_str("mcp:\n  github:\n    command: gh-mcp\n").expect("config");

    let names = audit_service(&fs)
        .audit_client(adapter_for(ClientKind::ClaudeCode).as_ref(), &config)
        .expect("audit");

    assert_eq!(names, vec!["slack"]);
}

#[test]
fn user_and_project_configs_are_combined() {
    let fs = Arc::new(MemoryFs::new());
    fs.add_file(
        "/home/dev/.config/Code/User/mcp.json",
        r#"{"servers": {"zeta": {"type": "stdio", "command": "z"}}}"#,
    );
    fs.add_file(
        "/work/app/.vscode/mcp.json",
        r#"{"servers": {"alpha": {"type": "http", "url": "https://a.example"}}}"#,
    );
    let config = parse_config_str("").expect("config");

    let names = audit_service(&fs)
        .audit_client(adapter_for(ClientKind::Vscode).as_ref(), &config)
        .expect("audit");

    assert_eq!(names, vec!["alpha", "zeta"]);
}

#[test]
fn audit_all_omits_clean_clients_and_suggests_imports() {
    let fs = Arc::new(MemoryFs::new());
    fs.add_file(
        "/home/dev/.claude.json",
        r#"{"mcpServers": {"github": {}, "notes": {"command": "notes-mcp"}}}"#,
    );
    fs.add_file(
        "/home/dev/.cursor/mcp.json",
        r#"{"mcpServers": {"notes": {"command": "notes-mcp"}, "db": {"command": "db-mcp"}}}"#,
    );
    fs.add_file(
        "/home/dev/.gemini/settings.json",
        r#"{"theme": "x", "mcpServers": {"github": {"command": "gh"}}}"#,
    );
    let config = parse_config_str("mcp:\n  github:\n    command: gh-mcp\n").expect("config");
    let registry = ClientRegistry::with_default_clients();
    let adapters: Vec<&dyn ClientAdapter> = registry.all().iter().map(|a| a.as_ref()).collect();

    let report = audit_service(&fs).audit_all_clients(&adapters, &config);

    assert_eq!(report.keys().collect::<Vec<_>>(), vec!["claude-code", "cursor"]);
    assert_eq!(report["cursor"], vec!["db", "notes"]);
    assert_eq!(
        generate_suggestions(&report),
        vec!["overture import db", "overture import notes"]
    );
}

#[test]
fn unreadable_client_is_left_out_of_report() {
    let fs = Arc::new(MemoryFs::new());
    fs.add_file("/home/dev/.claude.json", r#"{"mcpServers": {"x": {}}}"#);
    fs.add_file("/home/dev/.cursor/mcp.json", "{ broken");
    let config = parse_config_str("").expect("config");
    let claude = adapter_for(ClientKind::ClaudeCode);
    let cursor = adapter_for(ClientKind::Cursor);

    let report = audit_service(&fs).audit_all_clients(&[claude.as_ref(), cursor.as_ref()], &config);

    assert_eq!(report.len(), 1);
    assert!(report.contains_key("claude-code"));
}

#[test]
fn unmanaged_entries_are_returned_verbatim() {
    let fs = Arc::new(MemoryFs::new());
    fs.add_file(
        "/home/dev/.config/opencode/opencode.json",
        r#"{"mcp": {"fs": {"type": "local", "command": ["npx", "mcp-fs"], "enabled": true}}}"#,
    );
    let config = parse_config_str("").expect("config");

    let entries = audit_service(&fs)
        .unmanaged_entries(adapter_for(ClientKind::OpenCode).as_ref(), &config)
        .expect("entries");

    assert_eq!(
        entries["fs"],
        serde_json::json!({"type": "local", "command": ["npx", "mcp-fs"], "enabled": true})
    );
}
