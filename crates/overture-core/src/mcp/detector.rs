//! Separates managed servers from ones the user added to a client directly.
//!
//! A server is managed when its name is defined in the overture config.
//! Everything else in a client config is unmanaged and survives every rewrite.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::config::ServerDefinition;
use crate::types::Transport;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct McpComparison {
    /// Every overture-defined name, sorted
    pub managed: Vec<String>,
    /// Client entries not defined in overture, sorted by name
    pub unmanaged: Vec<ServerDefinition>,
}

impl McpComparison {
    pub fn unmanaged_names(&self) -> Vec<&str> {
        self.unmanaged.iter().map(|s| s.name.as_str()).collect()
    }
}

pub fn compare_mcp_configs(
    overture: &BTreeMap<String, ServerDefinition>,
    client: &Map<String, Value>,
) -> McpComparison {
    let mut unmanaged: Vec<_> = client
        .iter()
        .filter(|(name, _)| !overture.contains_key(*name))
        .map(|(name, entry)| server_from_client_entry(name, entry))
        .collect();
    unmanaged.sort_by(|a, b| a.name.cmp(&b.name));

    McpComparison {
        managed: overture.keys().cloned().collect(),
        unmanaged,
    }
}

/// Client entries whose names are not overture-defined, exactly as found.
pub fn get_unmanaged_mcps(
    overture: &BTreeMap<String, ServerDefinition>,
    client: &Map<String, Value>,
) -> Map<String, Value> {
    client
        .iter()
        .filter(|(name, _)| !overture.contains_key(*name))
        .map(|(name, entry)| (name.clone(), entry.clone()))
        .collect()
}

/// Best-effort reading of a client-native entry as a definition.
///
/// Understands the shapes the built-in adapters write: `command` as a string
/// or as an argv array, `env` or `environment`, and `url`, `httpUrl` or
/// `serverUrl` for remote servers.
pub fn server_from_client_entry(name: &str, entry: &Value) -> ServerDefinition {
    let tag = entry.get("type").and_then(Value::as_str);
    let mut definition = ServerDefinition::stdio(name, "");

    match entry.get("command") {
        Some(Value::String(command)) => definition.command = command.clone(),
        Some(Value::Array(argv)) => {
            let mut parts = argv.iter().filter_map(Value::as_str).map(str::to_string);
            definition.command = parts.next().unwrap_or_default();
            definition.args = parts.collect();
        }
        _ => {}
    }

    if let Some(args) = entry.get("args").and_then(Value::as_array) {
        definition.args = args
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect();
    }

    let env = entry
        .get("env")
        .or_else(|| entry.get("environment"))
        .and_then(Value::as_object);
    if let Some(env) = env {
        definition.env = env
            .iter()
            .filter_map(|(k, v)| v.as_str().map(|v| (k.clone(), v.to_string())))
            .collect();
    }

    if let Some(url) = entry.get("httpUrl").and_then(Value::as_str) {
        definition.transport = Transport::Http;
        definition.url = Some(url.to_string());
    } else if let Some(url) = ["url", "serverUrl"]
        .iter()
        .find_map(|key| entry.get(*key).and_then(Value::as_str))
    {
        definition.transport = match Transport::from_client_tag(tag) {
            Transport::Stdio => Transport::Http,
            other => other,
        };
        definition.url = Some(url.to_string());
    } else {
        definition.transport = Transport::from_client_tag(tag);
    }

    definition
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn overture() -> BTreeMap<String, ServerDefinition> {
        let mut servers = BTreeMap::new();
        servers.insert("github".into(), ServerDefinition::stdio("github", "gh-mcp"));
        servers.insert("slack".into(), ServerDefinition::stdio("slack", "slack-mcp"));
        servers
    }

    fn client() -> Map<String, Value> {
        json!({
            "github": {"command": "old-gh"},
            "my-tool": {"command": "tool", "args": ["--x"]},
            "remote": {"type": "sse", "url": "https://r.example/sse"}
        })
        .as_object()
        .cloned()
        .expect("object")
    }

    #[test]
    fn compare_partitions_by_overture_names() {
        let comparison = compare_mcp_configs(&overture(), &client());

        assert_eq!(comparison.managed, vec!["github", "slack"]);
        assert_eq!(comparison.unmanaged_names(), vec!["my-tool", "remote"]);
        for name in comparison.unmanaged_names() {
            assert!(!comparison.managed.iter().any(|m| m == name));
        }
    }

    #[test]
    fn unmanaged_defaults_are_filled() {
        let comparison = compare_mcp_configs(&overture(), &client());

        let tool = &comparison.unmanaged[0];
        assert_eq!(tool.transport, Transport::Stdio);
        assert_eq!(tool.args, vec!["--x"]);

        let remote = &comparison.unmanaged[1];
        assert_eq!(remote.transport, Transport::Sse);
        assert!(remote.args.is_empty());
    }

    #[test]
    fn unmanaged_entries_are_verbatim_subset() {
        let client = client();
        let unmanaged = get_unmanaged_mcps(&overture(), &client);

        assert_eq!(unmanaged.len(), 2);
        for (name, entry) in &unmanaged {
            assert_eq!(client.get(name), Some(entry));
            assert!(!overture().contains_key(name));
        }
    }

    #[test]
    fn reads_opencode_argv_shape() {
        let entry = json!({
            "type": "local",
            "command": ["npx", "-y", "mcp-fs"],
            "environment": {"ROOT": "/srv"}
        });

        let definition = server_from_client_entry("fs", &entry);

        assert_eq!(definition.command, "npx");
        assert_eq!(definition.args, vec!["-y", "mcp-fs"]);
        assert_eq!(definition.env["ROOT"], "/srv");
        assert_eq!(definition.transport, Transport::Stdio);
    }

    #[test]
    fn reads_remote_shapes() {
        let gemini = server_from_client_entry("a", &json!({"httpUrl": "https://a.example"}));
        assert_eq!(gemini.transport, Transport::Http);

        let windsurf = server_from_client_entry("b", &json!({"serverUrl": "https://b.example"}));
        assert_eq!(windsurf.transport, Transport::Http);
        assert_eq!(windsurf.url.as_deref(), Some("https://b.example"));
    }

    #[test]
    fn url_outranks_stdio_tag() {
        let tagged = server_from_client_entry(
            "c",
            &json!({"type": "stdio", "url": "https://c.example/mcp"}),
        );
        assert_eq!(tagged.transport, Transport::Http);

        let sse = server_from_client_entry("d", &json!({"type": "sse", "url": "https://d.example"}));
        assert_eq!(sse.transport, Transport::Sse);
    }
}
