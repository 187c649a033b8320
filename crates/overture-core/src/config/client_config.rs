//! Client configuration document helpers.
//!
//! Client config files are JSON objects with the server map stored under a
//! schema root key (`mcpServers`, `servers` or `mcp`). Everything else in the
//! file belongs to the client and is carried through untouched.

use std::path::Path;

use anyhow::{Context, Result};
use serde_json::{Map, Value};

use crate::fs::FileSystem;

/// Load a JSON config file as an object map.
///
/// Returns an empty map if the file does not exist.
pub fn load_json_document(fs: &dyn FileSystem, path: &Path) -> Result<Map<String, Value>> {
    if !fs.exists(path) {
        return Ok(Map::new());
    }
    let content = fs
        .read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    parse_json_document(&content)
}

/// Parse JSON text that must be an object at the root. Blank text is empty.
pub fn parse_json_document(content: &str) -> Result<Map<String, Value>> {
    if content.trim().is_empty() {
        return Ok(Map::new());
    }
    let value: Value = serde_json::from_str(content).context("Failed to parse JSON config")?;
    match value {
        Value::Object(map) => Ok(map),
        _ => anyhow::bail!("Expected JSON object at root"),
    }
}

/// Write an object map as pretty JSON, creating parent directories.
pub fn save_json_document(
    fs: &dyn FileSystem,
    path: &Path,
    map: &Map<String, Value>,
) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs.create_dir_all(parent)
            .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
    }
    let mut content =
        serde_json::to_string_pretty(map).context("Failed to serialize JSON config")?;
    content.push('\n');
    fs.write(path, &content)
        .with_context(|| format!("Failed to write config file: {}", path.display()))?;
    Ok(())
}

/// The server map stored under `root_key`; absent means empty.
pub fn servers_at_root(document: &Map<String, Value>, root_key: &str) -> Result<Map<String, Value>> {
    match document.get(root_key) {
        None | Some(Value::Null) => Ok(Map::new()),
        Some(Value::Object(map)) => Ok(map.clone()),
        Some(_) => anyhow::bail!("Expected '{}' to be an object", root_key),
    }
}

/// Replace the server map under `root_key`, keeping all other keys.
pub fn with_servers_at_root(
    mut document: Map<String, Value>,
    root_key: &str,
    servers: Map<String, Value>,
) -> Map<String, Value> {
    document.insert(root_key.to_string(), Value::Object(servers));
    document
}

/// Hash of a JSON value that ignores object key order.
pub fn hash_json(value: &Value) -> String {
    let normalized = normalize_json(value);
    let bytes = serde_json::to_vec(&normalized).unwrap_or_default();
    blake3::hash(&bytes).to_hex().to_string()
}

fn normalize_json(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<_> = map.keys().collect();
            keys.sort();
            let mut normalized = Map::new();
            for key in keys {
                if let Some(child) = map.get(key) {
                    normalized.insert(key.clone(), normalize_json(child));
                }
            }
            Value::Object(normalized)
        }
        Value::Array(items) => Value::Array(items.iter().map(normalize_json).collect()),
        _ => value.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::RealFs;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn load_nonexistent_file_returns_empty_map() {
        let result = load_json_document(&RealFs, Path::new("/nonexistent/path/config.json"))
            .expect("load should succeed");
        assert!(result.is_empty());
    }

    #[test]
    fn load_rejects_non_object_root() {
        let temp = TempDir::new().expect("create temp dir");
        let path = temp.path().join("config.json");
        std::fs::write(&path, "[1, 2]").expect("write file");

        assert!(load_json_document(&RealFs, &path).is_err());
    }

    #[test]
    fn save_creates_parent_directories() {
        let temp = TempDir::new().expect("create temp dir");
        let path = temp.path().join("nested/deep/config.json");

        let mut map = Map::new();
        map.insert("mcpServers".to_string(), json!({}));
        save_json_document(&RealFs, &path, &map).expect("save should succeed");

        let loaded = load_json_document(&RealFs, &path).expect("load");
        assert_eq!(loaded, map);
    }

    #[test]
    fn replacing_servers_keeps_other_keys() {
        let document = json!({"theme": "dark", "mcpServers": {"old": {}}})
            .as_object()
            .cloned()
            .expect("object");
        let servers = json!({"new": {"command": "x"}})
            .as_object()
            .cloned()
            .expect("object");

        let updated = with_servers_at_root(document, "mcpServers", servers);

        assert_eq!(updated["theme"], json!("dark"));
        assert!(updated["mcpServers"].get("old").is_none());
        assert!(updated["mcpServers"].get("new").is_some());
    }

    #[test]
    fn servers_at_root_rejects_non_object() {
        let document = json!({"mcpServers": []}).as_object().cloned().expect("object");
        assert!(servers_at_root(&document, "mcpServers").is_err());
    }

    #[test]
    fn hash_ignores_key_order() {
        let a: Value = serde_json::from_str(r#"{"a":1,"b":{"c":2,"d":3}}"#).expect("json");
        let b: Value = serde_json::from_str(r#"{"b":{"d":3,"c":2},"a":1}"#).expect("json");
        assert_eq!(hash_json(&a), hash_json(&b));
    }
}
