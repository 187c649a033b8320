//! OpenCode client implementation.

use serde_json::{Map, Value, json};

use crate::client::{ClientAdapter, ClientConfigPaths, ClientContext, ClientKind, remote_url};
use crate::config::ServerDefinition;
use crate::types::{Platform, Transport};

#[derive(Debug, Default)]
pub struct OpenCodeClient;

impl OpenCodeClient {
    pub fn new() -> Self {
        Self
    }
}

impl ClientAdapter for OpenCodeClient {
    fn kind(&self) -> ClientKind {
        ClientKind::OpenCode
    }

    fn config_paths(&self, ctx: &ClientContext, _platform: Platform) -> ClientConfigPaths {
        ClientConfigPaths {
            user: ctx.home_dir.join(".config/opencode/opencode.json"),
            project: ctx
                .project_root
                .as_ref()
                .map(|root| root.join("opencode.json")),
        }
    }

    fn render_server(&self, definition: &ServerDefinition) -> Value {
        // OpenCode format:
        // - local: { "type": "local", "command": [cmd, ...args], "environment": {...} }
        // - remote: { "type": "remote", "url": "..." }
        let mut obj = Map::new();
        match definition.transport {
            Transport::Stdio => {
                let mut command = vec![definition.command.clone()];
                command.extend(definition.args.iter().cloned());

                obj.insert("type".to_string(), json!("local"));
                obj.insert("command".to_string(), json!(command));
                if !definition.env.is_empty() {
                    obj.insert("environment".to_string(), json!(definition.env));
                }
            }
            Transport::Http | Transport::Sse => {
                obj.insert("type".to_string(), json!("remote"));
                obj.insert("url".to_string(), json!(remote_url(definition)));
            }
        }
        obj.insert("enabled".to_string(), json!(true));
        Value::Object(obj)
    }
}
