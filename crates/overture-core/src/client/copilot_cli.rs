//! GitHub Copilot CLI client implementation.

use serde_json::{Map, Value, json};

use crate::client::{ClientAdapter, ClientConfigPaths, ClientContext, ClientKind, remote_url};
use crate::config::ServerDefinition;
use crate::types::{Platform, Transport};

#[derive(Debug, Default)]
pub struct CopilotCliClient;

impl CopilotCliClient {
    pub fn new() -> Self {
        Self
    }
}

impl ClientAdapter for CopilotCliClient {
    fn kind(&self) -> ClientKind {
        ClientKind::CopilotCli
    }

    fn config_paths(&self, ctx: &ClientContext, _platform: Platform) -> ClientConfigPaths {
        ClientConfigPaths {
            user: ctx.home_dir.join(".copilot/mcp-config.json"),
            project: None,
        }
    }

    /// Copilot requires a `tools` allow-list on every entry; all tools are exposed.
    fn render_server(&self, definition: &ServerDefinition) -> Value {
        let mut obj = Map::new();
        match definition.transport {
            Transport::Stdio => {
                obj.insert("type".to_string(), json!("local"));
                obj.insert("command".to_string(), json!(definition.command));
                obj.insert("args".to_string(), json!(definition.args));
                obj.insert("env".to_string(), json!(definition.env));
            }
            Transport::Http | Transport::Sse => {
                obj.insert("type".to_string(), json!(definition.transport.as_str()));
                obj.insert("url".to_string(), json!(remote_url(definition)));
            }
        }
        obj.insert("tools".to_string(), json!(["*"]));
        Value::Object(obj)
    }
}
