//! VS Code client implementation.
//!
//! VS Code keeps servers under `servers` and wants an explicit `type` on
//! every entry, including stdio ones.

use serde_json::{Map, Value, json};

use crate::client::{
    ClientAdapter, ClientConfigPaths, ClientContext, ClientKind, app_config_dir, remote_url,
};
use crate::config::ServerDefinition;
use crate::types::{Platform, Transport};

#[derive(Debug, Default)]
pub struct VsCodeClient;

impl VsCodeClient {
    pub fn new() -> Self {
        Self
    }
}

impl ClientAdapter for VsCodeClient {
    fn kind(&self) -> ClientKind {
        ClientKind::Vscode
    }

    fn config_paths(&self, ctx: &ClientContext, platform: Platform) -> ClientConfigPaths {
        ClientConfigPaths {
            user: app_config_dir(&ctx.home_dir, platform).join("Code/User/mcp.json"),
            project: ctx
                .project_root
                .as_ref()
                .map(|root| root.join(".vscode/mcp.json")),
        }
    }

    fn render_server(&self, definition: &ServerDefinition) -> Value {
        let mut obj = Map::new();
        obj.insert("type".to_string(), json!(definition.transport.as_str()));
        match definition.transport {
            Transport::Stdio => {
                obj.insert("command".to_string(), json!(definition.command));
                obj.insert("args".to_string(), json!(definition.args));
                if !definition.env.is_empty() {
                    obj.insert("env".to_string(), json!(definition.env));
                }
            }
            Transport::Http | Transport::Sse => {
                obj.insert("url".to_string(), json!(remote_url(definition)));
            }
        }
        Value::Object(obj)
    }
}
