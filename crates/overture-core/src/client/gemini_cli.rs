//! Gemini CLI client implementation.

use serde_json::{Map, Value, json};

use crate::client::{ClientAdapter, ClientConfigPaths, ClientContext, ClientKind, remote_url};
use crate::config::ServerDefinition;
use crate::types::{Platform, Transport};

#[derive(Debug, Default)]
pub struct GeminiCliClient;

impl GeminiCliClient {
    pub fn new() -> Self {
        Self
    }
}

impl ClientAdapter for GeminiCliClient {
    fn kind(&self) -> ClientKind {
        ClientKind::GeminiCli
    }

    fn config_paths(&self, ctx: &ClientContext, _platform: Platform) -> ClientConfigPaths {
        ClientConfigPaths {
            user: ctx.home_dir.join(".gemini/settings.json"),
            project: ctx
                .project_root
                .as_ref()
                .map(|root| root.join(".gemini/settings.json")),
        }
    }

    fn render_server(&self, definition: &ServerDefinition) -> Value {
        let mut obj = Map::new();
        match definition.transport {
            Transport::Stdio => {
                obj.insert("command".to_string(), json!(definition.command));
                obj.insert("args".to_string(), json!(definition.args));
            }
            Transport::Http => {
                obj.insert("httpUrl".to_string(), json!(remote_url(definition)));
            }
            Transport::Sse => {
                obj.insert("url".to_string(), json!(remote_url(definition)));
            }
        }
        if !definition.env.is_empty() {
            obj.insert("env".to_string(), json!(definition.env));
        }
        Value::Object(obj)
    }
}
