//! Windsurf client implementation.

use serde_json::Value;

use crate::client::{ClientAdapter, ClientConfigPaths, ClientContext, ClientKind, render_standard};
use crate::config::ServerDefinition;
use crate::types::Platform;

#[derive(Debug, Default)]
pub struct WindsurfClient;

impl WindsurfClient {
    pub fn new() -> Self {
        Self
    }
}

impl ClientAdapter for WindsurfClient {
    fn kind(&self) -> ClientKind {
        ClientKind::Windsurf
    }

    fn config_paths(&self, ctx: &ClientContext, _platform: Platform) -> ClientConfigPaths {
        ClientConfigPaths {
            user: ctx.home_dir.join(".codeium/windsurf/mcp_config.json"),
            project: None,
        }
    }

    // Windsurf reads remote endpoints from `serverUrl`
    fn render_server(&self, definition: &ServerDefinition) -> Value {
        render_standard(definition, "serverUrl")
    }
}
