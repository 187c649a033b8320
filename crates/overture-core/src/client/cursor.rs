//! Cursor client implementation.

use serde_json::Value;

use crate::client::{ClientAdapter, ClientConfigPaths, ClientContext, ClientKind, render_standard};
use crate::config::ServerDefinition;
use crate::types::Platform;

#[derive(Debug, Default)]
pub struct CursorClient;

impl CursorClient {
    pub fn new() -> Self {
        Self
    }
}

impl ClientAdapter for CursorClient {
    fn kind(&self) -> ClientKind {
        ClientKind::Cursor
    }

    fn config_paths(&self, ctx: &ClientContext, _platform: Platform) -> ClientConfigPaths {
        ClientConfigPaths {
            user: ctx.home_dir.join(".cursor/mcp.json"),
            project: ctx
                .project_root
                .as_ref()
                .map(|root| root.join(".cursor/mcp.json")),
        }
    }

    fn render_server(&self, definition: &ServerDefinition) -> Value {
        render_standard(definition, "url")
    }
}
