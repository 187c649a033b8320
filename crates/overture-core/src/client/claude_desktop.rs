//! Claude Desktop client implementation.

use serde_json::{Value, json};

use crate::client::{ClientAdapter, ClientConfigPaths, ClientContext, ClientKind, app_config_dir};
use crate::config::ServerDefinition;
use crate::types::Platform;

#[derive(Debug, Default)]
pub struct ClaudeDesktopClient;

impl ClaudeDesktopClient {
    pub fn new() -> Self {
        Self
    }
}

impl ClientAdapter for ClaudeDesktopClient {
    fn kind(&self) -> ClientKind {
        ClientKind::ClaudeDesktop
    }

    /// Claude Desktop has no project-level config.
    fn config_paths(&self, ctx: &ClientContext, platform: Platform) -> ClientConfigPaths {
        ClientConfigPaths {
            user: app_config_dir(&ctx.home_dir, platform).join("Claude/claude_desktop_config.json"),
            project: None,
        }
    }

    // stdio only; the exclusion filter drops remote servers before rendering
    fn render_server(&self, definition: &ServerDefinition) -> Value {
        json!({
            "command": definition.command,
            "args": definition.args,
            "env": definition.env,
        })
    }
}
