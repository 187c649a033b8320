//! Client adapter layer for cross-client compatibility
//!
//! Each supported assistant is a [`ClientKind`] variant with a static
//! [`ClientCapability`] row and a [`ClientAdapter`] implementation that knows
//! its config file locations and the server shape it expects.

pub mod capability;
pub mod claude_code;
pub mod claude_desktop;
pub mod copilot_cli;
pub mod cursor;
pub mod gemini_cli;
pub mod opencode;
pub mod registry;
pub mod vscode;
pub mod windsurf;

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::config::ServerDefinition;
use crate::config::client_config::{load_json_document, save_json_document};
use crate::error::SyncError;
use crate::fs::FileSystem;
use crate::types::{Platform, SyncScope, Transport};

pub use capability::{ClientCapability, SchemaRootKey};
pub use registry::ClientRegistry;

/// Built-in client types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClientKind {
    ClaudeCode,
    ClaudeDesktop,
    Vscode,
    Cursor,
    Windsurf,
    CopilotCli,
    GeminiCli,
    #[serde(rename = "opencode")]
    OpenCode,
}

impl ClientKind {
    pub const ALL: [ClientKind; 8] = [
        ClientKind::ClaudeCode,
        ClientKind::ClaudeDesktop,
        ClientKind::Vscode,
        ClientKind::Cursor,
        ClientKind::Windsurf,
        ClientKind::CopilotCli,
        ClientKind::GeminiCli,
        ClientKind::OpenCode,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ClientKind::ClaudeCode => "claude-code",
            ClientKind::ClaudeDesktop => "claude-desktop",
            ClientKind::Vscode => "vscode",
            ClientKind::Cursor => "cursor",
            ClientKind::Windsurf => "windsurf",
            ClientKind::CopilotCli => "copilot-cli",
            ClientKind::GeminiCli => "gemini-cli",
            ClientKind::OpenCode => "opencode",
        }
    }

    pub fn capability(&self) -> &'static ClientCapability {
        capability::capability(*self)
    }
}

impl fmt::Display for ClientKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClientKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ClientKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| anyhow::anyhow!("Unknown client: {}", s))
    }
}

/// Paths an adapter needs to resolve its config files.
#[derive(Debug, Clone)]
pub struct ClientContext {
    pub home_dir: PathBuf,
    pub project_root: Option<PathBuf>,
}

impl ClientContext {
    pub fn new(home_dir: PathBuf, project_root: Option<PathBuf>) -> Self {
        Self {
            home_dir,
            project_root,
        }
    }
}

/// A client's user-level config file and, when it has one, its project file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfigPaths {
    pub user: PathBuf,
    pub project: Option<PathBuf>,
}

/// Trait for client-specific configuration adapters
pub trait ClientAdapter: Send + Sync + fmt::Debug {
    fn kind(&self) -> ClientKind;

    /// Config file locations for this client on `platform`.
    fn config_paths(&self, ctx: &ClientContext, platform: Platform) -> ClientConfigPaths;

    /// Render one definition in the client's native server shape.
    fn render_server(&self, definition: &ServerDefinition) -> Value;

    fn name(&self) -> &'static str {
        self.kind().as_str()
    }

    fn capability(&self) -> &'static ClientCapability {
        self.kind().capability()
    }

    fn schema_root_key(&self) -> &'static str {
        self.capability().schema_root_key.as_str()
    }

    fn supports_transport(&self, transport: Transport) -> bool {
        self.capability().transports.contains(&transport)
    }

    fn needs_env_var_expansion(&self) -> bool {
        self.capability().needs_env_var_expansion
    }

    fn binary_names(&self) -> &'static [&'static str] {
        self.capability().binary_names
    }

    fn requires_binary(&self) -> bool {
        self.capability().requires_binary
    }

    fn app_bundle_paths(&self, platform: Platform, home_dir: &Path) -> Vec<PathBuf> {
        self.capability()
            .app_bundles
            .iter()
            .filter(|(p, _)| *p == platform)
            .map(|(_, path)| expand_home(path, home_dir))
            .collect()
    }

    /// Config path for the given scope, if the client has one there.
    fn detect_config_path(
        &self,
        ctx: &ClientContext,
        platform: Platform,
        scope: SyncScope,
    ) -> Option<PathBuf> {
        let paths = self.config_paths(ctx, platform);
        match scope {
            SyncScope::User => Some(paths.user),
            SyncScope::Project => paths.project,
        }
    }

    fn read_config(
        &self,
        fs: &dyn FileSystem,
        path: &Path,
    ) -> Result<Map<String, Value>, SyncError> {
        load_json_document(fs, path)
            .map_err(|err| SyncError::config_read(self.name(), path, format!("{err:#}")))
    }

    fn write_config(
        &self,
        fs: &dyn FileSystem,
        path: &Path,
        document: &Map<String, Value>,
    ) -> Result<(), SyncError> {
        save_json_document(fs, path, document)
            .map_err(|err| SyncError::config_write(self.name(), path, format!("{err:#}")))
    }

    /// Build the client document for an already filtered set of definitions.
    ///
    /// The schema root key is always present, even when no server applies.
    fn convert_from_overture(
        &self,
        servers: &BTreeMap<String, ServerDefinition>,
    ) -> Map<String, Value> {
        let mut entries = Map::new();
        for (name, definition) in servers {
            entries.insert(name.clone(), self.render_server(definition));
        }
        let mut document = Map::new();
        document.insert(self.schema_root_key().to_string(), Value::Object(entries));
        document
    }
}

/// Resolve a leading `~/` against `home_dir`.
pub(crate) fn expand_home(path: &str, home_dir: &Path) -> PathBuf {
    match path.strip_prefix("~/") {
        Some(rest) => home_dir.join(rest),
        None => PathBuf::from(path),
    }
}

/// Per-user application data directory for GUI clients.
pub(crate) fn app_config_dir(home_dir: &Path, platform: Platform) -> PathBuf {
    match platform {
        Platform::Darwin => home_dir.join("Library/Application Support"),
        Platform::Win32 => home_dir.join("AppData/Roaming"),
        Platform::Linux => home_dir.join(".config"),
    }
}

/// `{command, args, env}` for stdio, `{type, url}` for remote transports.
///
/// The shape shared by most `mcpServers`-style clients.
pub(crate) fn render_standard(definition: &ServerDefinition, url_key: &str) -> Value {
    match definition.transport {
        Transport::Stdio => json!({
            "command": definition.command,
            "args": definition.args,
            "env": definition.env,
        }),
        Transport::Http | Transport::Sse => {
            let mut obj = Map::new();
            obj.insert("type".to_string(), json!(definition.transport.as_str()));
            obj.insert(url_key.to_string(), json!(remote_url(definition)));
            if !definition.env.is_empty() {
                obj.insert("env".to_string(), json!(definition.env));
            }
            Value::Object(obj)
        }
    }
}

/// URL of a remote server; older configs put it in `command`.
pub(crate) fn remote_url(definition: &ServerDefinition) -> &str {
    definition
        .url
        .as_deref()
        .unwrap_or(definition.command.as_str())
}

/// Get the adapter for a given client type
pub fn adapter_for(kind: ClientKind) -> Box<dyn ClientAdapter> {
    match kind {
        ClientKind::ClaudeCode => Box::new(claude_code::ClaudeCodeClient),
        ClientKind::ClaudeDesktop => Box::new(claude_desktop::ClaudeDesktopClient),
        ClientKind::Vscode => Box::new(vscode::VsCodeClient),
        ClientKind::Cursor => Box::new(cursor::CursorClient),
        ClientKind::Windsurf => Box::new(windsurf::WindsurfClient),
        ClientKind::CopilotCli => Box::new(copilot_cli::CopilotCliClient),
        ClientKind::GeminiCli => Box::new(gemini_cli::GeminiCliClient),
        ClientKind::OpenCode => Box::new(opencode::OpenCodeClient),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_kind_serializes_kebab_case() {
        let json = serde_json::to_string(&ClientKind::ClaudeCode).expect("serialize");
        assert_eq!(json, "\"claude-code\"");
        let json = serde_json::to_string(&ClientKind::OpenCode).expect("serialize");
        assert_eq!(json, "\"opencode\"");
    }

    #[test]
    fn client_kind_parses_its_own_names() {
        for kind in ClientKind::ALL {
            assert_eq!(kind.as_str().parse::<ClientKind>().expect("parse"), kind);
        }
        assert!("notepad".parse::<ClientKind>().is_err());
    }

    #[test]
    fn adapters_report_their_kind() {
        for kind in ClientKind::ALL {
            assert_eq!(adapter_for(kind).kind(), kind);
        }
    }

    #[test]
    fn convert_always_emits_root_key() {
        let adapter = adapter_for(ClientKind::Vscode);
        let document = adapter.convert_from_overture(&BTreeMap::new());
        assert_eq!(document.get("servers"), Some(&json!({})));
    }

    #[test]
    fn app_bundle_paths_expand_home() {
        let adapter = adapter_for(ClientKind::Cursor);
        let paths = adapter.app_bundle_paths(Platform::Win32, Path::new("/home/dev"));
        assert_eq!(
            paths,
            vec![PathBuf::from("/home/dev/AppData/Local/Programs/cursor")]
        );
        assert!(
            adapter
                .app_bundle_paths(Platform::Linux, Path::new("/home/dev"))
                .is_empty()
        );
    }

    #[test]
    fn remote_url_falls_back_to_command() {
        let mut definition = ServerDefinition::stdio("api", "https://example.com/mcp");
        definition.transport = Transport::Http;
        assert_eq!(remote_url(&definition), "https://example.com/mcp");
    }
}
