//! Static capability table for the built-in clients.

use serde::Serialize;

use super::ClientKind;
use crate::types::{Platform, Transport};

/// Top-level key under which a client stores its server map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SchemaRootKey {
    #[serde(rename = "mcpServers")]
    McpServers,
    #[serde(rename = "servers")]
    Servers,
    #[serde(rename = "mcp")]
    Mcp,
}

impl SchemaRootKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaRootKey::McpServers => "mcpServers",
            SchemaRootKey::Servers => "servers",
            SchemaRootKey::Mcp => "mcp",
        }
    }
}

/// What a client supports and how to find it on disk.
#[derive(Debug, Clone, Serialize)]
pub struct ClientCapability {
    pub name: &'static str,
    pub schema_root_key: SchemaRootKey,
    pub transports: &'static [Transport],
    /// The client does not expand `${VAR}` itself, so values are expanded before writing
    pub needs_env_var_expansion: bool,
    pub binary_names: &'static [&'static str],
    /// App bundle locations; a leading `~/` is relative to the home directory
    pub app_bundles: &'static [(Platform, &'static str)],
    /// A missing binary means not installed, even if an app bundle exists
    pub requires_binary: bool,
}

const ALL_TRANSPORTS: &[Transport] = &[Transport::Stdio, Transport::Http, Transport::Sse];

static CLAUDE_CODE: ClientCapability = ClientCapability {
    name: "claude-code",
    schema_root_key: SchemaRootKey::McpServers,
    transports: ALL_TRANSPORTS,
    needs_env_var_expansion: false,
    binary_names: &["claude"],
    app_bundles: &[],
    requires_binary: true,
};

static CLAUDE_DESKTOP: ClientCapability = ClientCapability {
    name: "claude-desktop",
    schema_root_key: SchemaRootKey::McpServers,
    transports: &[Transport::Stdio],
    needs_env_var_expansion: true,
    binary_names: &[],
    app_bundles: &[
        (Platform::Darwin, "/Applications/Claude.app"),
        (Platform::Win32, "~/AppData/Local/AnthropicClaude"),
    ],
    requires_binary: false,
};

static VSCODE: ClientCapability = ClientCapability {
    name: "vscode",
    schema_root_key: SchemaRootKey::Servers,
    transports: ALL_TRANSPORTS,
    needs_env_var_expansion: true,
    binary_names: &["code"],
    app_bundles: &[
        (Platform::Darwin, "/Applications/Visual Studio Code.app"),
        (Platform::Win32, "~/AppData/Local/Programs/Microsoft VS Code"),
        (Platform::Linux, "/usr/share/code"),
    ],
    requires_binary: false,
};

static CURSOR: ClientCapability = ClientCapability {
    name: "cursor",
    schema_root_key: SchemaRootKey::McpServers,
    transports: ALL_TRANSPORTS,
    needs_env_var_expansion: true,
    binary_names: &["cursor"],
    app_bundles: &[
        (Platform::Darwin, "/Applications/Cursor.app"),
        (Platform::Win32, "~/AppData/Local/Programs/cursor"),
    ],
    requires_binary: false,
};

static WINDSURF: ClientCapability = ClientCapability {
    name: "windsurf",
    schema_root_key: SchemaRootKey::McpServers,
    transports: ALL_TRANSPORTS,
    needs_env_var_expansion: true,
    binary_names: &["windsurf"],
    app_bundles: &[
        (Platform::Darwin, "/Applications/Windsurf.app"),
        (Platform::Win32, "~/AppData/Local/Programs/Windsurf"),
    ],
    requires_binary: false,
};

static COPILOT_CLI: ClientCapability = ClientCapability {
    name: "copilot-cli",
    schema_root_key: SchemaRootKey::McpServers,
    transports: ALL_TRANSPORTS,
    needs_env_var_expansion: true,
    binary_names: &["copilot"],
    app_bundles: &[],
    requires_binary: true,
};

static GEMINI_CLI: ClientCapability = ClientCapability {
    name: "gemini-cli",
    schema_root_key: SchemaRootKey::McpServers,
    transports: ALL_TRANSPORTS,
    needs_env_var_expansion: false,
    binary_names: &["gemini"],
    app_bundles: &[],
    requires_binary: true,
};

static OPENCODE: ClientCapability = ClientCapability {
    name: "opencode",
    schema_root_key: SchemaRootKey::Mcp,
    transports: &[Transport::Stdio, Transport::Http],
    needs_env_var_expansion: true,
    binary_names: &["opencode"],
    app_bundles: &[],
    requires_binary: true,
};

/// Capability entry for a client. Adding a [`ClientKind`] variant fails to
/// compile until it has a row here.
pub fn capability(kind: ClientKind) -> &'static ClientCapability {
    match kind {
        ClientKind::ClaudeCode => &CLAUDE_CODE,
        ClientKind::ClaudeDesktop => &CLAUDE_DESKTOP,
        ClientKind::Vscode => &VSCODE,
        ClientKind::Cursor => &CURSOR,
        ClientKind::Windsurf => &WINDSURF,
        ClientKind::CopilotCli => &COPILOT_CLI,
        ClientKind::GeminiCli => &GEMINI_CLI,
        ClientKind::OpenCode => &OPENCODE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_names_match_kind_names() {
        for kind in ClientKind::ALL {
            assert_eq!(capability(kind).name, kind.as_str());
        }
    }

    #[test]
    fn every_client_supports_stdio() {
        for kind in ClientKind::ALL {
            assert!(capability(kind).transports.contains(&Transport::Stdio));
        }
    }

    #[test]
    fn binary_required_clients_declare_binaries() {
        for kind in ClientKind::ALL {
            let cap = capability(kind);
            if cap.requires_binary {
                assert!(!cap.binary_names.is_empty(), "{} has no binaries", cap.name);
            }
        }
    }
}
