//! Configuration schema for overture YAML files
//!
//! Defines the structure shared by both configuration layers:
//! - User: ~/.config/overture.yml
//! - Project: ./.overture/config.yaml

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::process::DEFAULT_PROBE_TIMEOUT;
use crate::types::{Platform, Transport};

/// Root configuration structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OvertureConfig {
    #[serde(default = "default_version")]
    pub version: String,

    /// MCP server definitions keyed by server name
    #[serde(default)]
    pub mcp: BTreeMap<String, ServerDefinition>,

    /// Per-client discovery and path overrides
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub clients: BTreeMap<String, ClientSettings>,

    #[serde(default, skip_serializing_if = "DiscoverySettings::is_default")]
    pub discovery: DiscoverySettings,

    #[serde(default, skip_serializing_if = "SyncSettings::is_default")]
    pub sync: SyncSettings,
}

fn default_version() -> String {
    "1.0".to_string()
}

impl Default for OvertureConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            mcp: BTreeMap::new(),
            clients: BTreeMap::new(),
            discovery: DiscoverySettings::default(),
            sync: SyncSettings::default(),
        }
    }
}

impl OvertureConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy each map key into its definition's `name`.
    pub fn assign_names(&mut self) {
        for (name, definition) in self.mcp.iter_mut() {
            definition.name = name.clone();
        }
    }

    /// Settings for a client, if the config mentions it.
    pub fn client_settings(&self, client: &str) -> Option<&ClientSettings> {
        self.clients.get(client)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        for (name, definition) in &self.mcp {
            if definition.transport == Transport::Stdio && definition.command.trim().is_empty() {
                anyhow::bail!("MCP server '{}' uses stdio transport but has no command", name);
            }
        }
        Ok(())
    }
}

/// A single MCP server definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerDefinition {
    /// Populated from the map key after parsing
    #[serde(skip)]
    pub name: String,

    #[serde(default)]
    pub command: String,

    #[serde(default)]
    pub args: Vec<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,

    #[serde(default)]
    pub transport: Transport,

    /// HTTP/SSE: Server URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platforms: Option<PlatformRules>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clients: Option<ClientRules>,
}

impl ServerDefinition {
    pub fn stdio(name: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            command: command.into(),
            args: Vec::new(),
            env: BTreeMap::new(),
            transport: Transport::Stdio,
            url: None,
            platforms: None,
            clients: None,
        }
    }

    pub fn remote(name: impl Into<String>, transport: Transport, url: impl Into<String>) -> Self {
        Self {
            transport,
            url: Some(url.into()),
            ..Self::stdio(name, "")
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn excluding_platforms(mut self, platforms: &[Platform]) -> Self {
        self.platforms = Some(PlatformRules {
            exclude: platforms.to_vec(),
        });
        self
    }

    pub fn including_clients(mut self, clients: &[&str]) -> Self {
        let rules = self.clients.get_or_insert_with(ClientRules::default);
        rules.include = Some(clients.iter().map(|c| c.to_string()).collect());
        self
    }

    pub fn excluding_clients(mut self, clients: &[&str]) -> Self {
        let rules = self.clients.get_or_insert_with(ClientRules::default);
        rules.exclude = Some(clients.iter().map(|c| c.to_string()).collect());
        self
    }

    pub fn excluded_platforms(&self) -> &[Platform] {
        self.platforms
            .as_ref()
            .map(|p| p.exclude.as_slice())
            .unwrap_or_default()
    }

    pub fn client_include(&self) -> Option<&[String]> {
        self.clients.as_ref().and_then(|c| c.include.as_deref())
    }

    pub fn client_exclude(&self) -> Option<&[String]> {
        self.clients.as_ref().and_then(|c| c.exclude.as_deref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformRules {
    #[serde(default)]
    pub exclude: Vec<Platform>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientRules {
    /// Whitelist: when present, only these clients receive the server
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude: Option<Vec<String>>,
}

/// Per-client settings
///
/// Every field is optional so a config layer only overrides what it sets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientSettings {
    /// When false, discovery skips the client entirely
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub binary_path: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_bundle_path: Option<PathBuf>,

    /// Overrides the client config file location
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_path: Option<PathBuf>,
}

impl ClientSettings {
    pub fn is_enabled(&self) -> bool {
        self.enabled.unwrap_or(true)
    }

    /// Merge another layer into this one; set fields in `other` win.
    pub fn merge(&mut self, other: ClientSettings) {
        merge_field(&mut self.enabled, other.enabled);
        merge_field(&mut self.binary_path, other.binary_path);
        merge_field(&mut self.app_bundle_path, other.app_bundle_path);
        merge_field(&mut self.config_path, other.config_path);
    }
}

fn merge_field<T>(base: &mut Option<T>, layer: Option<T>) {
    if layer.is_some() {
        *base = layer;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoverySettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,

    /// `wsl2` forces WSL2 treatment; any other value forces it off
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wsl2_auto_detect: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wsl2: Option<Wsl2Settings>,
}

impl DiscoverySettings {
    fn is_default(&self) -> bool {
        *self == Self::default()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.unwrap_or(true)
    }

    pub fn auto_detects_wsl2(&self) -> bool {
        self.wsl2_auto_detect.unwrap_or(true)
    }

    pub fn timeout(&self) -> std::time::Duration {
        self.timeout_ms
            .map(std::time::Duration::from_millis)
            .unwrap_or(DEFAULT_PROBE_TIMEOUT)
    }

    pub fn windows_user_profile(&self) -> Option<&PathBuf> {
        self.wsl2.as_ref().and_then(|w| w.windows_user_profile.as_ref())
    }

    /// Merge another layer into this one field by field.
    pub fn merge(&mut self, other: DiscoverySettings) {
        let other_profile = other.windows_user_profile().cloned();
        merge_field(&mut self.enabled, other.enabled);
        merge_field(&mut self.timeout_ms, other.timeout_ms);
        merge_field(&mut self.environment, other.environment);
        merge_field(&mut self.wsl2_auto_detect, other.wsl2_auto_detect);
        if let Some(profile) = other_profile {
            self.wsl2 = Some(Wsl2Settings {
                windows_user_profile: Some(profile),
            });
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wsl2Settings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub windows_user_profile: Option<PathBuf>,
}

const DEFAULT_BACKUP_RETENTION: usize = 10;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncSettings {
    /// Snapshot client configs before overwriting them
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup_dir: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup_retention: Option<usize>,
}

impl SyncSettings {
    fn is_default(&self) -> bool {
        *self == Self::default()
    }

    pub fn backup_enabled(&self) -> bool {
        self.backup.unwrap_or(true)
    }

    /// How many backups to keep per client.
    pub fn retention(&self) -> usize {
        self.backup_retention.unwrap_or(DEFAULT_BACKUP_RETENTION)
    }

    /// Merge another layer into this one field by field.
    pub fn merge(&mut self, other: SyncSettings) {
        merge_field(&mut self.backup, other.backup);
        merge_field(&mut self.backup_dir, other.backup_dir);
        merge_field(&mut self.backup_retention, other.backup_retention);
    }
}
