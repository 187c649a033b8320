//! Per-client synchronization of overture servers into client configs.
//!
//! For each client, in order: discover, resolve the target file, read it,
//! filter and expand definitions, render them in the client's shape, keep
//! unmanaged entries, diff, then back up and write. A failing client yields
//! an error for that client only.

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::backup::{BackupRecord, BackupService};
use crate::client::{ClientAdapter, ClientContext};
use crate::config::client_config::{hash_json, servers_at_root, with_servers_at_root};
use crate::config::diff::generate_document_diff;
use crate::config::{ConfigDiff, OvertureConfig, ServerDefinition};
use crate::discovery::{
    DiscoveryResult, DiscoveryService, DiscoverySource, DiscoveryStatus, EnvironmentInfo,
};
use crate::error::SyncError;
use crate::fs::FileSystem;
use crate::mcp::{
    expand_server_env, filter_mcps_for_client, get_unmanaged_mcps, should_expand_env_vars,
    unresolved_server_vars,
};
use crate::process::ProcessPort;
use crate::types::{Platform, SyncScope};

#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    /// Compute diffs without writing anything
    pub dry_run: bool,
    /// Restrict the run to these clients; empty means all
    pub clients: Vec<String>,
    pub scope: SyncScope,
    /// Overrides `sync.backup` from the config when set
    pub backup: Option<bool>,
    /// Write configs for clients that discovery did not find
    pub include_undetected: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SyncAction {
    Written,
    Unchanged,
    DryRun,
    Skipped,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClientSyncResult {
    pub client: String,
    pub action: SyncAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff: Option<ConfigDiff>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup: Option<BackupRecord>,
    /// Unmanaged entries carried over from the existing config
    pub preserved: Vec<String>,
    pub warnings: Vec<String>,
}

impl ClientSyncResult {
    fn skipped(client: &str, warnings: Vec<String>) -> Self {
        Self {
            client: client.to_string(),
            action: SyncAction::Skipped,
            config_path: None,
            diff: None,
            backup: None,
            preserved: Vec::new(),
            warnings,
        }
    }
}

#[derive(Debug)]
pub struct SyncReport {
    pub environment: EnvironmentInfo,
    pub results: Vec<Result<ClientSyncResult, SyncError>>,
}

impl SyncReport {
    pub fn succeeded(&self) -> impl Iterator<Item = &ClientSyncResult> {
        self.results.iter().filter_map(|r| r.as_ref().ok())
    }

    pub fn errors(&self) -> impl Iterator<Item = &SyncError> {
        self.results.iter().filter_map(|r| r.as_ref().err())
    }

    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }
}

#[derive(Debug)]
pub struct SyncEngine {
    fs: Arc<dyn FileSystem>,
    config: OvertureConfig,
    ctx: ClientContext,
    discovery: DiscoveryService,
    backups: BackupService,
    env_vars: HashMap<String, String>,
}

impl SyncEngine {
    pub fn new(
        fs: Arc<dyn FileSystem>,
        process: Arc<dyn ProcessPort>,
        config: OvertureConfig,
        ctx: ClientContext,
        backup_dir: PathBuf,
    ) -> Self {
        let env_vars = process.env_vars();
        let discovery =
            DiscoveryService::new(Arc::clone(&process), Arc::clone(&fs), &config, ctx.clone());
        let backups = BackupService::new(Arc::clone(&fs), backup_dir);
        Self {
            fs,
            config,
            ctx,
            discovery,
            backups,
            env_vars,
        }
    }

    pub fn discovery(&self) -> &DiscoveryService {
        &self.discovery
    }

    pub fn backups(&self) -> &BackupService {
        &self.backups
    }

    pub fn config(&self) -> &OvertureConfig {
        &self.config
    }

    /// Sync every adapter selected by `options`, one after another.
    pub fn sync_all(&self, adapters: &[&dyn ClientAdapter], options: &SyncOptions) -> SyncReport {
        let environment = self.discovery.environment();
        let results = adapters
            .iter()
            .filter(|a| options.clients.is_empty() || options.clients.iter().any(|c| c == a.name()))
            .map(|adapter| {
                let discovered = self.discovery.discover_in(*adapter, &environment);
                let result = self.sync_client(*adapter, &discovered, &environment, options);
                if let Err(err) = &result {
                    tracing::warn!(client = adapter.name(), error = %err, "Client sync failed");
                }
                result
            })
            .collect();

        SyncReport {
            environment,
            results,
        }
    }

    pub fn sync_client(
        &self,
        adapter: &dyn ClientAdapter,
        discovered: &DiscoveryResult,
        environment: &EnvironmentInfo,
        options: &SyncOptions,
    ) -> Result<ClientSyncResult, SyncError> {
        let client = adapter.name();
        let mut warnings = Vec::new();

        let disabled = self
            .config
            .client_settings(client)
            .is_some_and(|settings| !settings.is_enabled());
        if disabled {
            warnings.push("Client disabled in config".to_string());
            return Ok(ClientSyncResult::skipped(client, warnings));
        }
        if discovered.status() != DiscoveryStatus::Found && !options.include_undetected {
            warnings.push("Client not detected".to_string());
            warnings.extend(discovered.warnings.iter().cloned());
            return Ok(ClientSyncResult::skipped(client, warnings));
        }

        let platform = effective_platform(discovered, environment);

        let Some(path) = self.target_path(adapter, discovered, platform, options.scope) else {
            warnings.push(format!(
                "{} has no {}-scope config",
                client,
                options.scope.as_str()
            ));
            return Ok(ClientSyncResult::skipped(client, warnings));
        };

        let existing = adapter.read_config(self.fs.as_ref(), &path)?;
        let root_key = adapter.schema_root_key();
        let existing_servers = servers_at_root(&existing, root_key)
            .map_err(|err| SyncError::config_read(client, &path, format!("{err:#}")))?;

        let filtered = filter_mcps_for_client(&self.config.mcp, adapter, platform);
        for (name, reason) in &filtered.excluded {
            warnings.push(format!("Skipped {}: {}", name, reason));
        }

        let expanded = self.expand_for_client(adapter, &filtered.included, &mut warnings);
        let rendered = adapter.convert_from_overture(&expanded);
        let mut servers = match rendered.get(root_key) {
            Some(Value::Object(entries)) => entries.clone(),
            _ => Map::new(),
        };

        let unmanaged = get_unmanaged_mcps(&self.config.mcp, &existing_servers);
        let preserved: Vec<String> = unmanaged.keys().cloned().collect();
        for (name, entry) in unmanaged {
            servers.entry(name).or_insert(entry);
        }

        let updated = with_servers_at_root(existing.clone(), root_key, servers);
        let diff = generate_document_diff(&existing, &updated, root_key);

        let mut result = ClientSyncResult {
            client: client.to_string(),
            action: SyncAction::DryRun,
            config_path: Some(path.clone()),
            diff: Some(diff),
            backup: None,
            preserved,
            warnings,
        };

        if options.dry_run {
            return Ok(result);
        }

        let exists = self.fs.exists(&path);
        if exists
            && hash_json(&Value::Object(existing.clone())) == hash_json(&Value::Object(updated.clone()))
        {
            tracing::debug!(client, "Config unchanged, skipping write");
            result.action = SyncAction::Unchanged;
            return Ok(result);
        }

        let backup_enabled = options.backup.unwrap_or(self.config.sync.backup_enabled());
        if backup_enabled && exists {
            result.backup = Some(self.backups.backup_config(client, &path)?);
        }

        adapter.write_config(self.fs.as_ref(), &path, &updated)?;
        tracing::info!(client, path = %path.display(), "Wrote client config");
        result.action = SyncAction::Written;

        if result.backup.is_some() {
            self.backups
                .cleanup_old_backups(client, self.config.sync.retention());
        }

        Ok(result)
    }

    /// User-scope config file of `adapter` in the current environment.
    ///
    /// Resolved the same way a sync would, so a WSL2 host gets the Windows
    /// path of a Windows-side install.
    pub fn user_config_path(&self, adapter: &dyn ClientAdapter) -> PathBuf {
        let environment = self.discovery.environment();
        let discovered = self.discovery.discover_in(adapter, &environment);
        let platform = effective_platform(&discovered, &environment);
        self.target_path(adapter, &discovered, platform, SyncScope::User)
            .unwrap_or_else(|| self.discovery.config_path_for(adapter, platform))
    }

    /// Where a client's config is written for `scope`.
    ///
    /// User scope prefers an explicit `config_path` override, then the path
    /// discovery resolved, then the adapter default.
    fn target_path(
        &self,
        adapter: &dyn ClientAdapter,
        discovered: &DiscoveryResult,
        platform: Platform,
        scope: SyncScope,
    ) -> Option<PathBuf> {
        match scope {
            SyncScope::User => {
                let override_path = self
                    .config
                    .client_settings(adapter.name())
                    .and_then(|s| s.config_path.clone());
                Some(
                    override_path
                        .or_else(|| discovered.config_path.clone())
                        .unwrap_or_else(|| self.discovery.config_path_for(adapter, platform)),
                )
            }
            SyncScope::Project => adapter.detect_config_path(&self.ctx, platform, scope),
        }
    }

    fn expand_for_client(
        &self,
        adapter: &dyn ClientAdapter,
        servers: &BTreeMap<String, ServerDefinition>,
        warnings: &mut Vec<String>,
    ) -> BTreeMap<String, ServerDefinition> {
        let expand = should_expand_env_vars(adapter);
        servers
            .iter()
            .map(|(name, definition)| {
                if expand {
                    for var in unresolved_server_vars(definition, &self.env_vars) {
                        warnings.push(format!(
                            "Environment variable {} is not set (used by {})",
                            var, name
                        ));
                    }
                }
                let expanded = expand_server_env(definition, adapter, &self.env_vars);
                (name.clone(), expanded.into_owned())
            })
            .collect()
    }
}

/// A Windows-side install reads Windows rules, even when found from WSL2.
fn effective_platform(discovered: &DiscoveryResult, environment: &EnvironmentInfo) -> Platform {
    match discovered.source {
        DiscoverySource::Wsl2Fallback if discovered.is_found() => Platform::Win32,
        _ => environment.platform,
    }
}

