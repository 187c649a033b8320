//! Audit of servers configured directly in clients, outside overture.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::client::{ClientAdapter, ClientContext};
use crate::config::OvertureConfig;
use crate::config::client_config::servers_at_root;
use crate::error::SyncError;
use crate::fs::FileSystem;
use crate::mcp::compare_mcp_configs;
use crate::types::Platform;

/// Client name to the sorted unmanaged server names found in it.
pub type AuditReport = BTreeMap<String, Vec<String>>;

#[derive(Debug)]
pub struct AuditService {
    fs: Arc<dyn FileSystem>,
    ctx: ClientContext,
    platform: Platform,
}

impl AuditService {
    pub fn new(fs: Arc<dyn FileSystem>, ctx: ClientContext, platform: Platform) -> Self {
        Self { fs, ctx, platform }
    }

    /// Unmanaged server names across the client's user and project configs.
    pub fn audit_client(
        &self,
        adapter: &dyn ClientAdapter,
        config: &OvertureConfig,
    ) -> Result<Vec<String>, SyncError> {
        let mut combined = Map::new();
        for path in self.config_files(adapter, config) {
            let document = adapter.read_config(self.fs.as_ref(), &path)?;
            let servers = servers_at_root(&document, adapter.schema_root_key())
                .map_err(|err| SyncError::config_read(adapter.name(), &path, err))?;
            combined.extend(servers);
        }

        let comparison = compare_mcp_configs(&config.mcp, &combined);
        Ok(comparison
            .unmanaged_names()
            .into_iter()
            .map(str::to_string)
            .collect())
    }

    /// Audit every adapter, omitting clients with nothing unmanaged.
    ///
    /// A client whose config cannot be read is logged and left out.
    pub fn audit_all_clients(
        &self,
        adapters: &[&dyn ClientAdapter],
        config: &OvertureConfig,
    ) -> AuditReport {
        let mut report = AuditReport::new();
        for adapter in adapters {
            match self.audit_client(*adapter, config) {
                Ok(names) if names.is_empty() => {}
                Ok(names) => {
                    report.insert(adapter.name().to_string(), names);
                }
                Err(err) => tracing::warn!(client = adapter.name(), error = %err, "Audit skipped"),
            }
        }
        report
    }

    /// Raw unmanaged entries of one client, for importing them into overture.
    pub fn unmanaged_entries(
        &self,
        adapter: &dyn ClientAdapter,
        config: &OvertureConfig,
    ) -> Result<Map<String, Value>, SyncError> {
        let mut entries = Map::new();
        for path in self.config_files(adapter, config) {
            let document = adapter.read_config(self.fs.as_ref(), &path)?;
            let servers = servers_at_root(&document, adapter.schema_root_key())
                .map_err(|err| SyncError::config_read(adapter.name(), &path, err))?;
            entries.extend(crate::mcp::get_unmanaged_mcps(&config.mcp, &servers));
        }
        Ok(entries)
    }

    fn config_files(&self, adapter: &dyn ClientAdapter, config: &OvertureConfig) -> Vec<PathBuf> {
        let paths = adapter.config_paths(&self.ctx, self.platform);
        let user = config
            .client_settings(adapter.name())
            .and_then(|s| s.config_path.clone())
            .unwrap_or(paths.user);
        std::iter::once(user).chain(paths.project).collect()
    }
}

/// One `overture import` command per distinct unmanaged name.
pub fn generate_suggestions(report: &AuditReport) -> Vec<String> {
    report
        .values()
        .flatten()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(|name| format!("overture import {}", name))
        .collect()
}
