//! Client discovery: which clients are installed, and where.
//!
//! Each client is resolved by an ordered list of strategies; the first one
//! that produces a result wins:
//!
//! 1. Disabled in config: skipped
//! 2. Explicit `binary_path` / `app_bundle_path` override that exists
//! 3. Native binary or app bundle detection
//! 4. Windows-side install when running under WSL2
//!
//! Detection never fails. Anything that goes wrong becomes a warning on the
//! [`DiscoveryResult`].

pub mod binary;
pub mod wsl2;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::client::{ClientAdapter, ClientContext};
use crate::config::{ClientSettings, DiscoverySettings, OvertureConfig};
use crate::fs::FileSystem;
use crate::process::ProcessPort;
use crate::types::Platform;

pub use binary::{BinaryDetector, parse_version};
pub use wsl2::{
    WindowsInstallPaths, Wsl2Detector, to_windows_path, translate_windows_path,
    windows_config_path, windows_install_paths,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiscoveryStatus {
    Found,
    NotFound,
    Skipped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiscoverySource {
    Native,
    ConfigOverride,
    Wsl2Fallback,
}

/// Outcome of discovering one client.
///
/// A `Found` result always carries a binary path or an app bundle path; the
/// constructors are the only way to set either.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiscoveryResult {
    pub client: String,
    status: DiscoveryStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    binary_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    app_bundle_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_valid: Option<bool>,
    pub warnings: Vec<String>,
    pub source: DiscoverySource,
    /// Raw Windows path of a WSL2 fallback hit
    #[serde(skip_serializing_if = "Option::is_none")]
    pub windows_path: Option<String>,
}

impl DiscoveryResult {
    fn empty(client: &str, status: DiscoveryStatus, source: DiscoverySource) -> Self {
        Self {
            client: client.to_string(),
            status,
            binary_path: None,
            app_bundle_path: None,
            version: None,
            config_path: None,
            config_valid: None,
            warnings: Vec::new(),
            source,
            windows_path: None,
        }
    }

    pub fn found_binary(client: &str, path: PathBuf, source: DiscoverySource) -> Self {
        let mut result = Self::empty(client, DiscoveryStatus::Found, source);
        result.binary_path = Some(path);
        result
    }

    pub fn found_app_bundle(client: &str, path: PathBuf, source: DiscoverySource) -> Self {
        let mut result = Self::empty(client, DiscoveryStatus::Found, source);
        result.app_bundle_path = Some(path);
        result
    }

    pub fn not_found(client: &str, warnings: Vec<String>) -> Self {
        let mut result = Self::empty(client, DiscoveryStatus::NotFound, DiscoverySource::Native);
        result.warnings = warnings;
        result
    }

    pub fn skipped(client: &str, reason: impl Into<String>) -> Self {
        let mut result = Self::empty(
            client,
            DiscoveryStatus::Skipped,
            DiscoverySource::ConfigOverride,
        );
        result.warnings.push(reason.into());
        result
    }

    pub fn with_version(mut self, version: Option<String>) -> Self {
        self.version = version;
        self
    }

    pub fn status(&self) -> DiscoveryStatus {
        self.status
    }

    pub fn is_found(&self) -> bool {
        self.status == DiscoveryStatus::Found
    }

    pub fn binary_path(&self) -> Option<&Path> {
        self.binary_path.as_deref()
    }

    pub fn app_bundle_path(&self) -> Option<&Path> {
        self.app_bundle_path.as_deref()
    }
}

/// Host environment as seen by discovery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnvironmentInfo {
    pub platform: Platform,
    pub is_wsl2: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distro_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub windows_user_profile: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DiscoverySummary {
    pub total: usize,
    pub found: usize,
    pub not_found: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct DiscoveryReport {
    pub environment: EnvironmentInfo,
    pub clients: Vec<DiscoveryResult>,
    pub summary: DiscoverySummary,
}

impl DiscoveryReport {
    pub fn get(&self, client: &str) -> Option<&DiscoveryResult> {
        self.clients.iter().find(|r| r.client == client)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Strategy {
    Disabled,
    ConfigOverride,
    Native,
    Wsl2Fallback,
}

const ORDER: [Strategy; 4] = [
    Strategy::Disabled,
    Strategy::ConfigOverride,
    Strategy::Native,
    Strategy::Wsl2Fallback,
];

/// Orchestrates per-client detection.
#[derive(Debug)]
pub struct DiscoveryService {
    process: Arc<dyn ProcessPort>,
    fs: Arc<dyn FileSystem>,
    settings: DiscoverySettings,
    clients: BTreeMap<String, ClientSettings>,
    ctx: ClientContext,
    binary: BinaryDetector,
    wsl2: Wsl2Detector,
}

impl DiscoveryService {
    pub fn new(
        process: Arc<dyn ProcessPort>,
        fs: Arc<dyn FileSystem>,
        config: &OvertureConfig,
        ctx: ClientContext,
    ) -> Self {
        let settings = config.discovery.clone();
        let timeout = settings.timeout();
        let binary = BinaryDetector::new(
            Arc::clone(&process),
            Arc::clone(&fs),
            ctx.home_dir.clone(),
            timeout,
        );
        let wsl2 = Wsl2Detector::new(Arc::clone(&process), Arc::clone(&fs), timeout)
            .with_profile_override(settings.windows_user_profile().cloned());

        Self {
            process,
            fs,
            settings,
            clients: config.clients.clone(),
            ctx,
            binary,
            wsl2,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.settings.timeout()
    }

    pub fn wsl2(&self) -> &Wsl2Detector {
        &self.wsl2
    }

    /// Resolve the effective platform and WSL2 state.
    pub fn environment(&self) -> EnvironmentInfo {
        let forced = self.settings.environment.as_deref();
        let is_wsl2 = match forced {
            Some(env) => env.eq_ignore_ascii_case("wsl2"),
            None => self.settings.auto_detects_wsl2() && self.wsl2.is_wsl2(),
        };
        let platform = forced
            .filter(|_| !is_wsl2)
            .and_then(|env| env.parse::<Platform>().ok())
            .unwrap_or_else(|| self.process.platform());

        EnvironmentInfo {
            platform,
            is_wsl2,
            distro_name: if is_wsl2 { self.wsl2.distro_name() } else { None },
            windows_user_profile: if is_wsl2 {
                self.wsl2.windows_user_profile()
            } else {
                None
            },
        }
    }

    pub fn discover_client(&self, adapter: &dyn ClientAdapter) -> DiscoveryResult {
        let env = self.environment();
        self.discover_in(adapter, &env)
    }

    pub fn discover_all(&self, adapters: &[&dyn ClientAdapter]) -> DiscoveryReport {
        let environment = self.environment();
        let clients: Vec<_> = adapters
            .iter()
            .map(|adapter| self.discover_in(*adapter, &environment))
            .collect();

        let mut summary = DiscoverySummary {
            total: clients.len(),
            ..Default::default()
        };
        for result in &clients {
            match result.status() {
                DiscoveryStatus::Found => summary.found += 1,
                DiscoveryStatus::NotFound => summary.not_found += 1,
                DiscoveryStatus::Skipped => summary.skipped += 1,
            }
        }

        tracing::info!(
            found = summary.found,
            not_found = summary.not_found,
            skipped = summary.skipped,
            "Discovery complete"
        );

        DiscoveryReport {
            environment,
            clients,
            summary,
        }
    }

    /// Config file a client reads: an explicit `config_path` override, else
    /// the adapter's user path for `platform`.
    pub fn config_path_for(&self, adapter: &dyn ClientAdapter, platform: Platform) -> PathBuf {
        self.client_settings(adapter)
            .and_then(|s| s.config_path.clone())
            .unwrap_or_else(|| adapter.config_paths(&self.ctx, platform).user)
    }

    fn client_settings(&self, adapter: &dyn ClientAdapter) -> Option<&ClientSettings> {
        self.clients.get(adapter.name())
    }

    /// Discover one client against an already resolved environment.
    pub fn discover_in(&self, adapter: &dyn ClientAdapter, env: &EnvironmentInfo) -> DiscoveryResult {
        let mut warnings = Vec::new();
        let result = ORDER
            .iter()
            .find_map(|strategy| self.apply(*strategy, adapter, env, &mut warnings));

        match result {
            Some(result) => {
                tracing::debug!(
                    client = adapter.name(),
                    status = ?result.status(),
                    source = ?result.source,
                    "Discovered client"
                );
                result
            }
            None => {
                tracing::debug!(client = adapter.name(), "Client not found");
                DiscoveryResult::not_found(adapter.name(), warnings)
            }
        }
    }

    fn apply(
        &self,
        strategy: Strategy,
        adapter: &dyn ClientAdapter,
        env: &EnvironmentInfo,
        warnings: &mut Vec<String>,
    ) -> Option<DiscoveryResult> {
        match strategy {
            Strategy::Disabled => self.disabled(adapter),
            Strategy::ConfigOverride => self.config_override(adapter, env, warnings),
            Strategy::Native => {
                let config_path = self.config_path_for(adapter, env.platform);
                let result = self.binary.detect_client(adapter, env.platform, &config_path);
                if result.is_found() {
                    Some(result)
                } else {
                    warnings.extend(result.warnings);
                    None
                }
            }
            Strategy::Wsl2Fallback => self.wsl2_fallback(adapter, env),
        }
    }

    fn disabled(&self, adapter: &dyn ClientAdapter) -> Option<DiscoveryResult> {
        if !self.settings.is_enabled() {
            return Some(DiscoveryResult::skipped(
                adapter.name(),
                "Discovery disabled in config",
            ));
        }
        match self.client_settings(adapter) {
            Some(settings) if !settings.is_enabled() => Some(DiscoveryResult::skipped(
                adapter.name(),
                "Client disabled in config",
            )),
            _ => None,
        }
    }

    fn config_override(
        &self,
        adapter: &dyn ClientAdapter,
        env: &EnvironmentInfo,
        warnings: &mut Vec<String>,
    ) -> Option<DiscoveryResult> {
        let settings = self.client_settings(adapter)?;

        let mut result = None;
        if let Some(path) = &settings.binary_path {
            if self.fs.exists(path) {
                let mut version_warnings = Vec::new();
                let version = self.binary.detect_version(path, &mut version_warnings);
                let mut found = DiscoveryResult::found_binary(
                    adapter.name(),
                    path.clone(),
                    DiscoverySource::ConfigOverride,
                )
                .with_version(version);
                found.warnings = version_warnings;
                result = Some(found);
            } else {
                warnings.push(format!(
                    "Configured binary_path {} does not exist",
                    path.display()
                ));
            }
        }
        if result.is_none()
            && let Some(path) = &settings.app_bundle_path
        {
            if self.fs.exists(path) {
                result = Some(DiscoveryResult::found_app_bundle(
                    adapter.name(),
                    path.clone(),
                    DiscoverySource::ConfigOverride,
                ));
            } else {
                warnings.push(format!(
                    "Configured app_bundle_path {} does not exist",
                    path.display()
                ));
            }
        }

        let mut result = result?;
        let config_path = self.config_path_for(adapter, env.platform);
        self.binary.probe_config(&mut result, &config_path);
        Some(result)
    }

    fn wsl2_fallback(
        &self,
        adapter: &dyn ClientAdapter,
        env: &EnvironmentInfo,
    ) -> Option<DiscoveryResult> {
        if !env.is_wsl2 {
            return None;
        }
        let profile = env.windows_user_profile.as_deref()?;
        let kind = adapter.kind();
        let install = windows_install_paths(kind, profile);

        let mut result = if let Some(path) =
            install.binaries.iter().find(|p| self.fs.exists(p))
        {
            DiscoveryResult::found_binary(adapter.name(), path.clone(), DiscoverySource::Wsl2Fallback)
        } else {
            let path = install.app_bundles.iter().find(|p| self.fs.exists(p))?;
            DiscoveryResult::found_app_bundle(
                adapter.name(),
                path.clone(),
                DiscoverySource::Wsl2Fallback,
            )
        };

        result.windows_path = result
            .binary_path()
            .or(result.app_bundle_path())
            .and_then(to_windows_path);

        let config_path = self
            .client_settings(adapter)
            .and_then(|s| s.config_path.clone())
            .unwrap_or_else(|| windows_config_path(kind, profile));
        self.binary.probe_config(&mut result, &config_path);
        Some(result)
    }
}
