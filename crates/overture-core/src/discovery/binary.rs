//! Native detection of client binaries and app bundles.

use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};
use std::time::Duration;

use regex::Regex;

use super::{DiscoveryResult, DiscoverySource};
use crate::client::ClientAdapter;
use crate::config::client_config::parse_json_document;
use crate::fs::FileSystem;
use crate::process::{ExecOutcome, ProcessPort, path_lookup_command};
use crate::types::Platform;

static VERSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bv?(\d+\.\d+\.\d+(?:-[0-9A-Za-z.-]+)?)").expect("version pattern is valid")
});

/// Extract a version from `--version` output.
///
/// Prefers the first `x.y.z` / `vx.y.z` token anywhere in the output; failing
/// that, takes the first word of the first line when it starts with a digit
/// or `v`.
pub fn parse_version(output: &str) -> Option<String> {
    if let Some(caps) = VERSION_RE.captures(output) {
        let token = &caps[1];
        return Some(match semver::Version::parse(token) {
            Ok(version) => version.to_string(),
            Err(_) => token.to_string(),
        });
    }

    let first_line = output.lines().map(str::trim).find(|l| !l.is_empty())?;
    if !first_line.starts_with(|c: char| c.is_ascii_digit() || c == 'v') {
        return None;
    }
    let token = first_line.split_whitespace().next()?;
    let token = token
        .strip_prefix('v')
        .filter(|rest| rest.starts_with(|c: char| c.is_ascii_digit()))
        .unwrap_or(token);
    Some(token.to_string())
}

/// Detects a client's binary or app bundle on the local OS.
#[derive(Debug, Clone)]
pub struct BinaryDetector {
    process: Arc<dyn ProcessPort>,
    fs: Arc<dyn FileSystem>,
    home_dir: PathBuf,
    timeout: Duration,
}

impl BinaryDetector {
    pub fn new(
        process: Arc<dyn ProcessPort>,
        fs: Arc<dyn FileSystem>,
        home_dir: PathBuf,
        timeout: Duration,
    ) -> Self {
        Self {
            process,
            fs,
            home_dir,
            timeout,
        }
    }

    /// Detect `adapter` natively. Never fails; problems become warnings.
    ///
    /// `config_path` is the file probed for validity once the client is found.
    pub fn detect_client(
        &self,
        adapter: &dyn ClientAdapter,
        platform: Platform,
        config_path: &Path,
    ) -> DiscoveryResult {
        let client = adapter.name();
        let mut warnings = Vec::new();

        let binary = adapter
            .binary_names()
            .iter()
            .find_map(|name| self.find_binary(name, platform));

        let mut result = match binary {
            Some(path) => {
                let version = self.detect_version(&path, &mut warnings);
                DiscoveryResult::found_binary(client, path, DiscoverySource::Native)
                    .with_version(version)
            }
            None => {
                if !adapter.binary_names().is_empty() {
                    warnings.push(format!(
                        "Binary not found on PATH (tried: {})",
                        adapter.binary_names().join(", ")
                    ));
                }
                if adapter.requires_binary() {
                    return DiscoveryResult::not_found(client, warnings);
                }
                let bundle = adapter
                    .app_bundle_paths(platform, &self.home_dir)
                    .into_iter()
                    .find(|path| self.fs.exists(path));
                match bundle {
                    Some(path) => {
                        DiscoveryResult::found_app_bundle(client, path, DiscoverySource::Native)
                    }
                    None => return DiscoveryResult::not_found(client, warnings),
                }
            }
        };

        result.warnings.append(&mut warnings);
        self.probe_config(&mut result, config_path);
        result
    }

    /// Resolve `name` to an absolute path, or `None` if it is not installed.
    ///
    /// One PATH lookup answers both questions; a lookup that times out or
    /// fails counts as absent.
    pub fn find_binary(&self, name: &str, platform: Platform) -> Option<PathBuf> {
        let lookup = self
            .process
            .exec(path_lookup_command(platform), &[name], self.timeout);
        let Some(stdout) = lookup.success_stdout() else {
            tracing::debug!(binary = name, "Binary not found");
            return None;
        };

        let resolved = stdout
            .lines()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .map_or_else(|| PathBuf::from(name), PathBuf::from);
        Some(resolved)
    }

    /// Run `<binary> --version` under the probe timeout.
    pub fn detect_version(&self, binary: &Path, warnings: &mut Vec<String>) -> Option<String> {
        let program = binary.to_string_lossy();
        match self.process.exec(&program, &["--version"], self.timeout) {
            ExecOutcome::Completed {
                success: true,
                stdout,
                stderr,
            } => parse_version(&stdout).or_else(|| parse_version(&stderr)),
            ExecOutcome::Completed { .. } => None,
            ExecOutcome::TimedOut => {
                warnings.push(format!("Timed out reading version from {}", program));
                None
            }
            ExecOutcome::Failed(err) => {
                tracing::debug!(binary = %program, error = %err, "Version probe failed");
                None
            }
        }
    }

    /// Record `path` on the result and whether it holds a parseable document.
    pub fn probe_config(&self, result: &mut DiscoveryResult, path: &Path) {
        result.config_path = Some(path.to_path_buf());
        if !self.fs.exists(path) {
            result.config_valid = Some(false);
            return;
        }

        let parsed = self
            .fs
            .read_to_string(path)
            .map_err(anyhow::Error::from)
            .and_then(|content| parse_json_document(&content));
        match parsed {
            Ok(_) => result.config_valid = Some(true),
            Err(err) => {
                result.config_valid = Some(false);
                result
                    .warnings
                    .push(format!("Config file {} is invalid: {:#}", path.display(), err));
            }
        }
    }
}
