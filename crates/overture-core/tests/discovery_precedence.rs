mod support;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use overture_core::client::{ClientContext, ClientKind, ClientRegistry, adapter_for};
use overture_core::config::parse_config_str;
use overture_core::discovery::{BinaryDetector, DiscoveryService, DiscoverySource, DiscoveryStatus};
use overture_core::types::Platform;

use support::{FakeProcess, MemoryFs};

const HOME: &str = "/home/dev";

fn service(process: FakeProcess, fs: &Arc<MemoryFs>, yaml: &str) -> DiscoveryService {
    let config = parse_config_str(yaml).expect("config");
    let ctx = ClientContext::new(PathBuf::from(HOME), None);
    DiscoveryService::new(Arc::new(process), fs.clone(), &config, ctx)
}

#[test]
fn native_binary_is_found_with_version_and_config() {
    let fs = Arc::new(MemoryFs::new());
    fs.add_file("/home/dev/.claude.json", r#"{"mcpServers": {}}"#);
    let process = FakeProcess::new(Platform::Linux, HOME).with_binary(
        "claude",
        "/usr/local/bin/claude",
        "1.0.24 (Claude Code)\n",
    );
    let discovery = service(process, &fs, "");

    let result = discovery.discover_client(adapter_for(ClientKind::ClaudeCode).as_ref());

    assert_eq!(result.status(), DiscoveryStatus::Found);
    assert_eq!(result.source, DiscoverySource::Native);
    assert_eq!(result.binary_path(), Some(Path::new("/usr/local/bin/claude")));
    assert_eq!(result.version.as_deref(), Some("1.0.24"));
    assert_eq!(result.config_path, Some(PathBuf::from("/home/dev/.claude.json")));
    assert_eq!(result.config_valid, Some(true));
}

#[test]
fn config_override_wins_over_native() {
    let fs = Arc::new(MemoryFs::new());
    fs.add_file("/opt/claude/bin/claude", "");
    let process = FakeProcess::new(Platform::Linux, HOME).with_binary(
        "claude",
        "/usr/local/bin/claude",
        "1.0.24",
    );
    let discovery = service(
        process,
        &fs,
        "clients:\n  claude-code:\n    binary_path: /opt/claude/bin/claude\n",
    );

    let result = discovery.discover_client(adapter_for(ClientKind::ClaudeCode).as_ref());

    assert_eq!(result.source, DiscoverySource::ConfigOverride);
    assert_eq!(result.binary_path(), Some(Path::new("/opt/claude/bin/claude")));
}

#[test]
fn missing_override_falls_through_to_native() {
    let fs = Arc::new(MemoryFs::new());
    let process = FakeProcess::new(Platform::Linux, HOME).with_binary(
        "cursor",
        "/usr/bin/cursor",
        "0.42.3",
    );
    let discovery = service(
        process,
        &fs,
        "clients:\n  cursor:\n    binary_path: /nowhere/cursor\n",
    );

    let result = discovery.discover_client(adapter_for(ClientKind::Cursor).as_ref());

    assert_eq!(result.source, DiscoverySource::Native);
    assert_eq!(result.binary_path(), Some(Path::new("/usr/bin/cursor")));
}

#[test]
fn disabled_client_is_skipped_before_probing() {
    let fs = Arc::new(MemoryFs::new());
    let process = FakeProcess::new(Platform::Linux, HOME).with_binary(
        "gemini",
        "/usr/bin/gemini",
        "0.9.1",
    );
    let discovery = service(process, &fs, "clients:\n  gemini-cli:\n    enabled: false\n");

    let result = discovery.discover_client(adapter_for(ClientKind::GeminiCli).as_ref());

    assert_eq!(result.status(), DiscoveryStatus::Skipped);
    assert_eq!(result.source, DiscoverySource::ConfigOverride);
}

#[test]
fn required_binary_missing_is_not_found_even_with_bundle() {
    let fs = Arc::new(MemoryFs::new());
    let process = FakeProcess::new(Platform::Linux, HOME);
    let discovery = service(process, &fs, "");

    let result = discovery.discover_client(adapter_for(ClientKind::CopilotCli).as_ref());

    assert_eq!(result.status(), DiscoveryStatus::NotFound);
    assert!(result.binary_path().is_none() && result.app_bundle_path().is_none());
    assert!(result.warnings.iter().any(|w| w.contains("copilot")));
}

#[test]
fn app_bundle_counts_when_binary_optional() {
    let fs = Arc::new(MemoryFs::new());
    fs.add_dir("/Applications/Claude.app");
    let process = FakeProcess::new(Platform::Darwin, HOME);
    let discovery = service(process, &fs, "");

    let result = discovery.discover_client(adapter_for(ClientKind::ClaudeDesktop).as_ref());

    assert_eq!(result.status(), DiscoveryStatus::Found);
    assert_eq!(result.app_bundle_path(), Some(Path::new("/Applications/Claude.app")));
    assert_eq!(result.config_valid, Some(false));
}

#[test]
fn invalid_client_config_becomes_warning() {
    let fs = Arc::new(MemoryFs::new());
    fs.add_file("/home/dev/.cursor/mcp.json", "{ not json");
    let process =
        FakeProcess::new(Platform::Linux, HOME).with_binary("cursor", "/usr/bin/cursor", "0.42.3");
    let discovery = service(process, &fs, "");

    let result = discovery.discover_client(adapter_for(ClientKind::Cursor).as_ref());

    assert!(result.is_found());
    assert_eq!(result.config_valid, Some(false));
    assert!(result.warnings.iter().any(|w| w.contains("invalid")));
}

#[test]
fn binary_lookup_runs_once_per_name() {
    let fs = Arc::new(MemoryFs::new());
    let process = Arc::new(FakeProcess::new(Platform::Linux, HOME).with_binary(
        "code",
        "/usr/bin/code",
        "1.90.0",
    ));
    let detector = BinaryDetector::new(
        process.clone(),
        fs,
        PathBuf::from(HOME),
        Duration::from_millis(100),
    );

    assert_eq!(
        detector.find_binary("code", Platform::Linux),
        Some(PathBuf::from("/usr/bin/code"))
    );
    assert_eq!(detector.find_binary("cursor", Platform::Linux), None);

    let lookups: Vec<_> = process
        .calls()
        .into_iter()
        .filter(|c| c.starts_with("which "))
        .collect();
    assert_eq!(lookups, vec!["which code", "which cursor"]);
}

#[test]
fn timed_out_lookup_counts_as_missing() {
    let fs = Arc::new(MemoryFs::new());
    let process = FakeProcess::new(Platform::Linux, HOME)
        .with_binary("code", "/usr/bin/code", "1.90.0")
        .hanging("which");
    let detector = BinaryDetector::new(
        Arc::new(process),
        fs,
        PathBuf::from(HOME),
        Duration::from_millis(100),
    );

    assert_eq!(detector.find_binary("code", Platform::Linux), None);
}

#[test]
fn hanging_version_probe_leaves_version_unset() {
    let fs = Arc::new(MemoryFs::new());
    let process = FakeProcess::new(Platform::Linux, HOME)
        .with_binary("windsurf", "/usr/bin/windsurf", "1.2.3")
        .hanging("/usr/bin/windsurf");
    let discovery = service(process, &fs, "");

    let result = discovery.discover_client(adapter_for(ClientKind::Windsurf).as_ref());

    assert!(result.is_found());
    assert_eq!(result.version, None);
    assert!(result.warnings.iter().any(|w| w.contains("Timed out")));
}

#[test]
fn wsl2_fallback_finds_windows_install() {
    let fs = Arc::new(MemoryFs::new());
    fs.add_dir("/mnt/c/Users/dev/AppData/Local/Programs/cursor");
    let mut process = FakeProcess::new(Platform::Linux, HOME).with_env("WSL_DISTRO_NAME", "Ubuntu");
    process.windows_profile = Some(r"C:\Users\dev".to_string());
    let discovery = service(process, &fs, "");

    let result = discovery.discover_client(adapter_for(ClientKind::Cursor).as_ref());

    assert_eq!(result.status(), DiscoveryStatus::Found);
    assert_eq!(result.source, DiscoverySource::Wsl2Fallback);
    assert_eq!(
        result.windows_path.as_deref(),
        Some(r"C:\Users\dev\AppData\Local\Programs\cursor")
    );
    assert_eq!(
        result.config_path,
        Some(PathBuf::from("/mnt/c/Users/dev/.cursor/mcp.json"))
    );
}

#[test]
fn wsl2_fallback_respects_config_path_override() {
    let fs = Arc::new(MemoryFs::new());
    fs.add_dir("/mnt/c/Users/dev/AppData/Local/AnthropicClaude");
    let mut process = FakeProcess::new(Platform::Linux, HOME).with_env("WSL_DISTRO_NAME", "Ubuntu");
    process.windows_profile = Some(r"C:\Users\dev".to_string());
    let discovery = service(
        process,
        &fs,
        "clients:\n  claude-desktop:\n    config_path: /mnt/d/claude/config.json\n",
    );

    let result = discovery.discover_client(adapter_for(ClientKind::ClaudeDesktop).as_ref());

    assert_eq!(result.source, DiscoverySource::Wsl2Fallback);
    assert_eq!(result.config_path, Some(PathBuf::from("/mnt/d/claude/config.json")));
}

#[test]
fn profile_scan_skips_system_accounts_and_prefers_desktop() {
    let fs = Arc::new(MemoryFs::new());
    fs.add_dir("/mnt/c/Users/Public");
    fs.add_dir("/mnt/c/Users/alice");
    fs.add_dir("/mnt/c/Users/dev/Desktop");
    fs.add_file("/proc/version", "Linux version 5.15.90.1-microsoft-standard-WSL2");
    let process = FakeProcess::new(Platform::Linux, HOME);
    let discovery = service(process, &fs, "");

    let env = discovery.environment();

    assert!(env.is_wsl2);
    assert_eq!(env.windows_user_profile, Some(PathBuf::from("/mnt/c/Users/dev")));
}

#[test]
fn explicit_environment_overrides_detection() {
    let fs = Arc::new(MemoryFs::new());
    let process = FakeProcess::new(Platform::Linux, HOME).with_env("WSL_DISTRO_NAME", "Ubuntu");
    let discovery = service(process, &fs, "discovery:\n  environment: darwin\n");

    let env = discovery.environment();

    assert!(!env.is_wsl2);
    assert_eq!(env.platform, Platform::Darwin);
}

#[test]
fn forced_wsl2_uses_configured_profile() {
    let fs = Arc::new(MemoryFs::new());
    let process = FakeProcess::new(Platform::Linux, HOME);
    let discovery = service(
        process,
        &fs,
        "discovery:\n  environment: wsl2\n  wsl2:\n    windows_user_profile: /mnt/c/Users/me\n",
    );

    let env = discovery.environment();

    assert!(env.is_wsl2);
    assert_eq!(env.windows_user_profile, Some(PathBuf::from("/mnt/c/Users/me")));
}

#[test]
fn wsl2_detection_is_memoized_until_reset() {
    let fs = Arc::new(MemoryFs::new());
    let process = FakeProcess::new(Platform::Linux, HOME);
    let discovery = service(process, &fs, "");

    assert!(!discovery.wsl2().is_wsl2());
    fs.add_file("/proc/version", "Linux version 5.15 microsoft-standard-WSL2");
    assert!(!discovery.wsl2().is_wsl2());

    discovery.wsl2().reset();
    assert!(discovery.wsl2().is_wsl2());
}

#[test]
fn disabled_discovery_skips_everything() {
    let fs = Arc::new(MemoryFs::new());
    let process = FakeProcess::new(Platform::Linux, HOME).with_binary(
        "claude",
        "/usr/bin/claude",
        "1.0.0",
    );
    let discovery = service(process, &fs, "discovery:\n  enabled: false\n");
    let registry = ClientRegistry::with_default_clients();
    let adapters: Vec<_> = registry.all().iter().map(|a| a.as_ref()).collect();

    let report = discovery.discover_all(&adapters);

    assert_eq!(report.summary.total, 8);
    assert_eq!(report.summary.skipped, 8);
    assert_eq!(report.summary.found, 0);
}

#[test]
fn report_summarizes_each_status() {
    let fs = Arc::new(MemoryFs::new());
    let process = FakeProcess::new(Platform::Linux, HOME)
        .with_binary("claude", "/usr/bin/claude", "1.0.0")
        .with_binary("code", "/usr/bin/code", "1.95.0");
    let discovery = service(process, &fs, "clients:\n  cursor:\n    enabled: false\n");
    let registry = ClientRegistry::with_default_clients();
    let adapters: Vec<_> = registry.all().iter().map(|a| a.as_ref()).collect();

    let report = discovery.discover_all(&adapters);

    assert_eq!(report.summary.found, 2);
    assert_eq!(report.summary.skipped, 1);
    assert_eq!(report.summary.not_found, 5);
    assert_eq!(
        report.get("vscode").and_then(|r| r.version.as_deref()),
        Some("1.95.0")
    );
    assert!(!report.environment.is_wsl2);
}
