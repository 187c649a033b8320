//! WSL2 detection and Windows-side path resolution.
//!
//! Inside WSL2 the Windows drives are mounted under `/mnt/<drive>`, so clients
//! installed on the Windows side can still be found and configured from Linux.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::client::{ClientContext, ClientKind, adapter_for};
use crate::fs::FileSystem;
use crate::process::ProcessPort;
use crate::types::Platform;

const PROC_VERSION: &str = "/proc/version";
const WINDOWS_USERS_DIR: &str = "/mnt/c/Users";

/// Accounts under `C:\Users` that never belong to a real user.
const SYSTEM_ACCOUNTS: &[&str] = &[
    "Public",
    "Default",
    "Default User",
    "All Users",
    "defaultuser0",
    "WDAGUtilityAccount",
];

#[derive(Debug, Default)]
struct Wsl2State {
    is_wsl2: Option<bool>,
    windows_user_profile: Option<Option<PathBuf>>,
}

/// Detects WSL2 and resolves the Windows user profile.
///
/// Results are memoized for the lifetime of the detector, or until [`reset`].
///
/// [`reset`]: Wsl2Detector::reset
#[derive(Debug)]
pub struct Wsl2Detector {
    process: Arc<dyn ProcessPort>,
    fs: Arc<dyn FileSystem>,
    timeout: Duration,
    profile_override: Option<PathBuf>,
    state: Mutex<Wsl2State>,
}

impl Wsl2Detector {
    pub fn new(process: Arc<dyn ProcessPort>, fs: Arc<dyn FileSystem>, timeout: Duration) -> Self {
        Self {
            process,
            fs,
            timeout,
            profile_override: None,
            state: Mutex::new(Wsl2State::default()),
        }
    }

    /// Use a fixed Windows profile directory instead of resolving one.
    pub fn with_profile_override(mut self, profile: Option<PathBuf>) -> Self {
        self.profile_override = profile;
        self
    }

    pub fn is_wsl2(&self) -> bool {
        let mut state = self.lock_state();
        if let Some(cached) = state.is_wsl2 {
            return cached;
        }
        let detected = self.detect_wsl2();
        tracing::debug!(is_wsl2 = detected, "WSL2 detection");
        state.is_wsl2 = Some(detected);
        detected
    }

    pub fn distro_name(&self) -> Option<String> {
        self.process
            .env_var("WSL_DISTRO_NAME")
            .filter(|name| !name.is_empty())
    }

    /// The Windows user profile as a Linux path, e.g. `/mnt/c/Users/dev`.
    pub fn windows_user_profile(&self) -> Option<PathBuf> {
        if let Some(profile) = &self.profile_override {
            return Some(profile.clone());
        }

        let mut state = self.lock_state();
        if let Some(cached) = &state.windows_user_profile {
            return cached.clone();
        }
        let resolved = self
            .profile_from_cmd()
            .or_else(|| self.profile_from_users_dir());
        tracing::debug!(profile = ?resolved, "Resolved Windows user profile");
        state.windows_user_profile = Some(resolved.clone());
        resolved
    }

    /// Forget memoized detection results.
    pub fn reset(&self) {
        *self.lock_state() = Wsl2State::default();
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, Wsl2State> {
        // The state is plain data; a poisoned lock still holds a usable value.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn detect_wsl2(&self) -> bool {
        if self.distro_name().is_some() {
            return true;
        }
        self.fs
            .read_to_string(Path::new(PROC_VERSION))
            .map(|content| content.to_lowercase().contains("microsoft"))
            .unwrap_or(false)
    }

    fn profile_from_cmd(&self) -> Option<PathBuf> {
        let outcome = self
            .process
            .exec("cmd.exe", &["/c", "echo %USERPROFILE%"], self.timeout);
        let raw = outcome.success_stdout()?.trim();
        if raw.is_empty() || raw.contains('%') {
            return None;
        }
        Some(PathBuf::from(translate_windows_path(raw)))
    }

    fn profile_from_users_dir(&self) -> Option<PathBuf> {
        let entries = self.fs.read_dir(Path::new(WINDOWS_USERS_DIR)).ok()?;
        let candidates: Vec<_> = entries
            .into_iter()
            .filter(|entry| entry.is_dir && !SYSTEM_ACCOUNTS.contains(&entry.name.as_str()))
            .collect();

        candidates
            .iter()
            .find(|entry| self.fs.exists(&entry.path.join("Desktop")))
            .or_else(|| candidates.first())
            .map(|entry| entry.path.clone())
    }
}

/// Translate `X:\path\to` into `/mnt/x/path/to`.
///
/// The drive letter is matched case-insensitively; anything that is not a
/// drive-rooted Windows path is returned unchanged.
pub fn translate_windows_path(path: &str) -> String {
    let mut chars = path.chars();
    match (chars.next(), chars.next(), chars.next()) {
        (Some(drive), Some(':'), Some('\\' | '/')) if drive.is_ascii_alphabetic() => {
            let rest = &path[3..];
            format!(
                "/mnt/{}/{}",
                drive.to_ascii_lowercase(),
                rest.replace('\\', "/")
            )
        }
        _ => path.to_string(),
    }
}

/// Inverse of [`translate_windows_path`] for `/mnt/<drive>/...` paths.
pub fn to_windows_path(path: &Path) -> Option<String> {
    let text = path.to_str()?;
    let rest = text.strip_prefix("/mnt/")?;
    let mut chars = rest.chars();
    let drive = chars.next().filter(char::is_ascii_alphabetic)?;
    let tail = chars.as_str();
    if !(tail.is_empty() || tail.starts_with('/')) {
        return None;
    }
    let tail = tail.trim_start_matches('/').replace('/', "\\");
    Some(format!("{}:\\{}", drive.to_ascii_uppercase(), tail))
}

/// Windows-side install locations for a client, relative to the user profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowsInstallPaths {
    pub binaries: Vec<PathBuf>,
    pub app_bundles: Vec<PathBuf>,
}

pub fn windows_install_paths(kind: ClientKind, profile: &Path) -> WindowsInstallPaths {
    let (binaries, app_bundles): (&[&str], &[&str]) = match kind {
        ClientKind::ClaudeCode => (
            &[".local/bin/claude.exe", "AppData/Roaming/npm/claude.cmd"],
            &[],
        ),
        ClientKind::ClaudeDesktop => (&[], &["AppData/Local/AnthropicClaude"]),
        ClientKind::Vscode => (
            &["AppData/Local/Programs/Microsoft VS Code/bin/code.cmd"],
            &["AppData/Local/Programs/Microsoft VS Code"],
        ),
        ClientKind::Cursor => (
            &["AppData/Local/Programs/cursor/resources/app/bin/cursor.cmd"],
            &["AppData/Local/Programs/cursor"],
        ),
        ClientKind::Windsurf => (
            &["AppData/Local/Programs/Windsurf/bin/windsurf.cmd"],
            &["AppData/Local/Programs/Windsurf"],
        ),
        ClientKind::CopilotCli => (&["AppData/Roaming/npm/copilot.cmd"], &[]),
        ClientKind::GeminiCli => (&["AppData/Roaming/npm/gemini.cmd"], &[]),
        ClientKind::OpenCode => (
            &["AppData/Roaming/npm/opencode.cmd", ".opencode/bin/opencode.exe"],
            &[],
        ),
    };

    WindowsInstallPaths {
        binaries: binaries.iter().map(|p| profile.join(p)).collect(),
        app_bundles: app_bundles.iter().map(|p| profile.join(p)).collect(),
    }
}

/// The client's user config file on the Windows side.
pub fn windows_config_path(kind: ClientKind, profile: &Path) -> PathBuf {
    let ctx = ClientContext::new(profile.to_path_buf(), None);
    adapter_for(kind).config_paths(&ctx, Platform::Win32).user
}
