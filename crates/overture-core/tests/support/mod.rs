//! In-memory ports for driving the engine without touching the host.

#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use overture_core::fs::{DirEntry, FileSystem};
use overture_core::process::{ExecOutcome, ProcessPort};
use overture_core::types::Platform;

#[derive(Debug, Default)]
struct MemoryState {
    files: BTreeMap<PathBuf, String>,
    dirs: BTreeSet<PathBuf>,
    failing_writes: BTreeSet<PathBuf>,
    failing_reads: BTreeSet<PathBuf>,
}

/// A filesystem held in memory, with injectable failures.
///
/// A failure registered for a directory applies to everything below it.
#[derive(Debug, Default)]
pub struct MemoryFs {
    state: Mutex<MemoryState>,
}

impl MemoryFs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_file(&self, path: impl AsRef<Path>, contents: &str) {
        let mut state = self.state.lock().unwrap();
        let path = path.as_ref().to_path_buf();
        add_ancestors(&mut state.dirs, &path);
        state.files.insert(path, contents.to_string());
    }

    pub fn add_dir(&self, path: impl AsRef<Path>) {
        let mut state = self.state.lock().unwrap();
        let path = path.as_ref().to_path_buf();
        add_ancestors(&mut state.dirs, &path);
        state.dirs.insert(path);
    }

    pub fn file(&self, path: impl AsRef<Path>) -> Option<String> {
        self.state.lock().unwrap().files.get(path.as_ref()).cloned()
    }

    pub fn json(&self, path: impl AsRef<Path>) -> serde_json::Value {
        let content = self.file(path).expect("file exists");
        serde_json::from_str(&content).expect("valid json")
    }

    pub fn files_under(&self, dir: impl AsRef<Path>) -> Vec<PathBuf> {
        self.state
            .lock()
            .unwrap()
            .files
            .keys()
            .filter(|p| p.starts_with(dir.as_ref()))
            .cloned()
            .collect()
    }

    pub fn fail_writes_under(&self, path: impl AsRef<Path>) {
        let mut state = self.state.lock().unwrap();
        state.failing_writes.insert(path.as_ref().to_path_buf());
    }

    pub fn fail_reads_under(&self, path: impl AsRef<Path>) {
        let mut state = self.state.lock().unwrap();
        state.failing_reads.insert(path.as_ref().to_path_buf());
    }
}

fn add_ancestors(dirs: &mut BTreeSet<PathBuf>, path: &Path) {
    for ancestor in path.ancestors().skip(1) {
        if ancestor.as_os_str().is_empty() {
            break;
        }
        dirs.insert(ancestor.to_path_buf());
    }
}

fn injected(kind: &str, path: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::PermissionDenied,
        format!("injected {} failure: {}", kind, path.display()),
    )
}

impl FileSystem for MemoryFs {
    fn exists(&self, path: &Path) -> bool {
        let state = self.state.lock().unwrap();
        state.files.contains_key(path) || state.dirs.contains(path)
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        let state = self.state.lock().unwrap();
        if state.failing_reads.iter().any(|p| path.starts_with(p)) {
            return Err(injected("read", path));
        }
        state
            .files
            .get(path)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, path.display().to_string()))
    }

    fn write(&self, path: &Path, contents: &str) -> io::Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.failing_writes.iter().any(|p| path.starts_with(p)) {
            return Err(injected("write", path));
        }
        add_ancestors(&mut state.dirs, path);
        state.files.insert(path.to_path_buf(), contents.to_string());
        Ok(())
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.failing_writes.iter().any(|p| path.starts_with(p)) {
            return Err(injected("mkdir", path));
        }
        add_ancestors(&mut state.dirs, path);
        state.dirs.insert(path.to_path_buf());
        Ok(())
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>> {
        let state = self.state.lock().unwrap();
        if !state.dirs.contains(path) {
            return Err(io::Error::new(io::ErrorKind::NotFound, path.display().to_string()));
        }
        let mut entries: BTreeMap<String, DirEntry> = BTreeMap::new();
        let children = state
            .dirs
            .iter()
            .map(|p| (p, true))
            .chain(state.files.keys().map(|p| (p, false)));
        for (child, is_dir) in children {
            if child.parent() == Some(path)
                && let Some(name) = child.file_name()
            {
                let name = name.to_string_lossy().to_string();
                entries.insert(
                    name.clone(),
                    DirEntry {
                        name,
                        path: child.clone(),
                        is_dir,
                    },
                );
            }
        }
        Ok(entries.into_values().collect())
    }

    fn file_size(&self, path: &Path) -> io::Result<u64> {
        self.read_to_string(path).map(|c| c.len() as u64)
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        let mut state = self.state.lock().unwrap();
        state
            .files
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, path.display().to_string()))
    }
}

/// A process port answering from a script instead of the OS.
#[derive(Debug)]
pub struct FakeProcess {
    pub platform: Platform,
    pub home: PathBuf,
    pub env: HashMap<String, String>,
    /// Binary name to resolved absolute path
    pub binaries: HashMap<String, PathBuf>,
    /// `--version` output per resolved path
    pub versions: HashMap<PathBuf, String>,
    /// Programs that never finish before the deadline
    pub hanging: BTreeSet<String>,
    /// Stdout of `cmd.exe /c echo %USERPROFILE%`
    pub windows_profile: Option<String>,
    pub calls: Mutex<Vec<String>>,
}

impl FakeProcess {
    pub fn new(platform: Platform, home: impl Into<PathBuf>) -> Self {
        Self {
            platform,
            home: home.into(),
            env: HashMap::new(),
            binaries: HashMap::new(),
            versions: HashMap::new(),
            hanging: BTreeSet::new(),
            windows_profile: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_binary(mut self, name: &str, path: &str, version_output: &str) -> Self {
        self.binaries.insert(name.to_string(), PathBuf::from(path));
        self.versions
            .insert(PathBuf::from(path), version_output.to_string());
        self
    }

    pub fn with_env(mut self, key: &str, value: &str) -> Self {
        self.env.insert(key.to_string(), value.to_string());
        self
    }

    pub fn hanging(mut self, program: &str) -> Self {
        self.hanging.insert(program.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl ProcessPort for FakeProcess {
    fn exec(&self, program: &str, args: &[&str], _timeout: Duration) -> ExecOutcome {
        self.calls
            .lock()
            .unwrap()
            .push(format!("{} {}", program, args.join(" ")).trim().to_string());

        if self.hanging.contains(program) {
            return ExecOutcome::TimedOut;
        }
        let completed = |stdout: String| ExecOutcome::Completed {
            success: true,
            stdout,
            stderr: String::new(),
        };
        match (program, args) {
            ("which" | "where", [name]) => match self.binaries.get(*name) {
                Some(path) => completed(format!("{}\n", path.display())),
                None => ExecOutcome::Completed {
                    success: false,
                    stdout: String::new(),
                    stderr: String::new(),
                },
            },
            ("cmd.exe", _) => match &self.windows_profile {
                Some(profile) => completed(format!("{}\r\n", profile)),
                None => ExecOutcome::Failed("cmd.exe not found".to_string()),
            },
            (_, ["--version"]) => match self.versions.get(Path::new(program)) {
                Some(output) => completed(output.clone()),
                None => ExecOutcome::Failed(format!("{} not found", program)),
            },
            _ => ExecOutcome::Failed(format!("unexpected command: {}", program)),
        }
    }

    fn command_exists(&self, program: &str, timeout: Duration) -> bool {
        if self.hanging.contains(program) {
            return false;
        }
        self.exec("which", &[program], timeout).is_success()
    }

    fn platform(&self) -> Platform {
        self.platform
    }

    fn home_dir(&self) -> Option<PathBuf> {
        Some(self.home.clone())
    }

    fn env_var(&self, key: &str) -> Option<String> {
        self.env.get(key).cloned()
    }

    fn env_vars(&self) -> HashMap<String, String> {
        self.env.clone()
    }
}
