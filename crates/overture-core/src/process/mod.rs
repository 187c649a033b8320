//! Process and environment access with deadline-bounded execution.
//!
//! Every external command runs under an explicit deadline. When the deadline
//! passes the child is killed and the call resolves to [`ExecOutcome::TimedOut`]
//! instead of failing, so discovery can never hang on a slow binary.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use anyhow::Context;

use crate::types::Platform;

/// Default deadline for probes against client binaries.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_millis(5000);

/// Result of running an external command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecOutcome {
    Completed {
        success: bool,
        stdout: String,
        stderr: String,
    },
    /// The deadline passed and the child was killed.
    TimedOut,
    /// The command could not be spawned.
    Failed(String),
}

impl ExecOutcome {
    /// Stdout of a command that exited successfully.
    pub fn success_stdout(&self) -> Option<&str> {
        match self {
            ExecOutcome::Completed {
                success: true,
                stdout,
                ..
            } => Some(stdout.as_str()),
            _ => None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.success_stdout().is_some()
    }
}

/// Port onto the host process environment.
pub trait ProcessPort: Send + Sync + std::fmt::Debug {
    /// Run `program` with `args`, killing it once `timeout` elapses.
    fn exec(&self, program: &str, args: &[&str], timeout: Duration) -> ExecOutcome;

    /// Whether `program` resolves to an executable. A timeout counts as absent.
    fn command_exists(&self, program: &str, timeout: Duration) -> bool;

    fn platform(&self) -> Platform;

    fn home_dir(&self) -> Option<PathBuf>;

    fn env_var(&self, key: &str) -> Option<String>;

    /// Snapshot of the whole environment, used for `${VAR}` expansion.
    fn env_vars(&self) -> HashMap<String, String>;
}

/// Command used to turn a bare binary name into an absolute path.
pub fn path_lookup_command(platform: Platform) -> &'static str {
    match platform {
        Platform::Win32 => "where",
        Platform::Linux | Platform::Darwin => "which",
    }
}

/// [`ProcessPort`] backed by the real OS.
///
/// Owns a single-threaded tokio runtime so each command can be raced against
/// its deadline while callers stay synchronous.
#[derive(Debug)]
pub struct SystemProcess {
    runtime: tokio::runtime::Runtime,
}

impl SystemProcess {
    pub fn new() -> anyhow::Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .context("Failed to create tokio runtime")?;
        Ok(Self { runtime })
    }
}

impl ProcessPort for SystemProcess {
    fn exec(&self, program: &str, args: &[&str], timeout: Duration) -> ExecOutcome {
        self.runtime.block_on(async {
            let child = tokio::process::Command::new(program)
                .args(args)
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .kill_on_drop(true)
                .spawn();

            let child = match child {
                Ok(child) => child,
                Err(err) => return ExecOutcome::Failed(err.to_string()),
            };

            // Dropping the wait future on timeout drops the child, which kills it.
            match tokio::time::timeout(timeout, child.wait_with_output()).await {
                Ok(Ok(output)) => ExecOutcome::Completed {
                    success: output.status.success(),
                    stdout: String::from_utf8_lossy(&output.stdout).to_string(),
                    stderr: String::from_utf8_lossy(&output.stderr).to_string(),
                },
                Ok(Err(err)) => ExecOutcome::Failed(err.to_string()),
                Err(_) => {
                    tracing::debug!(program, ?timeout, "Command timed out");
                    ExecOutcome::TimedOut
                }
            }
        })
    }

    fn command_exists(&self, program: &str, timeout: Duration) -> bool {
        if program.contains('/') || program.contains('\\') {
            return Path::new(program).exists();
        }
        let lookup = path_lookup_command(self.platform());
        self.exec(lookup, &[program], timeout).is_success()
    }

    fn platform(&self) -> Platform {
        Platform::current()
    }

    fn home_dir(&self) -> Option<PathBuf> {
        dirs::home_dir()
    }

    fn env_var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }

    fn env_vars(&self) -> HashMap<String, String> {
        std::env::vars().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn nonexistent_command_is_absent() {
        let process = SystemProcess::new().expect("runtime");
        let started = Instant::now();

        let exists = process.command_exists(
            "overture-definitely-not-a-real-binary",
            Duration::from_secs(2),
        );

        assert!(!exists);
        assert!(started.elapsed() < Duration::from_secs(3));
    }

    #[test]
    fn spawn_failure_is_reported_not_panicked() {
        let process = SystemProcess::new().expect("runtime");
        let outcome = process.exec(
            "overture-definitely-not-a-real-binary",
            &["--version"],
            Duration::from_secs(1),
        );
        assert!(matches!(outcome, ExecOutcome::Failed(_)));
    }

    #[cfg(unix)]
    #[test]
    fn slow_command_times_out_within_deadline() {
        let process = SystemProcess::new().expect("runtime");
        let started = Instant::now();

        let outcome = process.exec("sleep", &["5"], Duration::from_millis(100));

        assert_eq!(outcome, ExecOutcome::TimedOut);
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[cfg(unix)]
    #[test]
    fn successful_command_captures_stdout() {
        let process = SystemProcess::new().expect("runtime");
        let outcome = process.exec("echo", &["1.2.3"], Duration::from_secs(2));
        assert_eq!(outcome.success_stdout().map(str::trim), Some("1.2.3"));
    }
}
