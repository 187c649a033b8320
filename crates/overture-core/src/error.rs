//! Typed errors for per-client sync failures.

use std::path::PathBuf;

use thiserror::Error;

/// A failure that aborts synchronization of a single client.
///
/// Callers iterate clients independently, so one `SyncError` never stops the
/// remaining clients from being processed.
#[derive(Debug, Error)]
pub enum SyncError {
    /// An existing client config could not be read or parsed.
    #[error("Failed to read {client} config at {}: {message}", path.display())]
    ConfigRead {
        client: String,
        path: PathBuf,
        message: String,
    },

    /// Creating the config directory or writing the file failed.
    #[error("Failed to write {client} config at {}: {message}", path.display())]
    ConfigWrite {
        client: String,
        path: PathBuf,
        message: String,
    },

    /// The pre-write snapshot failed; the client config was left untouched.
    #[error("Failed to back up {client} config at {}: {message}", path.display())]
    Backup {
        client: String,
        path: PathBuf,
        message: String,
    },
}

impl SyncError {
    pub fn config_read(client: &str, path: impl Into<PathBuf>, message: impl ToString) -> Self {
        SyncError::ConfigRead {
            client: client.to_string(),
            path: path.into(),
            message: message.to_string(),
        }
    }

    pub fn config_write(client: &str, path: impl Into<PathBuf>, message: impl ToString) -> Self {
        SyncError::ConfigWrite {
            client: client.to_string(),
            path: path.into(),
            message: message.to_string(),
        }
    }

    pub fn backup(client: &str, path: impl Into<PathBuf>, message: impl ToString) -> Self {
        SyncError::Backup {
            client: client.to_string(),
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Name of the client this error belongs to.
    pub fn client(&self) -> &str {
        match self {
            SyncError::ConfigRead { client, .. }
            | SyncError::ConfigWrite { client, .. }
            | SyncError::Backup { client, .. } => client,
        }
    }
}
