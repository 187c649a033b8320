//! Application context for unified dependency injection.

use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::client::ClientContext;
use crate::config::paths::{default_backup_dir, project_config_path, user_config_path};
use crate::config::{ConfigStore, OvertureConfig};

/// Paths shared by every command.
///
/// The CLI creates this once and passes it to commands.
#[derive(Debug, Clone)]
pub struct AppContext {
    home_dir: PathBuf,
    project_root: PathBuf,
    user_config: PathBuf,
}

impl AppContext {
    /// Create a new context with explicit paths.
    pub fn new(home_dir: PathBuf, project_root: PathBuf) -> Self {
        let user_config = user_config_path(&home_dir);
        Self {
            home_dir,
            project_root,
            user_config,
        }
    }

    /// Create a context for the current user and working directory.
    pub fn from_env() -> anyhow::Result<Self> {
        let home_dir =
            dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Could not determine home directory"))?;
        let project_root =
            std::env::current_dir().context("Failed to determine current directory")?;
        Ok(Self::new(home_dir, project_root))
    }

    /// Use a different user config file (for `--config`).
    pub fn with_user_config(mut self, path: PathBuf) -> Self {
        self.user_config = path;
        self
    }

    pub fn home_dir(&self) -> &Path {
        &self.home_dir
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Get a ClientContext for adapter calls.
    pub fn client_context(&self) -> ClientContext {
        ClientContext::new(self.home_dir.clone(), Some(self.project_root.clone()))
    }

    pub fn config_store(&self) -> ConfigStore {
        ConfigStore::new(
            self.user_config.clone(),
            Some(project_config_path(&self.project_root)),
        )
    }

    /// Load and merge the user and project configs.
    pub fn load_config(&self) -> anyhow::Result<OvertureConfig> {
        self.config_store().load()
    }

    /// Backup directory from config, or the default under the home directory.
    pub fn backup_dir(&self, config: &OvertureConfig) -> PathBuf {
        config
            .sync
            .backup_dir
            .clone()
            .unwrap_or_else(|| default_backup_dir(&self.home_dir))
    }
}
