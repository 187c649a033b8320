//! Config store for loading the user and project layers.

use std::path::{Path, PathBuf};

use anyhow::Context;

use super::{OvertureConfig, merge_configs, parser};

#[derive(Debug, Clone)]
pub struct ConfigStore {
    user_path: PathBuf,
    project_path: Option<PathBuf>,
}

impl ConfigStore {
    pub fn new(user_path: PathBuf, project_path: Option<PathBuf>) -> Self {
        Self {
            user_path,
            project_path,
        }
    }

    pub fn user_path(&self) -> &Path {
        &self.user_path
    }

    pub fn project_path(&self) -> Option<&Path> {
        self.project_path.as_deref()
    }

    /// Load the user layer; a missing file is an empty config.
    pub fn load_user(&self) -> anyhow::Result<OvertureConfig> {
        load_optional(&self.user_path).map(Option::unwrap_or_default)
    }

    /// Load both layers and merge them project-over-user.
    pub fn load(&self) -> anyhow::Result<OvertureConfig> {
        let user = load_optional(&self.user_path)?;
        let project = match &self.project_path {
            Some(path) => load_optional(path)?,
            None => None,
        };
        Ok(merge_configs(user, project))
    }

    pub fn save_user(&self, config: &OvertureConfig) -> anyhow::Result<()> {
        let content = parser::to_yaml(config)?;
        if let Some(parent) = self.user_path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }
        std::fs::write(&self.user_path, content).with_context(|| {
            format!("Failed to write config file: {}", self.user_path.display())
        })?;
        Ok(())
    }
}

fn load_optional(path: &Path) -> anyhow::Result<Option<OvertureConfig>> {
    if !path.exists() {
        return Ok(None);
    }
    parser::parse_config(path).map(Some)
}
