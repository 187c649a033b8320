//! Config path resolution helpers.

use std::path::{Path, PathBuf};

/// User-level overture config: `~/.config/overture.yml`.
pub fn user_config_path(home_dir: &Path) -> PathBuf {
    home_dir.join(".config").join("overture.yml")
}

/// Project-level overture config: `<project>/.overture/config.yaml`.
pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root.join(".overture").join("config.yaml")
}

/// Default location for client config snapshots.
pub fn default_backup_dir(home_dir: &Path) -> PathBuf {
    home_dir.join(".config").join("overture").join("backups")
}
