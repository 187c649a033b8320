//! Snapshots of client configs taken before they are overwritten.
//!
//! Backups are named `<client>-<timestamp>.json`, where the timestamp is
//! ISO-8601 UTC with `:` and `.` replaced by `-` so it is safe in a file name
//! and still sorts chronologically.

use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};

use chrono::{DateTime, SecondsFormat, Utc};
use regex::Regex;
use serde::Serialize;

use crate::error::SyncError;
use crate::fs::FileSystem;

static BACKUP_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<client>.+)-(?P<date>\d{4}-\d{2}-\d{2})T(?P<h>\d{2})-(?P<m>\d{2})-(?P<s>\d{2})-(?P<ms>\d{3})Z\.json$",
    )
    .expect("backup name pattern is valid")
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackupRecord {
    pub client: String,
    /// ISO-8601 UTC, e.g. `2025-01-15T10:30:00.123Z`
    pub timestamp: String,
    pub path: PathBuf,
    pub size: u64,
}

#[derive(Debug, Clone)]
pub struct BackupService {
    fs: Arc<dyn FileSystem>,
    backup_dir: PathBuf,
}

impl BackupService {
    pub fn new(fs: Arc<dyn FileSystem>, backup_dir: PathBuf) -> Self {
        Self { fs, backup_dir }
    }

    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    /// Copy `source` into the backup directory.
    pub fn backup_config(&self, client: &str, source: &Path) -> Result<BackupRecord, SyncError> {
        self.backup_config_at(client, source, Utc::now())
    }

    pub fn backup_config_at(
        &self,
        client: &str,
        source: &Path,
        now: DateTime<Utc>,
    ) -> Result<BackupRecord, SyncError> {
        let content = self
            .fs
            .read_to_string(source)
            .map_err(|err| SyncError::backup(client, source, err))?;
        self.fs
            .create_dir_all(&self.backup_dir)
            .map_err(|err| SyncError::backup(client, &self.backup_dir, err))?;

        let timestamp = now.to_rfc3339_opts(SecondsFormat::Millis, true);
        let path = self
            .backup_dir
            .join(format!("{}-{}.json", client, file_stamp(&timestamp)));
        self.fs
            .write(&path, &content)
            .map_err(|err| SyncError::backup(client, &path, err))?;

        let size = self
            .fs
            .file_size(&path)
            .unwrap_or(content.len() as u64);
        tracing::info!(client, path = %path.display(), "Backed up client config");

        Ok(BackupRecord {
            client: client.to_string(),
            timestamp,
            path,
            size,
        })
    }

    /// Backups in the directory, newest first, optionally for one client.
    pub fn list_backups(&self, client: Option<&str>) -> Vec<BackupRecord> {
        let entries = match self.fs.read_dir(&self.backup_dir) {
            Ok(entries) => entries,
            Err(_) => return Vec::new(),
        };

        let mut records: Vec<_> = entries
            .into_iter()
            .filter(|entry| !entry.is_dir)
            .filter_map(|entry| {
                let caps = BACKUP_NAME_RE.captures(&entry.name)?;
                let record_client = &caps["client"];
                if client.is_some_and(|c| c != record_client) {
                    return None;
                }
                let timestamp = format!(
                    "{}T{}:{}:{}.{}Z",
                    &caps["date"], &caps["h"], &caps["m"], &caps["s"], &caps["ms"]
                );
                let size = self.fs.file_size(&entry.path).unwrap_or(0);
                Some(BackupRecord {
                    client: record_client.to_string(),
                    timestamp,
                    path: entry.path.clone(),
                    size,
                })
            })
            .collect();

        records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        records
    }

    pub fn latest_backup(&self, client: &str) -> Option<BackupRecord> {
        self.list_backups(Some(client)).into_iter().next()
    }

    /// Delete all but the `keep` most recent backups of `client`.
    ///
    /// Returns how many were removed.
    pub fn cleanup_old_backups(&self, client: &str, keep: usize) -> usize {
        let mut removed = 0;
        for record in self.list_backups(Some(client)).into_iter().skip(keep) {
            match self.fs.remove_file(&record.path) {
                Ok(()) => removed += 1,
                Err(err) => tracing::warn!(
                    client,
                    path = %record.path.display(),
                    error = %err,
                    "Failed to remove old backup"
                ),
            }
        }
        if removed > 0 {
            tracing::debug!(client, removed, keep, "Pruned old backups");
        }
        removed
    }

    /// Write a backup of `client` back to `target`.
    ///
    /// `timestamp` selects a specific backup in either ISO or file-name form;
    /// `None` restores the newest one. An existing `target` is backed up
    /// before it is overwritten.
    pub fn restore_backup(
        &self,
        client: &str,
        timestamp: Option<&str>,
        target: &Path,
    ) -> Result<BackupRecord, SyncError> {
        let backups = self.list_backups(Some(client));
        let record = match timestamp {
            Some(wanted) => backups
                .into_iter()
                .find(|r| r.timestamp == wanted || file_stamp(&r.timestamp) == wanted),
            None => backups.into_iter().next(),
        };
        let record = record.ok_or_else(|| {
            SyncError::backup(
                client,
                &self.backup_dir,
                match timestamp {
                    Some(wanted) => format!("No backup found at {}", wanted),
                    None => "No backups found".to_string(),
                },
            )
        })?;

        let content = self
            .fs
            .read_to_string(&record.path)
            .map_err(|err| SyncError::backup(client, &record.path, err))?;

        // The file being replaced is itself snapshotted first.
        if self.fs.exists(target) {
            let previous = self.backup_config(client, target)?;
            tracing::debug!(client, path = %previous.path.display(), "Backed up config before restore");
        }
        if let Some(parent) = target.parent() {
            self.fs
                .create_dir_all(parent)
                .map_err(|err| SyncError::config_write(client, parent, err))?;
        }
        self.fs
            .write(target, &content)
            .map_err(|err| SyncError::config_write(client, target, err))?;

        tracing::info!(client, timestamp = %record.timestamp, target = %target.display(), "Restored backup");
        Ok(record)
    }
}

fn file_stamp(timestamp: &str) -> String {
    timestamp.replace([':', '.'], "-")
}
