//! JSON-file-backed VersionStore implementation.
//!
//! Per project: immutable CSV snapshots under `versions/`, an append-only
//! `version_log.json`, and the `current.csv` pointer target. The log append
//! and the current repoint both go through write-temp-then-rename, so a crash
//! mid-write can never corrupt previously committed entries.

use crate::paths::{version_filename, DataPaths};
use crate::storage::{self, AtomicJsonFile};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tabula_core::{DataFrame, Result, TabulaError, Version, VersionStore};
use tokio::task;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct VersionLog {
    project_id: String,
    #[serde(default)]
    versions: Vec<Version>,
}

impl VersionLog {
    fn empty(project_id: &str) -> Self {
        Self {
            project_id: project_id.to_string(),
            versions: Vec::new(),
        }
    }
}

pub struct JsonVersionStore {
    paths: DataPaths,
}

impl JsonVersionStore {
    pub fn new(paths: DataPaths) -> Self {
        Self { paths }
    }

    fn log_file(paths: &DataPaths, project_id: &str) -> AtomicJsonFile<VersionLog> {
        AtomicJsonFile::new(paths.version_log_path(project_id))
    }

    fn list_sync(paths: &DataPaths, project_id: &str) -> Vec<Version> {
        let mut versions = Self::log_file(paths, project_id)
            .load_or(VersionLog::empty(project_id))
            .versions;
        versions.sort_by_key(|v| v.version_number);
        versions
    }

    fn find_sync(paths: &DataPaths, project_id: &str, version_number: u32) -> Result<Version> {
        Self::list_sync(paths, project_id)
            .into_iter()
            .find(|v| v.version_number == version_number)
            .ok_or_else(|| TabulaError::version_not_found(project_id, version_number))
    }

    fn snapshot_path_sync(paths: &DataPaths, project_id: &str, version: &Version) -> PathBuf {
        // file_path is stored relative to the project dir, e.g. "versions/v1_....csv"
        let filename = version
            .file_path
            .rsplit('/')
            .next()
            .unwrap_or(&version.file_path);
        paths.version_snapshot_path(project_id, filename)
    }

    fn append_sync(paths: &DataPaths, mut version: Version, table: &DataFrame) -> Result<Version> {
        if !paths.project_dir(&version.project_id).exists() {
            return Err(TabulaError::project_not_found(&version.project_id));
        }
        std::fs::create_dir_all(paths.versions_dir(&version.project_id))?;

        let filename = version_filename(version.version_number, version.created_at);
        let snapshot_path = paths.version_snapshot_path(&version.project_id, &filename);
        let current_path = paths.current_table_path(&version.project_id);

        // The number check and the snapshot/current writes stay inside the
        // locked log update: a stale number is rejected before any file is
        // touched, so a lost race can never overwrite a committed snapshot
        // or duplicate a log entry.
        let log_file = Self::log_file(paths, &version.project_id);
        let empty = VersionLog::empty(&version.project_id);
        log_file.update(empty, |log| {
            let expected = log.versions.len() as u32 + 1;
            if version.version_number != expected {
                return Err(TabulaError::internal(format!(
                    "stale version number {} for project {}, expected {}",
                    version.version_number, version.project_id, expected
                )));
            }

            storage::write_table(&snapshot_path, table)?;
            storage::write_table(&current_path, table)?;

            version.file_path = format!("versions/{}", filename);
            version.file_size_bytes = storage::file_size(&snapshot_path);
            log.versions.push(version.clone());
            Ok(())
        })?;

        tracing::debug!(
            project_id = %version.project_id,
            version = version.version_number,
            bytes = version.file_size_bytes,
            "committed version snapshot"
        );
        Ok(version)
    }
}

#[async_trait]
impl VersionStore for JsonVersionStore {
    async fn append_version(&self, version: Version, table: &DataFrame) -> Result<Version> {
        let paths = self.paths.clone();
        let table = table.clone();
        task::spawn_blocking(move || Self::append_sync(&paths, version, &table))
            .await
            .map_err(|e| TabulaError::internal(format!("task join error: {}", e)))?
    }

    async fn list_versions(&self, project_id: &str) -> Result<Vec<Version>> {
        let paths = self.paths.clone();
        let project_id = project_id.to_string();
        task::spawn_blocking(move || Ok(Self::list_sync(&paths, &project_id)))
            .await
            .map_err(|e| TabulaError::internal(format!("task join error: {}", e)))?
    }

    async fn load_snapshot(&self, project_id: &str, version_number: u32) -> Result<DataFrame> {
        let paths = self.paths.clone();
        let project_id = project_id.to_string();
        task::spawn_blocking(move || {
            let version = Self::find_sync(&paths, &project_id, version_number)?;
            let path = Self::snapshot_path_sync(&paths, &project_id, &version);
            if !path.exists() {
                return Err(TabulaError::version_not_found(&project_id, version_number));
            }
            storage::read_table(&path)
        })
        .await
        .map_err(|e| TabulaError::internal(format!("task join error: {}", e)))?
    }

    async fn load_current(&self, project_id: &str) -> Result<DataFrame> {
        let paths = self.paths.clone();
        let project_id = project_id.to_string();
        task::spawn_blocking(move || {
            let path = paths.current_table_path(&project_id);
            if !path.exists() {
                return Err(TabulaError::project_not_found(&project_id));
            }
            storage::read_table(&path)
        })
        .await
        .map_err(|e| TabulaError::internal(format!("task join error: {}", e)))?
    }

    async fn snapshot_download_path(
        &self,
        project_id: &str,
        version_number: u32,
    ) -> Result<PathBuf> {
        let paths = self.paths.clone();
        let project_id = project_id.to_string();
        task::spawn_blocking(move || {
            let version = Self::find_sync(&paths, &project_id, version_number)?;
            let path = Self::snapshot_path_sync(&paths, &project_id, &version);
            if !path.exists() {
                return Err(TabulaError::version_not_found(&project_id, version_number));
            }
            Ok(path)
        })
        .await
        .map_err(|e| TabulaError::internal(format!("task join error: {}", e)))?
    }
}
