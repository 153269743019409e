//! Unified path management for the on-disk data layout.
//!
//! Every implementation must reproduce this layout exactly:
//!
//! ```text
//! {base}/
//! ├── config.toml                      # Application configuration
//! ├── projects/
//! │   └── {project_id}/
//! │       ├── metadata.json            # Project record
//! │       ├── current.csv              # "Current" snapshot pointer target
//! │       ├── chats/
//! │       │   └── {chat_id}.json       # Chat record: metadata + messages + oracle context
//! │       └── versions/
//! │           ├── version_log.json     # Append-only version log
//! │           └── v{N}_{timestamp}.csv # Immutable snapshots
//! ├── plots/                           # Shared chart artifacts ({id}.png)
//! └── temp_tables/                     # Shared modified-table download artifacts
//! ```

use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tabula_core::Result;

/// Resolves every path in the data directory from one base.
#[derive(Debug, Clone)]
pub struct DataPaths {
    base: PathBuf,
}

impl DataPaths {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base
    }

    pub fn config_path(&self) -> PathBuf {
        self.base.join("config.toml")
    }

    pub fn projects_dir(&self) -> PathBuf {
        self.base.join("projects")
    }

    pub fn project_dir(&self, project_id: &str) -> PathBuf {
        self.projects_dir().join(project_id)
    }

    pub fn metadata_path(&self, project_id: &str) -> PathBuf {
        self.project_dir(project_id).join("metadata.json")
    }

    pub fn current_table_path(&self, project_id: &str) -> PathBuf {
        self.project_dir(project_id).join("current.csv")
    }

    pub fn chats_dir(&self, project_id: &str) -> PathBuf {
        self.project_dir(project_id).join("chats")
    }

    pub fn chat_path(&self, project_id: &str, chat_id: &str) -> PathBuf {
        self.chats_dir(project_id).join(format!("{}.json", chat_id))
    }

    pub fn versions_dir(&self, project_id: &str) -> PathBuf {
        self.project_dir(project_id).join("versions")
    }

    pub fn version_log_path(&self, project_id: &str) -> PathBuf {
        self.versions_dir(project_id).join("version_log.json")
    }

    pub fn version_snapshot_path(&self, project_id: &str, filename: &str) -> PathBuf {
        self.versions_dir(project_id).join(filename)
    }

    pub fn plots_dir(&self) -> PathBuf {
        self.base.join("plots")
    }

    pub fn plot_path(&self, plot_id: &str) -> PathBuf {
        self.plots_dir().join(format!("{}.png", plot_id))
    }

    pub fn temp_tables_dir(&self) -> PathBuf {
        self.base.join("temp_tables")
    }

    pub fn temp_table_path(&self, filename: &str) -> PathBuf {
        self.temp_tables_dir().join(filename)
    }

    /// Creates the shared directory skeleton (base, projects, artifacts).
    pub fn ensure_layout(&self) -> Result<()> {
        std::fs::create_dir_all(self.projects_dir())?;
        std::fs::create_dir_all(self.plots_dir())?;
        std::fs::create_dir_all(self.temp_tables_dir())?;
        Ok(())
    }

    /// Creates one project's directory skeleton.
    pub fn ensure_project_layout(&self, project_id: &str) -> Result<()> {
        std::fs::create_dir_all(self.chats_dir(project_id))?;
        std::fs::create_dir_all(self.versions_dir(project_id))?;
        Ok(())
    }

    /// Removes a project directory and everything it owns. Missing
    /// directories are a no-op.
    pub fn delete_project_dir(&self, project_id: &str) -> Result<()> {
        let dir = self.project_dir(project_id);
        if dir.exists() {
            std::fs::remove_dir_all(&dir)?;
        }
        Ok(())
    }
}

/// Snapshot filename for a version: `v{N}_{YYYYMMDD_HHMMSS}.csv`.
pub fn version_filename(version_number: u32, timestamp: DateTime<Utc>) -> String {
    format!(
        "v{}_{}.csv",
        version_number,
        timestamp.format("%Y%m%d_%H%M%S")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn layout_is_reproducible() {
        let paths = DataPaths::new("/data");
        assert_eq!(
            paths.metadata_path("p1"),
            PathBuf::from("/data/projects/p1/metadata.json")
        );
        assert_eq!(
            paths.chat_path("p1", "c1"),
            PathBuf::from("/data/projects/p1/chats/c1.json")
        );
        assert_eq!(
            paths.version_log_path("p1"),
            PathBuf::from("/data/projects/p1/versions/version_log.json")
        );
        assert_eq!(paths.plot_path("abc"), PathBuf::from("/data/plots/abc.png"));
    }

    #[test]
    fn ensure_creates_directories() {
        let tmp = TempDir::new().unwrap();
        let paths = DataPaths::new(tmp.path());
        paths.ensure_layout().unwrap();
        paths.ensure_project_layout("p1").unwrap();

        assert!(paths.plots_dir().is_dir());
        assert!(paths.chats_dir("p1").is_dir());
        assert!(paths.versions_dir("p1").is_dir());

        paths.delete_project_dir("p1").unwrap();
        assert!(!paths.project_dir("p1").exists());
        // Deleting again is a no-op
        paths.delete_project_dir("p1").unwrap();
    }

    #[test]
    fn version_filenames_embed_number_and_timestamp() {
        let ts = DateTime::parse_from_rfc3339("2026-01-06T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(version_filename(3, ts), "v3_20260106_120000.csv");
    }
}
