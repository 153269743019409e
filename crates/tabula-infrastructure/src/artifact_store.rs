//! Shared artifact storage for charts and modified-table downloads.
//!
//! Artifacts are project-agnostic and referenced by generated ids: chart PNGs
//! under `plots/`, modified tables awaiting download under `temp_tables/`.
//! The sandbox hands artifact bytes back in-memory; only this store writes
//! them to a permanent location, and only after a turn succeeded.

use crate::paths::DataPaths;
use crate::storage;
use std::path::PathBuf;
use tabula_core::{DataFrame, Result};
use uuid::Uuid;

#[derive(Clone)]
pub struct ArtifactStore {
    paths: DataPaths,
}

impl ArtifactStore {
    pub fn new(paths: DataPaths) -> Self {
        Self { paths }
    }

    /// Persists chart bytes under a fresh id and returns the artifact path.
    pub fn save_chart(&self, png: &[u8]) -> Result<PathBuf> {
        std::fs::create_dir_all(self.paths.plots_dir())?;
        let path = self.paths.plot_path(&Uuid::new_v4().to_string());
        std::fs::write(&path, png)?;
        tracing::debug!(path = %path.display(), bytes = png.len(), "saved chart artifact");
        Ok(path)
    }

    /// Persists a modified table as a download artifact tagged with the
    /// producing chat.
    pub fn save_modified_table(&self, chat_id: &str, table: &DataFrame) -> Result<PathBuf> {
        let short_id = Uuid::new_v4().simple().to_string();
        let filename = format!("{}_{}.csv", chat_id, &short_id[..8]);
        let path = self.paths.temp_table_path(&filename);
        storage::write_table(&path, table)?;
        Ok(path)
    }
}
