//! Append-only version history on top of the version store.
//!
//! All version numbers are assigned here, never by callers. A project's
//! history is a contiguous run `1..=N`; the only way to grow it is
//! [`VersionEngine::commit_initial`] (exactly once, at upload) or
//! [`VersionEngine::commit_new`]. Reverting replays an old snapshot as a
//! brand new version, so history is never rewritten.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::Mutex;

use tabula_core::{
    dataframes_equal, describe_changes, DataFrame, Project, ProjectRepository, Result,
    TabulaError, Version, VersionProvenance, VersionStats, VersionStore,
};

pub struct VersionEngine {
    store: Arc<dyn VersionStore>,
    projects: Arc<dyn ProjectRepository>,
    /// Serializes read-allocate-append per project. Turns on different chats
    /// of one project run concurrently, so number allocation cannot rely on
    /// the per-chat turn lock.
    commit_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl VersionEngine {
    pub fn new(store: Arc<dyn VersionStore>, projects: Arc<dyn ProjectRepository>) -> Self {
        Self {
            store,
            projects,
            commit_locks: Mutex::new(HashMap::new()),
        }
    }

    async fn commit_lock(&self, project_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.commit_locks.lock().await;
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        locks
            .entry(project_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Commits version 1 of a freshly created project.
    ///
    /// Rejects projects that already have history; the initial upload is
    /// the only writer of version 1.
    pub async fn commit_initial(&self, project_id: &str, table: &DataFrame) -> Result<Version> {
        let lock = self.commit_lock(project_id).await;
        let _commit = lock.lock().await;

        let existing = self.store.list_versions(project_id).await?;
        if !existing.is_empty() {
            return Err(TabulaError::internal(format!(
                "project {} already has {} version(s)",
                project_id,
                existing.len()
            )));
        }

        let version = Version::new(1, project_id, "Initial upload", table, None);
        let saved = self.store.append_version(version, table).await?;
        self.record_on_project(project_id, &saved).await?;

        tracing::info!(project_id, "committed initial version");
        Ok(saved)
    }

    /// Commits the next version of a project.
    ///
    /// When `description` is `None` a summary is derived by diffing the
    /// new table against the current one.
    pub async fn commit_new(
        &self,
        project_id: &str,
        table: &DataFrame,
        description: Option<String>,
        provenance: Option<VersionProvenance>,
    ) -> Result<Version> {
        let lock = self.commit_lock(project_id).await;
        let _commit = lock.lock().await;

        let history = self.store.list_versions(project_id).await?;
        if history.is_empty() {
            return Err(TabulaError::internal(format!(
                "project {} has no initial version",
                project_id
            )));
        }
        let next_number = history.len() as u32 + 1;

        let description = match description {
            Some(d) => d,
            None => {
                let current = self.store.load_current(project_id).await?;
                describe_changes(&current, table)
                    .unwrap_or_else(|| "Modified data values".to_string())
            }
        };

        let version = Version::new(next_number, project_id, description, table, provenance);
        let saved = self.store.append_version(version, table).await?;
        self.record_on_project(project_id, &saved).await?;

        tracing::info!(
            project_id,
            version = saved.version_number,
            description = %saved.change_description,
            "committed new version"
        );
        Ok(saved)
    }

    /// Replays the snapshot of version `target` as a new version.
    pub async fn revert(
        &self,
        project_id: &str,
        target: u32,
        provenance: Option<VersionProvenance>,
    ) -> Result<Version> {
        let snapshot = self.store.load_snapshot(project_id, target).await?;
        self.commit_new(
            project_id,
            &snapshot,
            Some(format!("Reverted to v{}", target)),
            provenance,
        )
        .await
    }

    pub async fn list_versions(&self, project_id: &str) -> Result<Vec<Version>> {
        self.require_project(project_id).await?;
        self.store.list_versions(project_id).await
    }

    pub async fn load_version(&self, project_id: &str, number: u32) -> Result<DataFrame> {
        self.store.load_snapshot(project_id, number).await
    }

    /// The table every read and execution operates on.
    pub async fn current(&self, project_id: &str) -> Result<DataFrame> {
        self.store.load_current(project_id).await
    }

    /// True when `table` differs from the current version in any cell,
    /// column name, or shape.
    pub async fn has_changed(&self, project_id: &str, table: &DataFrame) -> Result<bool> {
        let current = self.store.load_current(project_id).await?;
        Ok(!dataframes_equal(&current, table))
    }

    pub async fn version_stats(&self, project_id: &str) -> Result<VersionStats> {
        self.require_project(project_id).await?;
        let versions = self.store.list_versions(project_id).await?;
        Ok(VersionStats::from_versions(&versions))
    }

    /// Path to the immutable snapshot file of one version, for downloads.
    pub async fn download_path(&self, project_id: &str, number: u32) -> Result<PathBuf> {
        self.store.snapshot_download_path(project_id, number).await
    }

    async fn require_project(&self, project_id: &str) -> Result<Project> {
        self.projects
            .find_by_id(project_id)
            .await?
            .ok_or_else(|| TabulaError::project_not_found(project_id))
    }

    async fn record_on_project(&self, project_id: &str, version: &Version) -> Result<()> {
        let mut project = self.require_project(project_id).await?;
        project.record_version(
            version.version_number,
            version.row_count,
            version.column_count,
            version.file_size_bytes,
        );
        self.projects.save(&project).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabula_infrastructure::{DataPaths, JsonProjectRepository, JsonVersionStore};
    use tempfile::TempDir;

    fn df(columns: &[&str], rows: &[&[&str]]) -> DataFrame {
        DataFrame::new(
            columns.iter().map(|c| c.to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        )
        .unwrap()
    }

    async fn engine_with_project(tmp: &TempDir) -> (VersionEngine, String) {
        let paths = DataPaths::new(tmp.path());
        paths.ensure_layout().unwrap();
        let projects = Arc::new(JsonProjectRepository::new(paths.clone()));
        let store = Arc::new(JsonVersionStore::new(paths));

        let project = Project::create_new("t", "t.csv", 3, 1);
        projects.save(&project).await.unwrap();

        (VersionEngine::new(store, projects), project.id)
    }

    #[tokio::test]
    async fn versions_are_numbered_contiguously() {
        let tmp = TempDir::new().unwrap();
        let (engine, project_id) = engine_with_project(&tmp).await;

        let base = df(&["x"], &[&["1"]]);
        engine.commit_initial(&project_id, &base).await.unwrap();
        for i in 2..=4u32 {
            let next = df(&["x"], &[&[i.to_string().as_str()]]);
            let v = engine
                .commit_new(&project_id, &next, None, None)
                .await
                .unwrap();
            assert_eq!(v.version_number, i);
        }

        let numbers: Vec<u32> = engine
            .list_versions(&project_id)
            .await
            .unwrap()
            .iter()
            .map(|v| v.version_number)
            .collect();
        assert_eq!(numbers, vec![1, 2, 3, 4]);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn concurrent_commits_keep_numbers_contiguous() {
        let tmp = TempDir::new().unwrap();
        let (engine, project_id) = engine_with_project(&tmp).await;
        let engine = Arc::new(engine);
        engine
            .commit_initial(&project_id, &df(&["x"], &[&["0"]]))
            .await
            .unwrap();

        let mut handles = Vec::new();
        for i in 1..=8u32 {
            let engine = engine.clone();
            let project_id = project_id.clone();
            handles.push(tokio::spawn(async move {
                let cell = i.to_string();
                let next = df(&["x"], &[&[cell.as_str()]]);
                engine.commit_new(&project_id, &next, None, None).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let versions = engine.list_versions(&project_id).await.unwrap();
        let numbers: Vec<u32> = versions.iter().map(|v| v.version_number).collect();
        assert_eq!(numbers, (1..=9).collect::<Vec<u32>>());

        // Every snapshot stays loadable; none was overwritten by a rival commit
        for version in &versions {
            let snapshot = engine
                .load_version(&project_id, version.version_number)
                .await
                .unwrap();
            assert_eq!(snapshot.shape(), (1, 1));
        }
    }

    #[tokio::test]
    async fn second_initial_commit_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let (engine, project_id) = engine_with_project(&tmp).await;
        let base = df(&["x"], &[&["1"]]);

        engine.commit_initial(&project_id, &base).await.unwrap();
        assert!(engine.commit_initial(&project_id, &base).await.is_err());
    }

    #[tokio::test]
    async fn auto_description_comes_from_the_diff() {
        let tmp = TempDir::new().unwrap();
        let (engine, project_id) = engine_with_project(&tmp).await;

        engine
            .commit_initial(&project_id, &df(&["x"], &[&["1"]]))
            .await
            .unwrap();
        let v2 = engine
            .commit_new(
                &project_id,
                &df(&["x"], &[&["1"], &["2"]]),
                None,
                None,
            )
            .await
            .unwrap();
        assert_eq!(v2.change_description, "Added 1 rows");

        let v3 = engine
            .commit_new(
                &project_id,
                &df(&["x"], &[&["1"], &["2"]]),
                Some("manual note".to_string()),
                None,
            )
            .await
            .unwrap();
        assert_eq!(v3.change_description, "manual note");
    }

    #[tokio::test]
    async fn revert_appends_a_new_version_with_old_content() {
        let tmp = TempDir::new().unwrap();
        let (engine, project_id) = engine_with_project(&tmp).await;
        let original = df(&["x"], &[&["1"]]);

        engine.commit_initial(&project_id, &original).await.unwrap();
        engine
            .commit_new(&project_id, &df(&["x"], &[&["9"]]), None, None)
            .await
            .unwrap();

        let reverted = engine.revert(&project_id, 1, None).await.unwrap();
        assert_eq!(reverted.version_number, 3);
        assert_eq!(reverted.change_description, "Reverted to v1");
        assert_eq!(engine.current(&project_id).await.unwrap(), original);
        assert_eq!(engine.list_versions(&project_id).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn revert_to_unknown_version_fails() {
        let tmp = TempDir::new().unwrap();
        let (engine, project_id) = engine_with_project(&tmp).await;
        engine
            .commit_initial(&project_id, &df(&["x"], &[&["1"]]))
            .await
            .unwrap();

        let err = engine.revert(&project_id, 7, None).await.unwrap_err();
        assert!(matches!(err, TabulaError::VersionNotFound { version: 7, .. }));
    }

    #[tokio::test]
    async fn stats_cover_the_whole_history() {
        let tmp = TempDir::new().unwrap();
        let (engine, project_id) = engine_with_project(&tmp).await;
        engine
            .commit_initial(&project_id, &df(&["x"], &[&["1"]]))
            .await
            .unwrap();
        engine
            .commit_new(&project_id, &df(&["x"], &[&["2"]]), None, None)
            .await
            .unwrap();

        let stats = engine.version_stats(&project_id).await.unwrap();
        assert_eq!(stats.version_count, 2);
        assert_eq!(stats.earliest_version, Some(1));
        assert_eq!(stats.latest_version, Some(2));
        assert!(stats.total_size_bytes > 0);
    }

    #[tokio::test]
    async fn listing_versions_of_unknown_project_fails() {
        let tmp = TempDir::new().unwrap();
        let (engine, _) = engine_with_project(&tmp).await;
        let err = engine.list_versions("missing").await.unwrap_err();
        assert!(matches!(err, TabulaError::ProjectNotFound { .. }));
    }
}
