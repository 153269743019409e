//! JSON-file-backed ProjectRepository implementation.
//!
//! Project metadata lives at `projects/{id}/metadata.json`. Metadata is
//! required state, so reads of an existing-but-corrupt record propagate as
//! `StorageCorruption` (strict mode); listing skips unreadable projects with
//! a warning instead of failing the whole listing.

use crate::paths::DataPaths;
use crate::storage::AtomicJsonFile;
use async_trait::async_trait;
use tabula_core::{Project, ProjectRepository, Result, TabulaError};
use tokio::task;

pub struct JsonProjectRepository {
    paths: DataPaths,
}

impl JsonProjectRepository {
    pub fn new(paths: DataPaths) -> Self {
        Self { paths }
    }

    fn metadata_file(paths: &DataPaths, project_id: &str) -> AtomicJsonFile<Project> {
        AtomicJsonFile::new(paths.metadata_path(project_id))
    }

    fn find_sync(paths: &DataPaths, project_id: &str) -> Result<Option<Project>> {
        let file = Self::metadata_file(paths, project_id);
        if !file.path().exists() {
            return Ok(None);
        }
        file.load_strict().map(Some)
    }

    fn list_sync(paths: &DataPaths) -> Result<Vec<Project>> {
        let projects_dir = paths.projects_dir();
        if !projects_dir.exists() {
            return Ok(Vec::new());
        }

        let mut projects = Vec::new();
        for entry in std::fs::read_dir(&projects_dir)? {
            let entry = entry?;
            if !entry.path().is_dir() {
                continue;
            }
            let project_id = entry.file_name().to_string_lossy().to_string();
            match Self::find_sync(paths, &project_id) {
                Ok(Some(project)) => projects.push(project),
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(project_id = %project_id, error = %e, "skipping unreadable project");
                }
            }
        }

        projects.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(projects)
    }
}

#[async_trait]
impl ProjectRepository for JsonProjectRepository {
    async fn find_by_id(&self, project_id: &str) -> Result<Option<Project>> {
        let paths = self.paths.clone();
        let project_id = project_id.to_string();
        task::spawn_blocking(move || Self::find_sync(&paths, &project_id))
            .await
            .map_err(|e| TabulaError::internal(format!("task join error: {}", e)))?
    }

    async fn save(&self, project: &Project) -> Result<()> {
        let paths = self.paths.clone();
        let project = project.clone();
        task::spawn_blocking(move || {
            paths.ensure_project_layout(&project.id)?;
            Self::metadata_file(&paths, &project.id).save(&project)
        })
        .await
        .map_err(|e| TabulaError::internal(format!("task join error: {}", e)))?
    }

    async fn list_all(&self) -> Result<Vec<Project>> {
        let paths = self.paths.clone();
        task::spawn_blocking(move || Self::list_sync(&paths))
            .await
            .map_err(|e| TabulaError::internal(format!("task join error: {}", e)))?
    }

    async fn delete(&self, project_id: &str) -> Result<()> {
        let paths = self.paths.clone();
        let project_id = project_id.to_string();
        task::spawn_blocking(move || {
            tracing::info!(project_id = %project_id, "deleting project directory");
            paths.delete_project_dir(&project_id)
        })
        .await
        .map_err(|e| TabulaError::internal(format!("task join error: {}", e)))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn repo() -> (TempDir, JsonProjectRepository) {
        let tmp = TempDir::new().unwrap();
        let paths = DataPaths::new(tmp.path());
        paths.ensure_layout().unwrap();
        (tmp, JsonProjectRepository::new(paths))
    }

    #[tokio::test]
    async fn save_and_find() {
        let (_tmp, repo) = repo();
        let project = Project::create_new("sales", "sales.csv", 3, 2);

        repo.save(&project).await.unwrap();
        let found = repo.find_by_id(&project.id).await.unwrap().unwrap();
        assert_eq!(found, project);
        assert!(repo.exists(&project.id).await.unwrap());
    }

    #[tokio::test]
    async fn find_missing_is_none() {
        let (_tmp, repo) = repo();
        assert!(repo.find_by_id("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn corrupt_metadata_is_storage_corruption() {
        let (tmp, repo) = repo();
        let dir = tmp.path().join("projects/p1");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("metadata.json"), "{bad").unwrap();

        let result = repo.find_by_id("p1").await;
        assert!(matches!(
            result,
            Err(TabulaError::StorageCorruption { .. })
        ));
    }

    #[tokio::test]
    async fn list_orders_by_updated_at_desc() {
        let (_tmp, repo) = repo();
        let older = Project::create_new("a", "a.csv", 1, 1);
        repo.save(&older).await.unwrap();

        let mut newer = Project::create_new("b", "b.csv", 1, 1);
        newer.updated_at = older.updated_at + chrono::Duration::seconds(10);
        repo.save(&newer).await.unwrap();

        let listed = repo.list_all().await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, newer.id);
    }

    #[tokio::test]
    async fn delete_cascades_the_directory() {
        let (tmp, repo) = repo();
        let project = Project::create_new("a", "a.csv", 1, 1);
        repo.save(&project).await.unwrap();
        assert!(tmp.path().join("projects").join(&project.id).exists());

        repo.delete(&project.id).await.unwrap();
        assert!(!tmp.path().join("projects").join(&project.id).exists());
        assert!(!repo.exists(&project.id).await.unwrap());
    }
}
