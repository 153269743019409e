//! Project repository trait.

use super::model::Project;
use crate::error::Result;
use async_trait::async_trait;

/// An abstract repository for project metadata persistence.
///
/// Decouples the application's core logic from the storage mechanism
/// (JSON files on disk in the shipped implementation).
#[async_trait]
pub trait ProjectRepository: Send + Sync {
    /// Finds a project by ID. `Ok(None)` when it does not exist.
    async fn find_by_id(&self, project_id: &str) -> Result<Option<Project>>;

    /// Saves project metadata, creating the project's directory layout on
    /// first save.
    async fn save(&self, project: &Project) -> Result<()>;

    /// Lists all projects, most recently updated first.
    async fn list_all(&self) -> Result<Vec<Project>>;

    /// Deletes a project and everything it owns (versions, chats, snapshots).
    /// Deleting a missing project is a no-op.
    async fn delete(&self, project_id: &str) -> Result<()>;

    /// True when the project exists.
    async fn exists(&self, project_id: &str) -> Result<bool> {
        Ok(self.find_by_id(project_id).await?.is_some())
    }
}
