//! Project lifecycle: upload, listing, deletion, dataset context.

use std::sync::Arc;

use tabula_core::{
    dataset_profile, project::sanitize_name, Chat, ChatRepository, DataFrame, Project,
    ProjectRepository, Result, TabulaError,
};

use crate::version_engine::VersionEngine;

pub struct ProjectService {
    projects: Arc<dyn ProjectRepository>,
    chats: Arc<dyn ChatRepository>,
    engine: Arc<VersionEngine>,
}

impl ProjectService {
    pub fn new(
        projects: Arc<dyn ProjectRepository>,
        chats: Arc<dyn ChatRepository>,
        engine: Arc<VersionEngine>,
    ) -> Self {
        Self {
            projects,
            chats,
            engine,
        }
    }

    /// Creates a project from uploaded CSV bytes.
    ///
    /// Parses and validates the CSV, commits it as version 1, and opens a
    /// default chat so the project is immediately usable.
    pub async fn create_project(
        &self,
        csv_bytes: &[u8],
        original_filename: &str,
        name: Option<&str>,
    ) -> Result<Project> {
        let table = DataFrame::from_csv_bytes(csv_bytes)
            .map_err(|e| TabulaError::Validation(format!("invalid CSV upload: {}", e)))?;
        if table.is_empty() {
            return Err(TabulaError::Validation(
                "uploaded CSV has no data rows".to_string(),
            ));
        }

        let display_name = match name {
            Some(n) => sanitize_name(n),
            None => sanitize_name(filename_stem(original_filename)),
        };

        let project = Project::create_new(
            &display_name,
            original_filename,
            table.row_count(),
            table.column_count(),
        );
        let project_id = project.id.clone();
        self.projects.save(&project).await?;

        self.engine.commit_initial(&project_id, &table).await?;

        let chat = Chat::create_new(&project_id, "Chat 1");
        self.chats.save(&chat, &[]).await?;

        // commit_initial rewrote the metadata, reload before attaching the chat
        let mut project = self.get_project(&project_id).await?;
        project.active_chat_id = Some(chat.id.clone());
        project.chat_ids.push(chat.id);
        self.projects.save(&project).await?;

        tracing::info!(
            project_id = %project.id,
            name = %project.name,
            rows = project.total_rows,
            columns = project.total_columns,
            "created project"
        );
        Ok(project)
    }

    pub async fn get_project(&self, project_id: &str) -> Result<Project> {
        self.projects
            .find_by_id(project_id)
            .await?
            .ok_or_else(|| TabulaError::project_not_found(project_id))
    }

    /// All projects, most recently updated first.
    pub async fn list_projects(&self) -> Result<Vec<Project>> {
        self.projects.list_all().await
    }

    /// Deletes a project and everything under it (versions, chats, metadata).
    pub async fn delete_project(&self, project_id: &str) -> Result<()> {
        if !self.projects.exists(project_id).await? {
            return Err(TabulaError::project_not_found(project_id));
        }
        self.projects.delete(project_id).await?;
        tracing::info!(project_id, "deleted project");
        Ok(())
    }

    /// Textual profile of the current dataset, as handed to the oracle.
    pub async fn dataset_context(&self, project_id: &str) -> Result<String> {
        let project = self.get_project(project_id).await?;
        let table = self.engine.current(project_id).await?;
        Ok(dataset_profile(&table, &project.name))
    }
}

fn filename_stem(filename: &str) -> &str {
    let name = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(filename);
    match name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stem_drops_extension_and_directories() {
        assert_eq!(filename_stem("sales_2026.csv"), "sales_2026");
        assert_eq!(filename_stem("dir/sub/data.csv"), "data");
        assert_eq!(filename_stem("noext"), "noext");
        assert_eq!(filename_stem(".hidden"), ".hidden");
    }
}
