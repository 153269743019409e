//! Application layer for Tabula.
//!
//! Wires the storage layer, the code oracle, and the execution sandbox into
//! the services a frontend calls: project lifecycle, chat management, the
//! version engine, and the query orchestrator.

pub mod chat_service;
pub mod orchestrator;
pub mod project_service;
pub mod version_engine;

pub use chat_service::ChatService;
pub use orchestrator::{QueryOrchestrator, QueryOutcome};
pub use project_service::ProjectService;
pub use version_engine::VersionEngine;

use std::sync::Arc;

use tabula_core::{CodeOracle, Result, SnippetRunner};
use tabula_infrastructure::{
    ArtifactStore, DataPaths, JsonChatRepository, JsonProjectRepository, JsonVersionStore,
};

/// Fully wired application services over one data directory.
pub struct AppContext {
    pub projects: Arc<ProjectService>,
    pub chats: Arc<ChatService>,
    pub versions: Arc<VersionEngine>,
    pub orchestrator: Arc<QueryOrchestrator>,
}

impl AppContext {
    /// Builds the service graph over `paths`, with the given oracle and
    /// sandbox implementations. Creates the on-disk layout if missing.
    pub fn new(
        paths: DataPaths,
        oracle: Arc<dyn CodeOracle>,
        runner: Arc<dyn SnippetRunner>,
        preview_rows: usize,
    ) -> Result<Self> {
        paths.ensure_layout()?;

        let project_repo = Arc::new(JsonProjectRepository::new(paths.clone()));
        let chat_repo = Arc::new(JsonChatRepository::new(paths.clone()));
        let version_store = Arc::new(JsonVersionStore::new(paths.clone()));

        let versions = Arc::new(VersionEngine::new(
            version_store,
            project_repo.clone(),
        ));
        let chats = Arc::new(ChatService::new(chat_repo.clone(), project_repo.clone()));
        let projects = Arc::new(ProjectService::new(
            project_repo.clone(),
            chat_repo,
            versions.clone(),
        ));
        let orchestrator = Arc::new(QueryOrchestrator::new(
            project_repo,
            chats.clone(),
            versions.clone(),
            oracle,
            runner,
            ArtifactStore::new(paths),
            preview_rows,
        ));

        Ok(Self {
            projects,
            chats,
            versions,
            orchestrator,
        })
    }
}
