//! Chat lifecycle and message bookkeeping.

use std::sync::Arc;

use serde_json::Value;
use tabula_core::{
    Chat, ChatRepository, Message, Project, ProjectRepository, Result, TabulaError,
};

pub struct ChatService {
    chats: Arc<dyn ChatRepository>,
    projects: Arc<dyn ProjectRepository>,
}

impl ChatService {
    pub fn new(chats: Arc<dyn ChatRepository>, projects: Arc<dyn ProjectRepository>) -> Self {
        Self { chats, projects }
    }

    /// Opens a new chat on a project and marks it active.
    ///
    /// Without an explicit name the chat is auto-named `Chat {n}` from the
    /// number of chats the project already has.
    pub async fn create_chat(&self, project_id: &str, name: Option<&str>) -> Result<Chat> {
        let mut project = self.require_project(project_id).await?;

        let name = match name {
            Some(n) => n.to_string(),
            None => format!("Chat {}", project.chat_ids.len() + 1),
        };
        let chat = Chat::create_new(project_id, name);
        self.chats.save(&chat, &[]).await?;

        project.chat_ids.push(chat.id.clone());
        project.active_chat_id = Some(chat.id.clone());
        self.projects.save(&project).await?;

        tracing::info!(project_id, chat_id = %chat.id, name = %chat.name, "created chat");
        Ok(chat)
    }

    pub async fn get_chat(&self, project_id: &str, chat_id: &str) -> Result<(Chat, Vec<Message>)> {
        self.chats
            .find(project_id, chat_id)
            .await?
            .ok_or_else(|| TabulaError::chat_not_found(chat_id))
    }

    /// All chats of a project, most recently updated first.
    pub async fn list_chats(&self, project_id: &str) -> Result<Vec<Chat>> {
        self.require_project(project_id).await?;
        self.chats.list(project_id).await
    }

    pub async fn rename_chat(
        &self,
        project_id: &str,
        chat_id: &str,
        new_name: &str,
    ) -> Result<Chat> {
        let (mut chat, messages) = self.get_chat(project_id, chat_id).await?;
        chat.name = new_name.to_string();
        chat.updated_at = chrono::Utc::now();
        self.chats.save(&chat, &messages).await?;
        Ok(chat)
    }

    /// Deletes a chat and detaches it from the project metadata.
    pub async fn delete_chat(&self, project_id: &str, chat_id: &str) -> Result<()> {
        if !self.chats.exists(project_id, chat_id).await? {
            return Err(TabulaError::chat_not_found(chat_id));
        }
        self.chats.delete(project_id, chat_id).await?;

        let mut project = self.require_project(project_id).await?;
        project.chat_ids.retain(|id| id != chat_id);
        if project.active_chat_id.as_deref() == Some(chat_id) {
            project.active_chat_id = project.chat_ids.last().cloned();
        }
        self.projects.save(&project).await?;

        tracing::info!(project_id, chat_id, "deleted chat");
        Ok(())
    }

    pub async fn list_messages(&self, project_id: &str, chat_id: &str) -> Result<Vec<Message>> {
        let (_, messages) = self.get_chat(project_id, chat_id).await?;
        Ok(messages)
    }

    /// Wipes the message history and oracle context, keeping the chat itself.
    pub async fn clear_messages(&self, project_id: &str, chat_id: &str) -> Result<Chat> {
        let (mut chat, _) = self.get_chat(project_id, chat_id).await?;
        chat.reset_conversation();
        self.chats.save(&chat, &[]).await?;
        Ok(chat)
    }

    /// Appends one turn and returns it as persisted.
    pub async fn append_message(
        &self,
        project_id: &str,
        chat_id: &str,
        message: Message,
    ) -> Result<Message> {
        let (mut chat, mut messages) = self.get_chat(project_id, chat_id).await?;
        messages.push(message.clone());
        chat.message_count = messages.len();
        chat.updated_at = chrono::Utc::now();
        self.chats.save(&chat, &messages).await?;
        Ok(message)
    }

    /// The opaque oracle context blob of a chat.
    pub async fn oracle_context(&self, project_id: &str, chat_id: &str) -> Result<Value> {
        let (chat, _) = self.get_chat(project_id, chat_id).await?;
        Ok(chat.oracle_context)
    }

    pub async fn set_oracle_context(
        &self,
        project_id: &str,
        chat_id: &str,
        context: Value,
    ) -> Result<()> {
        let (mut chat, messages) = self.get_chat(project_id, chat_id).await?;
        chat.oracle_context = context;
        self.chats.save(&chat, &messages).await
    }

    async fn require_project(&self, project_id: &str) -> Result<Project> {
        self.projects
            .find_by_id(project_id)
            .await?
            .ok_or_else(|| TabulaError::project_not_found(project_id))
    }
}
