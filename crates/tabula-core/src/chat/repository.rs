//! Chat repository trait.
//!
//! A chat and its message history persist together as one record; messages
//! are append-only and only ever cleared in bulk.

use super::model::{Chat, Message};
use crate::error::Result;
use async_trait::async_trait;

/// An abstract repository for chats and their message histories.
#[async_trait]
pub trait ChatRepository: Send + Sync {
    /// Finds a chat and its messages. `Ok(None)` when it does not exist.
    async fn find(&self, project_id: &str, chat_id: &str) -> Result<Option<(Chat, Vec<Message>)>>;

    /// Saves a chat together with its full message history.
    async fn save(&self, chat: &Chat, messages: &[Message]) -> Result<()>;

    /// Lists all chats of a project (metadata only), most recently updated
    /// first.
    async fn list(&self, project_id: &str) -> Result<Vec<Chat>>;

    /// Deletes a chat and all its messages. Deleting a missing chat is a
    /// no-op.
    async fn delete(&self, project_id: &str, chat_id: &str) -> Result<()>;

    /// True when the chat exists.
    async fn exists(&self, project_id: &str, chat_id: &str) -> Result<bool> {
        Ok(self.find(project_id, chat_id).await?.is_some())
    }
}
