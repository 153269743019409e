//! JSON-file-backed ChatRepository implementation.
//!
//! One record per chat at `projects/{pid}/chats/{cid}.json`, holding the chat
//! metadata, the full message history, and the opaque oracle context. Chat
//! reads are non-strict: an unreadable record degrades to "not found" with a
//! warning rather than failing the caller.

use crate::paths::DataPaths;
use crate::storage::AtomicJsonFile;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tabula_core::{Chat, ChatRepository, Message, Result, TabulaError};
use tokio::task;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChatRecord {
    chat: Chat,
    #[serde(default)]
    messages: Vec<Message>,
}

pub struct JsonChatRepository {
    paths: DataPaths,
}

impl JsonChatRepository {
    pub fn new(paths: DataPaths) -> Self {
        Self { paths }
    }

    fn record_file(paths: &DataPaths, project_id: &str, chat_id: &str) -> AtomicJsonFile<ChatRecord> {
        AtomicJsonFile::new(paths.chat_path(project_id, chat_id))
    }

    fn find_sync(
        paths: &DataPaths,
        project_id: &str,
        chat_id: &str,
    ) -> Result<Option<(Chat, Vec<Message>)>> {
        let file = Self::record_file(paths, project_id, chat_id);
        match file.load() {
            Ok(Some(record)) => Ok(Some((record.chat, record.messages))),
            Ok(None) => Ok(None),
            Err(e) => {
                tracing::warn!(
                    project_id = %project_id,
                    chat_id = %chat_id,
                    error = %e,
                    "unreadable chat record, treating as missing"
                );
                Ok(None)
            }
        }
    }

    fn list_sync(paths: &DataPaths, project_id: &str) -> Result<Vec<Chat>> {
        let chats_dir = paths.chats_dir(project_id);
        if !chats_dir.exists() {
            return Ok(Vec::new());
        }

        let mut chats = Vec::new();
        for entry in std::fs::read_dir(&chats_dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(chat_id) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if let Some((chat, _)) = Self::find_sync(paths, project_id, chat_id)? {
                chats.push(chat);
            }
        }

        chats.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(chats)
    }
}

#[async_trait]
impl ChatRepository for JsonChatRepository {
    async fn find(&self, project_id: &str, chat_id: &str) -> Result<Option<(Chat, Vec<Message>)>> {
        let paths = self.paths.clone();
        let project_id = project_id.to_string();
        let chat_id = chat_id.to_string();
        task::spawn_blocking(move || Self::find_sync(&paths, &project_id, &chat_id))
            .await
            .map_err(|e| TabulaError::internal(format!("task join error: {}", e)))?
    }

    async fn save(&self, chat: &Chat, messages: &[Message]) -> Result<()> {
        let paths = self.paths.clone();
        let record = ChatRecord {
            chat: chat.clone(),
            messages: messages.to_vec(),
        };
        task::spawn_blocking(move || {
            std::fs::create_dir_all(paths.chats_dir(&record.chat.project_id))?;
            Self::record_file(&paths, &record.chat.project_id, &record.chat.id).save(&record)
        })
        .await
        .map_err(|e| TabulaError::internal(format!("task join error: {}", e)))?
    }

    async fn list(&self, project_id: &str) -> Result<Vec<Chat>> {
        let paths = self.paths.clone();
        let project_id = project_id.to_string();
        task::spawn_blocking(move || Self::list_sync(&paths, &project_id))
            .await
            .map_err(|e| TabulaError::internal(format!("task join error: {}", e)))?
    }

    async fn delete(&self, project_id: &str, chat_id: &str) -> Result<()> {
        let paths = self.paths.clone();
        let project_id = project_id.to_string();
        let chat_id = chat_id.to_string();
        task::spawn_blocking(move || {
            let path = paths.chat_path(&project_id, &chat_id);
            if path.exists() {
                std::fs::remove_file(path)?;
            }
            Ok(())
        })
        .await
        .map_err(|e| TabulaError::internal(format!("task join error: {}", e)))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn repo() -> (TempDir, JsonChatRepository) {
        let tmp = TempDir::new().unwrap();
        let paths = DataPaths::new(tmp.path());
        paths.ensure_layout().unwrap();
        (tmp, JsonChatRepository::new(paths))
    }

    #[tokio::test]
    async fn save_and_find_with_messages() {
        let (_tmp, repo) = repo();
        let chat = Chat::create_new("p1", "Chat 1");
        let messages = vec![
            Message::user(&chat.id, "hello"),
            Message::assistant(&chat.id, "hi"),
        ];

        repo.save(&chat, &messages).await.unwrap();
        let (found, found_messages) = repo.find("p1", &chat.id).await.unwrap().unwrap();
        assert_eq!(found, chat);
        assert_eq!(found_messages, messages);
    }

    #[tokio::test]
    async fn missing_and_corrupt_records_are_none() {
        let (tmp, repo) = repo();
        assert!(repo.find("p1", "nope").await.unwrap().is_none());

        let dir = tmp.path().join("projects/p1/chats");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("bad.json"), "{nope").unwrap();
        assert!(repo.find("p1", "bad").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn list_orders_by_updated_at_desc() {
        let (_tmp, repo) = repo();
        let older = Chat::create_new("p1", "Chat 1");
        repo.save(&older, &[]).await.unwrap();

        let mut newer = Chat::create_new("p1", "Chat 2");
        newer.updated_at = older.updated_at + chrono::Duration::seconds(5);
        repo.save(&newer, &[]).await.unwrap();

        let chats = repo.list("p1").await.unwrap();
        assert_eq!(chats.len(), 2);
        assert_eq!(chats[0].id, newer.id);
    }

    #[tokio::test]
    async fn delete_removes_record() {
        let (_tmp, repo) = repo();
        let chat = Chat::create_new("p1", "Chat 1");
        repo.save(&chat, &[]).await.unwrap();

        repo.delete("p1", &chat.id).await.unwrap();
        assert!(!repo.exists("p1", &chat.id).await.unwrap());
        // Deleting again is a no-op
        repo.delete("p1", &chat.id).await.unwrap();
    }
}
